use anyhow::{Result, bail};
use async_trait::async_trait;

use super::{Command, CommandResult};
use crate::browser::Browser;
use crate::router::{ClickOutcome, Navigation};

pub struct OpenCommand;

#[async_trait]
impl Command for OpenCommand {
    fn name(&self) -> &str {
        "open"
    }

    fn aliases(&self) -> &[&str] {
        &["go"]
    }

    fn usage(&self) -> &str {
        "<url>"
    }

    fn description(&self) -> &str {
        "navigate to a URL or path"
    }

    async fn execute(&self, args: &str, browser: &mut Browser) -> Result<CommandResult> {
        if args.is_empty() {
            bail!("usage: open <url>");
        }
        if browser.router_mut().navigate(args).await? == Navigation::CrossOrigin {
            println!("  {args} is on another origin, not opened");
        }
        Ok(CommandResult::Handled)
    }
}

pub struct ClickCommand;

#[async_trait]
impl Command for ClickCommand {
    fn name(&self) -> &str {
        "click"
    }

    fn usage(&self) -> &str {
        "<href>"
    }

    fn description(&self) -> &str {
        "follow a link as if clicked on the page"
    }

    async fn execute(&self, args: &str, browser: &mut Browser) -> Result<CommandResult> {
        if args.is_empty() {
            bail!("usage: click <href>");
        }
        match browser.router_mut().click(args).await? {
            ClickOutcome::Default if args.starts_with('#') => {
                println!("  jumped to anchor {args}");
            }
            ClickOutcome::Default => {
                println!("  external link {args}, left to the browser");
            }
            ClickOutcome::Routed(_) => {}
        }
        Ok(CommandResult::Handled)
    }
}

pub struct ReloadCommand;

#[async_trait]
impl Command for ReloadCommand {
    fn name(&self) -> &str {
        "reload"
    }

    fn aliases(&self) -> &[&str] {
        &["r"]
    }

    fn description(&self) -> &str {
        "render the current page again"
    }

    async fn execute(&self, _args: &str, browser: &mut Browser) -> Result<CommandResult> {
        browser.router_mut().reload().await;
        Ok(CommandResult::Handled)
    }
}
