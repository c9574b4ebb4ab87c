use anyhow::Result;
use async_trait::async_trait;

use super::{Command, CommandResult};
use crate::browser::Browser;

pub struct BackCommand;

#[async_trait]
impl Command for BackCommand {
    fn name(&self) -> &str {
        "back"
    }

    fn aliases(&self) -> &[&str] {
        &["b"]
    }

    fn description(&self) -> &str {
        "go back one page in history"
    }

    async fn execute(&self, _args: &str, browser: &mut Browser) -> Result<CommandResult> {
        if browser.router_mut().back().await?.is_none() {
            println!("  no earlier page");
        }
        Ok(CommandResult::Handled)
    }
}

pub struct ForwardCommand;

#[async_trait]
impl Command for ForwardCommand {
    fn name(&self) -> &str {
        "forward"
    }

    fn aliases(&self) -> &[&str] {
        &["f"]
    }

    fn description(&self) -> &str {
        "go forward one page in history"
    }

    async fn execute(&self, _args: &str, browser: &mut Browser) -> Result<CommandResult> {
        if browser.router_mut().forward().await?.is_none() {
            println!("  no later page");
        }
        Ok(CommandResult::Handled)
    }
}
