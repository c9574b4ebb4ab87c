use anyhow::{Result, bail};
use async_trait::async_trait;

use super::{Command, CommandResult};
use crate::browser::Browser;
use crate::pages::FilterSelection;

pub struct FilterCommand;

/// Apply `cuisine=..` / `neighborhood=..` pairs on top of `current`.
/// `reset` goes back to showing everything.
fn parse_filter(args: &str, current: &FilterSelection) -> Result<FilterSelection> {
    let mut filter = current.clone();
    for part in args.split_whitespace() {
        if part == "reset" {
            filter = FilterSelection::default();
            continue;
        }
        match part.split_once('=') {
            Some(("cuisine", value)) if !value.is_empty() => filter.cuisine = value.to_string(),
            Some(("neighborhood", value)) if !value.is_empty() => {
                filter.neighborhood = value.to_string()
            }
            _ => bail!("expected cuisine=<name>, neighborhood=<name> or reset, got {part:?}"),
        }
    }
    Ok(filter)
}

#[async_trait]
impl Command for FilterCommand {
    fn name(&self) -> &str {
        "filter"
    }

    fn usage(&self) -> &str {
        "[cuisine=..] [neighborhood=..] | reset"
    }

    fn description(&self) -> &str {
        "filter the restaurant list"
    }

    async fn execute(&self, args: &str, browser: &mut Browser) -> Result<CommandResult> {
        let current = browser.router().view().filter().clone();
        if args.is_empty() {
            println!(
                "  cuisine={} neighborhood={}",
                current.cuisine, current.neighborhood
            );
            return Ok(CommandResult::Handled);
        }

        let filter = parse_filter(args, &current)?;
        if !browser.set_filter(filter).await {
            println!("  filter saved; it applies on the index page");
        }
        Ok(CommandResult::Handled)
    }
}
