use anyhow::Result;
use async_trait::async_trait;

use super::{Command, CommandResult};
use crate::browser::Browser;

pub struct WhereCommand;

#[async_trait]
impl Command for WhereCommand {
    fn name(&self) -> &str {
        "where"
    }

    fn aliases(&self) -> &[&str] {
        &["location"]
    }

    fn description(&self) -> &str {
        "show location, page state and history"
    }

    async fn execute(&self, _args: &str, browser: &mut Browser) -> Result<CommandResult> {
        let router = browser.router();
        let state = router
            .state()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "(no route)".to_string());

        println!("  location  {}", router.location());
        println!("  page      {state}");
        println!("  history");
        let history = router.history();
        for (i, entry) in history.entries().iter().enumerate() {
            let cursor = if i == history.index() { "→" } else { " " };
            println!("    {cursor} {entry}");
        }
        Ok(CommandResult::Handled)
    }
}
