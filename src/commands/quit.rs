use anyhow::Result;
use async_trait::async_trait;

use super::{Command, CommandResult};
use crate::browser::Browser;

pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }

    fn aliases(&self) -> &[&str] {
        &["exit", "q"]
    }

    fn description(&self) -> &str {
        "end the session"
    }

    async fn execute(&self, _args: &str, _browser: &mut Browser) -> Result<CommandResult> {
        Ok(CommandResult::Quit)
    }
}
