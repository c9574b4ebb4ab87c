use anyhow::Result;
use async_trait::async_trait;

use super::{Command, CommandResult};
use crate::browser::Browser;
use crate::consts::format_bytes;
use crate::worker::Cache;

pub struct CacheCommand;

#[async_trait]
impl Command for CacheCommand {
    fn name(&self) -> &str {
        "cache"
    }

    fn description(&self) -> &str {
        "show the offline worker and cached entries"
    }

    async fn execute(&self, _args: &str, browser: &mut Browser) -> Result<CommandResult> {
        let workers = browser.workers();
        let worker = match (workers.controller(), workers.scope()) {
            (Some(worker), Some(scope)) => format!(
                "{:?}, scope {scope}, {} manifest entries",
                worker.state(),
                worker.manifest().len()
            ),
            _ => "not registered".to_string(),
        };
        let cache = browser.cache();
        let keys = cache.keys().await?;

        println!("  worker  {worker}");
        println!(
            "  cache   {} ({} entries, {})",
            browser.cache_name(),
            keys.len(),
            format_bytes(cache.size()?)
        );
        for key in keys {
            println!("    {key}");
        }
        Ok(CommandResult::Handled)
    }
}
