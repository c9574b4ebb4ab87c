//! Commands for the interactive browsing session.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry splits the input line into a command
//! word and its arguments, resolves aliases, and generates the help text.

mod cache;
mod filter;
mod location;
mod navigate;
mod quit;
mod traverse;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::browser::Browser;

/// What the REPL should do after a command runs.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Command handled, continue the REPL loop.
    Handled,
    /// Exit the REPL.
    Quit,
}

/// A session command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"open"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["go"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis shown in help, e.g. `"<url>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Run the command with everything after the command word.
    async fn execute(&self, args: &str, browser: &mut Browser) -> Result<CommandResult>;
}

const HELP_NAME: &str = "help";
const HELP_ALIASES: &[&str] = &["h", "?"];

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(navigate::OpenCommand),
            Arc::new(navigate::ClickCommand),
            Arc::new(traverse::BackCommand),
            Arc::new(traverse::ForwardCommand),
            Arc::new(navigate::ReloadCommand),
            Arc::new(filter::FilterCommand),
            Arc::new(location::WhereCommand),
            Arc::new(cache::CacheCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    fn find(&self, word: &str) -> Option<&Arc<dyn Command>> {
        self.commands
            .iter()
            .find(|c| word == c.name() || c.aliases().contains(&word))
    }

    /// Run the command named by the first word of `input`.
    pub async fn dispatch(&self, input: &str, browser: &mut Browser) -> Result<CommandResult> {
        let input = input.trim();
        let (word, args) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        if word == HELP_NAME || HELP_ALIASES.contains(&word) {
            print!("{}", self.help_text());
            return Ok(CommandResult::Handled);
        }

        match self.find(word) {
            Some(command) => command.execute(args, browser).await,
            None => {
                println!("unknown command: {word}");
                println!("type help for available commands");
                Ok(CommandResult::Handled)
            }
        }
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let mut entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| {
                (
                    format_label(c.name(), c.usage(), c.aliases()),
                    c.description(),
                )
            })
            .collect();
        entries.push((
            format_label(HELP_NAME, "", HELP_ALIASES),
            "show this help",
        ));

        let max_width = entries
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases, help included.
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = vec![HELP_NAME];
        triggers.extend_from_slice(HELP_ALIASES);
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::browser::BrowserConfig;
    use crate::worker::mock::MockFetcher;
    use crate::worker::sqlite::SqliteCacheStorage;
    use url::Url;

    pub(crate) const ORIGIN: &str = "http://localhost:8000";

    pub(crate) const DATA: &str = r#"{"restaurants": [
        {"id": 1, "name": "Mission Chinese Food", "neighborhood": "Manhattan",
         "photograph": "1.jpg", "address": "171 E Broadway",
         "latlng": {"lat": 40.713829, "lng": -73.989667}, "cuisine_type": "Asian"},
        {"id": 2, "name": "Emily", "neighborhood": "Brooklyn",
         "photograph": "2.jpg", "address": "919 Fulton St",
         "latlng": {"lat": 40.683555, "lng": -73.966393}, "cuisine_type": "Pizza"}
    ]}"#;

    pub(crate) fn test_browser() -> Browser {
        let network = MockFetcher::new().with(
            &format!("{ORIGIN}/data/restaurants.json"),
            "application/json",
            DATA,
        );
        Browser::new(
            BrowserConfig {
                origin: Url::parse(ORIGIN).unwrap(),
                cache_name: "test".to_string(),
                start: "/".to_string(),
                worker: false,
                echo: false,
            },
            SqliteCacheStorage::in_memory().unwrap(),
            Arc::new(network),
        )
        .unwrap()
    }

    #[test]
    fn all_builtins_registered() {
        let reg = CommandRegistry::new();
        let names = reg.names();
        for name in [
            "open", "click", "back", "forward", "reload", "filter", "where", "cache", "quit",
        ] {
            assert!(names.contains(&name), "missing: {name}");
        }
    }

    #[test]
    fn no_duplicate_triggers() {
        let reg = CommandRegistry::new();
        let triggers = reg.all_triggers();
        let mut seen = Vec::new();
        for t in &triggers {
            assert!(!seen.contains(t), "duplicate trigger: {t}");
            seen.push(t);
        }
    }

    #[test]
    fn help_text_includes_all_commands() {
        let reg = CommandRegistry::new();
        let text = reg.help_text();
        for name in reg.names() {
            assert!(text.contains(name), "help missing: {name}");
        }
        assert!(text.contains("help (h, ?)"));
    }

    #[test]
    fn format_label_variants() {
        assert_eq!(format_label("back", "", &[]), "back");
        assert_eq!(format_label("open", "<url>", &["go"]), "open <url> (go)");
    }

    #[tokio::test]
    async fn unknown_command_is_handled() {
        let reg = CommandRegistry::new();
        let mut browser = test_browser();
        assert_eq!(
            reg.dispatch("teleport now", &mut browser).await.unwrap(),
            CommandResult::Handled
        );
    }

    #[tokio::test]
    async fn dispatch_passes_arguments() {
        let reg = CommandRegistry::new();
        let mut browser = test_browser();
        browser.start().await.unwrap();

        reg.dispatch("open   /restaurant/?id=2", &mut browser)
            .await
            .unwrap();
        assert_eq!(
            browser.router().location().as_str(),
            "http://localhost:8000/restaurant/?id=2"
        );
    }

    #[tokio::test]
    async fn custom_command_works() {
        struct PingCommand;

        #[async_trait]
        impl Command for PingCommand {
            fn name(&self) -> &str {
                "ping"
            }
            fn description(&self) -> &str {
                "pong"
            }
            async fn execute(&self, _args: &str, _browser: &mut Browser) -> Result<CommandResult> {
                Ok(CommandResult::Handled)
            }
        }

        let mut reg = CommandRegistry::new();
        reg.register(Arc::new(PingCommand));
        let mut browser = test_browser();
        assert!(reg.names().contains(&"ping"));
        assert_eq!(
            reg.dispatch("ping", &mut browser).await.unwrap(),
            CommandResult::Handled
        );
    }
}
