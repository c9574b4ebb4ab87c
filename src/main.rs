use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use url::Url;

use restaurant_reviews::banner::{BannerInfo, print_banner, print_session_summary};
use restaurant_reviews::browser::{Browser, BrowserConfig};
use restaurant_reviews::commands::{CommandRegistry, CommandResult};
use restaurant_reviews::config::{Config, KEY_CACHE_NAME, KEY_ORIGIN};
use restaurant_reviews::consts::{WORKER_SCOPE, WORKER_SCRIPT, default_db_path, format_bytes};
use restaurant_reviews::worker::container::{ServiceWorkers, WorkerRegistry};
use restaurant_reviews::worker::http::HttpFetcher;
use restaurant_reviews::worker::sqlite::SqliteCacheStorage;
use restaurant_reviews::worker::{Cache, Fetcher, Request};

#[derive(Parser)]
#[command(
    name = "restaurant-reviews",
    version,
    about = "Browse the restaurant directory, online or off."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Origin the app is served from (overrides the stored setting)
    #[arg(short, long)]
    origin: Option<String>,

    /// SQLite database for the offline cache and settings (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,

    /// Cache store name; a new name starts from an empty cache
    #[arg(long)]
    cache_name: Option<String>,

    /// Run without registering the offline worker
    #[arg(long, default_value_t = false)]
    no_worker: bool,

    /// Path to load when the session starts
    #[arg(long, default_value = "/")]
    open: String,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive browsing session (default)
    Browse,
    /// Install the offline worker, pre-caching the asset manifest
    Install,
    /// Fetch a URL through the offline worker and report where it came from
    Fetch {
        /// Absolute URL or path under the origin
        url: String,
    },
    /// Inspect or clear cache stores
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Read or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cache stores and their entries
    List,
    /// Delete a cache store (defaults to the active one)
    Clear { name: Option<String> },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show every stored setting
    List,
    Get { key: String },
    Set { key: String, value: String },
    Unset { key: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("restaurant_reviews=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => {
            let path = default_db_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            path.to_string_lossy().into_owned()
        }
    };

    let config = Config::open(&db_path)?;
    let origin = config.resolve(KEY_ORIGIN, cli.origin.as_deref())?;
    let origin = Url::parse(&origin).with_context(|| format!("invalid origin: {origin}"))?;
    let cache_name = config.resolve(KEY_CACHE_NAME, cli.cache_name.as_deref())?;

    let storage = SqliteCacheStorage::open(&db_path)?;
    let network: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);

    match cli.command {
        Some(Command::Install) => {
            let cache = Arc::new(storage.open_cache(&cache_name));
            let workers = ServiceWorkers::new(origin, cache.clone(), network);
            workers.register(WORKER_SCRIPT, WORKER_SCOPE).await?;
            println!(
                "✓ offline worker installed: {} entries in {} ({})",
                cache.keys().await?.len(),
                cache_name,
                format_bytes(cache.size()?)
            );
            Ok(())
        }
        Some(Command::Fetch { url }) => {
            let url = origin
                .join(&url)
                .with_context(|| format!("invalid url: {url}"))?;
            let workers =
                ServiceWorkers::new(origin, Arc::new(storage.open_cache(&cache_name)), network);
            if let Err(e) = workers.register(WORKER_SCRIPT, WORKER_SCOPE).await {
                eprintln!("warning: running without offline worker: {e:#}");
            }
            let served = workers.fetch_served(&Request::get(url)).await?;
            println!(
                "{} {:?} {} {}",
                served.response.status,
                served.source,
                served.response.content_type.as_deref().unwrap_or("-"),
                format_bytes(served.response.body.len() as u64)
            );
            Ok(())
        }
        Some(Command::Cache { action }) => handle_cache(action, &storage, &cache_name).await,
        Some(Command::Config { action }) => handle_config(action, &config),
        Some(Command::Browse) | None => {
            let database = if db_path == ":memory:" {
                "ephemeral"
            } else {
                &db_path
            };
            print_banner(&BannerInfo {
                origin: origin.as_str(),
                cache_name: &cache_name,
                database,
                worker: !cli.no_worker,
            });

            let mut browser = Browser::new(
                BrowserConfig {
                    origin,
                    cache_name,
                    start: cli.open,
                    worker: !cli.no_worker,
                    echo: true,
                },
                storage,
                network,
            )?;
            browser.start().await?;
            repl(&mut browser).await?;
            print_session_summary(browser.router().history().len());
            Ok(())
        }
    }
}

async fn repl(browser: &mut Browser) -> anyhow::Result<()> {
    let registry = CommandRegistry::new();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\n{}> ", browser.router().location().path());
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match registry.dispatch(&line, browser).await {
            Ok(CommandResult::Handled) => {}
            Ok(CommandResult::Quit) => break,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
    Ok(())
}

async fn handle_cache(
    action: CacheAction,
    storage: &SqliteCacheStorage,
    active: &str,
) -> anyhow::Result<()> {
    match action {
        CacheAction::List => {
            let names = storage.names()?;
            if names.is_empty() {
                println!("  (no caches)");
            }
            for name in names {
                let cache = storage.open_cache(&name);
                let keys = cache.keys().await?;
                println!(
                    "  {name}  {} entries, {}",
                    keys.len(),
                    format_bytes(cache.size()?)
                );
                for key in keys {
                    println!("    {key}");
                }
            }
        }
        CacheAction::Clear { name } => {
            let name = name.unwrap_or_else(|| active.to_string());
            if storage.delete(&name)? {
                println!("✓ deleted cache {name}");
            } else {
                println!("  no cache named {name}");
            }
        }
    }
    Ok(())
}

fn handle_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::List => {
            let settings = config.list()?;
            if settings.is_empty() {
                println!("  (no stored settings)");
            }
            for (key, value) in settings {
                println!("  {key} = {value}");
            }
        }
        ConfigAction::Get { key } => match config.get(&key)? {
            Some(value) => println!("{value}"),
            None => println!("  {key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("✓ {key} = {value}");
        }
        ConfigAction::Unset { key } => {
            if config.remove(&key)? {
                println!("✓ {key} unset");
            } else {
                println!("  {key} was not set");
            }
        }
    }
    Ok(())
}
