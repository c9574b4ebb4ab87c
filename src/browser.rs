//! One browsing session: router, terminal view, offline worker and data,
//! wired together over a single origin.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::consts::DATABASE_PATH;
use crate::data::RestaurantDb;
use crate::pages::FilterSelection;
use crate::pages::terminal::TerminalView;
use crate::router::{Navigation, PageState, RouteError, Router};
use crate::worker::Fetcher;
use crate::worker::container::{ServiceWorkers, WorkerRegistry};
use crate::worker::sqlite::{SqliteCache, SqliteCacheStorage};

pub struct BrowserConfig {
    pub origin: Url,
    pub cache_name: String,
    /// Path (or absolute URL) the document is first loaded at.
    pub start: String,
    /// Whether the host can register the offline worker.
    pub worker: bool,
    /// Print rendered pages to stdout.
    pub echo: bool,
}

pub struct Browser {
    router: Router<TerminalView>,
    workers: Arc<ServiceWorkers>,
    storage: SqliteCacheStorage,
    cache_name: String,
    worker_enabled: bool,
}

impl Browser {
    pub fn new(
        config: BrowserConfig,
        storage: SqliteCacheStorage,
        network: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let cache = Arc::new(storage.open_cache(&config.cache_name));
        let workers = Arc::new(ServiceWorkers::new(
            config.origin.clone(),
            cache,
            network,
        ));

        let data_url = config
            .origin
            .join(DATABASE_PATH)
            .context("invalid data url")?;
        let page_fetcher: Arc<dyn Fetcher> = workers.clone();
        let db = Arc::new(RestaurantDb::new(page_fetcher, data_url));
        let view = TerminalView::new(db).echo(config.echo);

        let start = config
            .origin
            .join(&config.start)
            .with_context(|| format!("invalid start location: {}", config.start))?;

        Ok(Self {
            router: Router::new(start, view),
            workers,
            storage,
            cache_name: config.cache_name,
            worker_enabled: config.worker,
        })
    }

    /// Load the document. A worker installed by an earlier session takes
    /// control first; then the start location renders and registration
    /// runs for a first visit.
    pub async fn start(&mut self) -> Result<Navigation, RouteError> {
        let workers = Arc::clone(&self.workers);
        let registry = if self.worker_enabled {
            if let Err(e) = workers.restore().await {
                warn!(error = %e, "could not restore offline worker");
            }
            Some(&*workers as &dyn WorkerRegistry)
        } else {
            None
        };
        self.router.init(registry).await
    }

    /// Change the index filter and refresh the list if it is showing.
    pub async fn set_filter(&mut self, filter: FilterSelection) -> bool {
        self.router.view_mut().set_filter(filter);
        if self.router.state() == Some(PageState::Index) {
            self.router.reload().await;
            return true;
        }
        false
    }

    pub fn router(&self) -> &Router<TerminalView> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router<TerminalView> {
        &mut self.router
    }

    pub fn workers(&self) -> &ServiceWorkers {
        &self.workers
    }

    pub fn cache(&self) -> SqliteCache {
        self.storage.open_cache(&self.cache_name)
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }
}
