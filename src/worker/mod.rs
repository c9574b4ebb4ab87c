//! Offline cache worker.
//!
//! Intercepts the page's fetches and serves them from a named cache store
//! when possible, falling back to the network and filling the cache as it
//! goes. Installation pre-populates the store from a fixed manifest and is
//! all-or-nothing.

pub mod container;
pub mod http;
pub mod mock;
pub mod sqlite;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;

use crate::consts::CACHE_MANIFEST;

/// A GET request issued by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self { url }
    }

    /// Parse an absolute URL into a request.
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid request url: {url}"))?;
        Ok(Self { url })
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(
        url: &Url,
        status: u16,
        content_type: Option<&str>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            url: url.to_string(),
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body).context("response body is not valid UTF-8")
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .with_context(|| format!("failed to parse JSON from {}", self.url))
    }
}

/// Something that can perform a fetch. Network failures are errors;
/// HTTP error statuses are ordinary responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// One named cache store. Matching ignores the query string.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn match_request(&self, request: &Request) -> Result<Option<Response>>;
    async fn put(&self, request: &Request, response: &Response) -> Result<()>;
    /// Store every entry or none of them.
    async fn put_all(&self, entries: &[(Request, Response)]) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
}

/// The slot a request occupies in the cache: its URL without query or fragment.
pub fn cache_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_query(None);
    key.set_fragment(None);
    key.to_string()
}

/// Absolute URLs for every manifest entry under `origin`.
pub fn manifest(origin: &Url) -> Result<Vec<Url>> {
    CACHE_MANIFEST
        .iter()
        .map(|path| {
            origin
                .join(path)
                .with_context(|| format!("invalid manifest path: {path}"))
        })
        .collect()
}

/// Worker lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Registered, not yet installed.
    Parsed,
    Installing,
    /// Installed; intercepting fetches.
    Activated,
    /// Install failed. Never intercepts.
    Redundant,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// A response handed back to the page.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

/// Cache-then-network fetch handler over a single cache store.
pub struct OfflineWorker {
    cache: Arc<dyn Cache>,
    network: Arc<dyn Fetcher>,
    manifest: Vec<Url>,
    state: Mutex<WorkerState>,
}

impl OfflineWorker {
    pub fn new(cache: Arc<dyn Cache>, network: Arc<dyn Fetcher>, manifest: Vec<Url>) -> Self {
        Self {
            cache,
            network,
            manifest,
            state: Mutex::new(WorkerState::Parsed),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    /// Fetch every manifest entry and store them in one go. Any failure
    /// leaves the cache untouched and the worker redundant.
    pub async fn install(&self) -> Result<()> {
        self.set_state(WorkerState::Installing);
        info!(entries = self.manifest.len(), "installing offline worker");

        match self.precache().await {
            Ok(()) => {
                self.set_state(WorkerState::Activated);
                info!("offline worker activated");
                Ok(())
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant);
                warn!(error = %e, "offline worker install failed");
                Err(e)
            }
        }
    }

    /// Activate straight away if an earlier install already stored every
    /// manifest entry in this cache. Returns whether it did.
    pub async fn resume(&self) -> Result<bool> {
        for url in &self.manifest {
            if self
                .cache
                .match_request(&Request::get(url.clone()))
                .await?
                .is_none()
            {
                return Ok(false);
            }
        }
        self.set_state(WorkerState::Activated);
        info!("offline worker resumed from existing cache");
        Ok(true)
    }

    async fn precache(&self) -> Result<()> {
        let fetches = self.manifest.iter().map(|url| {
            let request = Request::get(url.clone());
            let network = Arc::clone(&self.network);
            async move {
                let response = network
                    .fetch(&request)
                    .await
                    .with_context(|| format!("failed to fetch manifest entry {}", request.url))?;
                if !response.ok() {
                    bail!(
                        "manifest entry {} returned status {}",
                        request.url,
                        response.status
                    );
                }
                Ok::<_, anyhow::Error>((request, response))
            }
        });

        let entries = futures::future::try_join_all(fetches).await?;
        self.cache
            .put_all(&entries)
            .await
            .context("failed to store manifest entries")?;
        Ok(())
    }

    /// Answer a fetch from the page: cache first, then network.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Served> {
        if self.state() != WorkerState::Activated {
            let response = self.network.fetch(request).await?;
            return Ok(Served {
                response,
                source: ResponseSource::Network,
            });
        }

        match self.cache.match_request(request).await {
            Ok(Some(response)) => {
                debug!(url = %request.url, "cache hit");
                return Ok(Served {
                    response,
                    source: ResponseSource::Cache,
                });
            }
            Ok(None) => debug!(url = %request.url, "cache miss"),
            Err(e) => warn!(url = %request.url, error = %e, "cache lookup failed"),
        }

        let response = self.network.fetch(request).await.with_context(|| {
            format!("{} is not cached and the network fetch failed", request.url)
        })?;

        if response.ok()
            && let Err(e) = self.cache.put(request, &response).await
        {
            warn!(url = %request.url, error = %e, "failed to cache response");
        }

        Ok(Served {
            response,
            source: ResponseSource::Network,
        })
    }
}

#[async_trait]
impl Fetcher for OfflineWorker {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        Ok(self.handle_fetch(request).await?.response)
    }
}
