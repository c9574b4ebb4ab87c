//! Worker registration and the page-side fetch path.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use url::Url;

use super::{Cache, Fetcher, OfflineWorker, Request, Response, ResponseSource, Served, manifest};
use crate::consts::{WORKER_SCOPE, WORKER_SCRIPT};

/// Host capability to register an offline worker. Environments without it
/// simply don't provide one.
#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    async fn register(&self, script: &str, scope: &str) -> Result<()>;
}

struct Registration {
    scope: Url,
    worker: Arc<OfflineWorker>,
}

/// Holds the registered worker for one origin and routes the page's
/// fetches through it when they fall inside its scope.
pub struct ServiceWorkers {
    origin: Url,
    cache: Arc<dyn Cache>,
    network: Arc<dyn Fetcher>,
    registration: RwLock<Option<Registration>>,
}

impl ServiceWorkers {
    pub fn new(origin: Url, cache: Arc<dyn Cache>, network: Arc<dyn Fetcher>) -> Self {
        Self {
            origin,
            cache,
            network,
            registration: RwLock::new(None),
        }
    }

    /// The active worker, if registration succeeded.
    pub fn controller(&self) -> Option<Arc<OfflineWorker>> {
        self.registration
            .read()
            .unwrap()
            .as_ref()
            .map(|r| Arc::clone(&r.worker))
    }

    pub fn scope(&self) -> Option<Url> {
        self.registration
            .read()
            .unwrap()
            .as_ref()
            .map(|r| r.scope.clone())
    }

    fn controlling_worker(&self, url: &Url) -> Option<Arc<OfflineWorker>> {
        let registration = self.registration.read().unwrap();
        let reg = registration.as_ref()?;
        let in_scope =
            url.origin() == reg.scope.origin() && url.path().starts_with(reg.scope.path());
        in_scope.then(|| Arc::clone(&reg.worker))
    }

    fn build_worker(&self) -> Result<Arc<OfflineWorker>> {
        Ok(Arc::new(OfflineWorker::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.network),
            manifest(&self.origin)?,
        )))
    }

    fn activate(&self, scope: Url, worker: Arc<OfflineWorker>) {
        info!(scope = %scope, "worker registered");
        *self.registration.write().unwrap() = Some(Registration { scope, worker });
    }

    /// Reinstate the worker an earlier session installed, so it controls the
    /// page from its first fetch. Needs a cache holding the whole manifest;
    /// never touches the network. Returns whether a worker is in control.
    pub async fn restore(&self) -> Result<bool> {
        if self.controller().is_some() {
            return Ok(true);
        }
        let worker = self.build_worker()?;
        if !worker.resume().await? {
            debug!("no complete cache to restore a worker from");
            return Ok(false);
        }
        let scope = self
            .origin
            .join(WORKER_SCOPE)
            .context("invalid worker scope")?;
        self.activate(scope, worker);
        Ok(true)
    }

    /// Fetch on behalf of the page, reporting where the response came from.
    pub async fn fetch_served(&self, request: &Request) -> Result<Served> {
        match self.controlling_worker(&request.url) {
            Some(worker) => worker.handle_fetch(request).await,
            None => {
                let response = self.network.fetch(request).await?;
                Ok(Served {
                    response,
                    source: ResponseSource::Network,
                })
            }
        }
    }
}

#[async_trait]
impl WorkerRegistry for ServiceWorkers {
    async fn register(&self, script: &str, scope: &str) -> Result<()> {
        let script_url = self
            .origin
            .join(script)
            .with_context(|| format!("invalid worker script: {script}"))?;
        let scope_url = self
            .origin
            .join(scope)
            .with_context(|| format!("invalid worker scope: {scope}"))?;

        if script_url.origin() != self.origin.origin() || scope_url.origin() != self.origin.origin()
        {
            bail!("worker script and scope must be same-origin with {}", self.origin);
        }
        if script_url.path() != WORKER_SCRIPT {
            bail!("unknown worker script: {}", script_url.path());
        }

        if self.controller().is_some() {
            debug!(scope = %scope_url, "worker already registered");
            return Ok(());
        }

        let worker = self.build_worker()?;
        if !worker.resume().await? {
            worker.install().await?;
        }
        self.activate(scope_url, worker);
        Ok(())
    }
}

#[async_trait]
impl Fetcher for ServiceWorkers {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        Ok(self.fetch_served(request).await?.response)
    }
}
