use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{Fetcher, Request, Response};

/// A scripted network for tests. Serves canned bodies by exact URL,
/// answers 404 for anything else, and can be switched offline.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, (u16, Option<String>, Vec<u8>)>>,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`.
    pub fn with(self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.serve(url, 200, content_type, body);
        self
    }

    pub fn serve(&self, url: &str, status: u16, content_type: &str, body: impl Into<Vec<u8>>) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            (status, Some(content_type.to_string()), body.into()),
        );
    }

    /// Every request fails with a network error while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of network calls made, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of network calls made for an exact URL.
    pub fn calls_for(&self, url: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(request.url.to_string());

        if self.offline.load(Ordering::SeqCst) {
            bail!("network unreachable: {}", request.url);
        }

        let routes = self.routes.lock().unwrap();
        let response = match routes.get(request.url.as_str()) {
            Some((status, content_type, body)) => Response {
                url: request.url.to_string(),
                status: *status,
                content_type: content_type.clone(),
                body: body.clone(),
            },
            None => Response::new(&request.url, 404, Some("text/plain"), "not found"),
        };
        Ok(response)
    }
}
