use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::{Fetcher, Request, Response};

/// Real network access through reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("restaurant-reviews/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let resp = self
            .client
            .get(request.url.clone())
            .send()
            .await
            .with_context(|| format!("request to {} failed", request.url))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {}", request.url))?;

        Ok(Response {
            url: request.url.to_string(),
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
