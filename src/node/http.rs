use super::NodeClient;
use super::protocol::{ENDPOINT_ENTRY, ENDPOINT_HEALTH};
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Remote `cache-node` reached over HTTP.
///
/// Transport failures are retried with exponential backoff and jitter; HTTP
/// error statuses are not.
pub struct HttpNode {
    http_client: reqwest::Client,
    base: Url,
    endpoint: String,
    timeout: Duration,
    attempts: usize,
}

impl HttpNode {
    pub fn new(endpoint: &str, timeout: Duration, attempts: usize) -> Result<Self> {
        let with_scheme = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        let base = Url::parse(&with_scheme)
            .map_err(|e| CacheError::Config(format!("invalid node endpoint {}: {}", endpoint, e)))?;
        if base.cannot_be_a_base() {
            return Err(CacheError::Config(format!(
                "invalid node endpoint {}: not a base URL",
                endpoint
            )));
        }

        Ok(Self {
            http_client: reqwest::Client::new(),
            base,
            endpoint: endpoint.to_string(),
            timeout,
            attempts: attempts.max(1),
        })
    }

    fn url(&self, path: &str, key: Option<&str>) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CacheError::Config(format!("invalid node endpoint {}", self.endpoint)))?;
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|segment| !segment.is_empty()));
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }

    async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut delay_ms = 150u64;

        for attempt in 0..self.attempts {
            match build().timeout(self.timeout).send().await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == self.attempts {
                        return Err(self.transport_error(e));
                    }
                    tracing::debug!(
                        "Request to {} failed (attempt {}/{}): {}",
                        self.endpoint,
                        attempt + 1,
                        self.attempts,
                        e
                    );
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(CacheError::Connection {
            endpoint: self.endpoint.clone(),
            message: "retry attempts exhausted".to_string(),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> CacheError {
        if err.is_timeout() {
            CacheError::Timeout(self.timeout)
        } else {
            CacheError::Connection {
                endpoint: self.endpoint.clone(),
                message: err.to_string(),
            }
        }
    }

    fn status_error(&self, status: StatusCode) -> CacheError {
        CacheError::Backend(format!("{} responded {}", self.endpoint, status))
    }
}

#[async_trait]
impl NodeClient for HttpNode {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let url = self.url(ENDPOINT_ENTRY, Some(key))?;
        let response = self
            .send_with_retry(|| self.http_client.get(url.clone()))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.status_error(response.status()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(Some(body.to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let url = self.url(ENDPOINT_ENTRY, Some(key))?;
        let response = self
            .send_with_retry(|| {
                self.http_client
                    .put(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(value.to_vec())
            })
            .await?;

        if !response.status().is_success() {
            return Err(self.status_error(response.status()));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let url = if key.is_empty() {
            self.url(ENDPOINT_ENTRY, None)?
        } else {
            self.url(ENDPOINT_ENTRY, Some(key))?
        };
        let response = self
            .send_with_retry(|| self.http_client.delete(url.clone()))
            .await?;

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(self.status_error(response.status()))
        }
    }

    async fn health(&self) -> bool {
        let Ok(url) = self.url(ENDPOINT_HEALTH, None) else {
            return false;
        };

        match self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Health probe to {} failed: {}", self.endpoint, e);
                false
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
