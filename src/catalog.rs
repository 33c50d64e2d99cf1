//! Remote catalog fetching

use crate::constants::{MAX_RETRY_DELAY_MS, USER_AGENT};
use crate::settings::Settings;
use crate::types::Product;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Anything that can go wrong while loading the catalog. Displays the
/// underlying message unchanged.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Transport failures, timeouts and 5xx responses may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request(e) => match e.status() {
                Some(status) => status.is_server_error(),
                None => !e.is_builder() && !e.is_decode(),
            },
            FetchError::Decode(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy {
        max_retries: 0,
        backoff: Duration::ZERO,
    };

    /// Exponential backoff before retry number `attempt` (0-based), capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff
            .saturating_mul(factor)
            .min(Duration::from_millis(MAX_RETRY_DELAY_MS))
    }
}

pub struct CatalogClient {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl CatalogClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>, retry: RetryPolicy) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            url: url.into(),
            retry,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let retry = RetryPolicy {
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.retry_backoff_ms),
        };
        Self::new(settings.catalog_url.clone(), settings.request_timeout(), retry)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Load the catalog, retrying transient failures per the policy.
    pub async fn fetch(&self) -> Result<Vec<Product>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Ok(products) => {
                    info!(count = products.len(), url = %self.url, "Catalog fetched");
                    return Ok(products);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "Catalog fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self) -> Result<Vec<Product>, FetchError> {
        debug!(url = %self.url, "GET catalog");
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! Minimal HTTP/1.1 responder for exercising the client against canned replies.

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    pub struct Reply {
        pub status: &'static str,
        pub body: String,
    }

    impl Reply {
        pub fn new(status: &'static str, body: impl Into<String>) -> Self {
            Self { status, body: body.into() }
        }
    }

    /// Serve the replies in order, one per connection. Returns the base URL.
    pub async fn serve(replies: Vec<Reply>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for reply in replies {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let mut reader = BufReader::new(stream);
                let mut line = String::new();
                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) => break,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => continue,
                        Err(_) => break,
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reply.status,
                    reply.body.len(),
                    reply.body
                );
                let mut stream = reader.into_inner();
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{}/products", addr)
    }
}
