//! HTTP fetcher implementation
//!
//! This module is the only place that touches the network. It handles:
//! - Building the shared HTTP client with the configured user agent
//! - Single-attempt GETs for listing and route pages
//! - Retried GETs for company detail pages
//! - Error classification
//!
//! Callers only ever see page content or `None`: every failure degrades to
//! "no content".

use crate::config::HttpConfig;
use crate::ScoutError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Result of a single fetch attempt
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, broken body, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Whether another attempt could plausibly succeed
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | Network error / timeout | yes |
    /// | HTTP 5xx | yes |
    /// | HTTP 429 | yes |
    /// | Other HTTP status | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Success { .. } => false,
            Self::HttpError { status_code } => {
                *status_code >= 500 || *status_code == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            Self::NetworkError { .. } => true,
        }
    }

    /// Page body on success, `None` otherwise
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client's own timeout is the listing timeout; detail requests override
/// it per request.
///
/// # Example
///
/// ```no_run
/// use carrier_scout::config::HttpConfig;
/// use carrier_scout::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.listing_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs one GET and classifies the outcome
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `timeout` - Per-request timeout, overriding the client default
pub async fn fetch_url(client: &Client, url: &Url, timeout: Option<Duration>) -> FetchResult {
    let mut request = client.get(url.clone());
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchResult::NetworkError { error }
        }
    }
}

/// The page fetcher shared by every source adapter
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    detail_timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl PageFetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(config: &HttpConfig) -> Result<Self, ScoutError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a fetcher on top of an existing client
    pub fn with_client(client: Client, config: &HttpConfig) -> Self {
        Self {
            client,
            detail_timeout: config.detail_timeout(),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }

    /// Fetches a listing or route page with a single attempt
    pub async fn fetch_listing(&self, url: &Url) -> Option<String> {
        let result = fetch_url(&self.client, url, None).await;
        match &result {
            FetchResult::Success {
                final_url,
                status_code,
                ..
            } => {
                tracing::debug!("Fetched {} ({}) from {}", final_url, status_code, url);
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Listing {} answered HTTP {}", url, status_code);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Listing {} failed: {}", url, error);
            }
        }
        result.into_body()
    }

    /// Fetches a company detail page, retrying transient failures
    ///
    /// Up to `retry-attempts` attempts with a fixed `retry-delay-ms` pause
    /// between them. Returns `None` once attempts run out or on a permanent
    /// failure.
    pub async fn fetch_detail(&self, url: &Url) -> Option<String> {
        for attempt in 1..=self.retry_attempts {
            let result = fetch_url(&self.client, url, Some(self.detail_timeout)).await;

            if !result.is_transient() {
                if let FetchResult::HttpError { status_code } = &result {
                    tracing::debug!("Detail {} answered HTTP {}", url, status_code);
                }
                return result.into_body();
            }

            tracing::debug!(
                "Detail {} attempt {}/{} failed: {:?}",
                url,
                attempt,
                self.retry_attempts,
                result
            );

            if attempt < self.retry_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        tracing::warn!(
            "Giving up on {} after {} attempts",
            url,
            self.retry_attempts
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&HttpConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_user_agent_is_a_client_error() {
        let config = HttpConfig {
            user_agent: "carrier\nscout".to_string(),
            ..Default::default()
        };

        let err = PageFetcher::new(&config).unwrap_err();
        assert!(matches!(err, ScoutError::Reqwest(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchResult::NetworkError {
            error: "Request timeout".to_string()
        }
        .is_transient());
        assert!(FetchResult::HttpError { status_code: 503 }.is_transient());
        assert!(FetchResult::HttpError { status_code: 429 }.is_transient());
        assert!(!FetchResult::HttpError { status_code: 404 }.is_transient());
        assert!(!FetchResult::Success {
            final_url: "https://example.com/".to_string(),
            status_code: 200,
            body: String::new(),
        }
        .is_transient());
    }

    #[test]
    fn test_into_body() {
        let ok = FetchResult::Success {
            final_url: "https://example.com/".to_string(),
            status_code: 200,
            body: "<html></html>".to_string(),
        };
        assert_eq!(ok.into_body(), Some("<html></html>".to_string()));
        assert_eq!(FetchResult::HttpError { status_code: 500 }.into_body(), None);
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_no_content() {
        let config = HttpConfig {
            retry_attempts: 2,
            retry_delay_ms: 1,
            detail_timeout_secs: 1,
            ..HttpConfig::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let url = Url::parse("http://127.0.0.1:9/transportadora/x").unwrap();

        assert_eq!(fetcher.fetch_detail(&url).await, None);
        assert_eq!(fetcher.fetch_listing(&url).await, None);
    }

    // Retry behaviour against live responses is covered with wiremock in
    // tests/integration
}
