//! HTTP client for the Trends API
//!
//! Creates clients with a browser user agent, a cookie store and an optional
//! proxy, and retries rate-limited requests.

use reqwest::{Client, Proxy, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use trends_core::Timestamp;

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    /// API host (default: https://trends.google.com)
    pub base_url: String,
    /// Region code, e.g. "US"
    pub geo: String,
    /// Category id, 0 for all categories
    pub category: u32,
    /// Interface language
    pub language: String,
    /// Query window, e.g. "now 4-H"
    pub timeframe: String,
    /// Timezone offset in minutes sent with every request
    pub tz_offset_minutes: i32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retries after a rate-limited response
    pub max_retries: u32,
    /// Base backoff between retries in milliseconds (multiplied by the attempt)
    pub retry_backoff_ms: u64,
    /// Optional proxy URL (socks5h://, http://)
    pub proxy: Option<String>,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trends.google.com".to_string(),
            geo: "US".to_string(),
            category: 0,
            language: "EN".to_string(),
            timeframe: "now 4-H".to_string(),
            tz_offset_minutes: 0,
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 2000,
            proxy: None,
        }
    }
}

/// Errors from the Trends client
#[derive(Debug, Error)]
pub enum TrendsError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Rate limited, max retries ({0}) exceeded")]
    MaxRetries(u32),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("No time-series widget returned for '{0}'")]
    MissingWidget(String),

    #[error("Empty window returned for '{0}'")]
    EmptyWindow(String),

    #[error("Sample at {timestamp} out of range: {value}")]
    InvalidSample { timestamp: Timestamp, value: i64 },
}

/// User agents for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
];

/// Get a random user agent
pub fn random_user_agent() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Create an HTTP client for the Trends API
pub fn create_client(config: &TrendsConfig) -> Result<Client, TrendsError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(random_user_agent())
        .cookie_store(true);

    if let Some(proxy) = &config.proxy {
        let proxy = Proxy::all(proxy).map_err(|e| TrendsError::ClientBuild(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| TrendsError::ClientBuild(e.to_string()))
}

/// Strip the anti-JSON-hijacking prefix the API puts in front of every body
pub fn strip_guard(body: &str) -> &str {
    let body = body.trim_start();
    match body.strip_prefix(")]}'") {
        Some(rest) => rest.trim_start_matches(',').trim_start(),
        None => body,
    }
}

/// A configured Trends API client
#[derive(Debug, Clone)]
pub struct TrendsClient {
    http: Client,
    config: TrendsConfig,
}

impl TrendsClient {
    pub fn new(config: TrendsConfig) -> Result<Self, TrendsError> {
        let http = create_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TrendsConfig {
        &self.config
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Query parameters shared by every API call
    pub(crate) fn common_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("hl", self.config.language.clone()),
            ("tz", self.config.tz_offset_minutes.to_string()),
        ]
    }

    /// Visit the landing page so the cookie store holds a session cookie
    async fn prime_cookies(&self) {
        let url = self.endpoint("/");
        match self
            .http
            .get(&url)
            .query(&[("geo", self.config.geo.as_str())])
            .send()
            .await
        {
            Ok(resp) => debug!("Primed cookies ({})", resp.status()),
            Err(e) => debug!("Cookie priming failed: {}", e),
        }
    }

    /// GET a body, retrying rate-limited responses with linear backoff
    pub(crate) async fn get_text(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<String, TrendsError> {
        let mut attempt = 0u32;

        loop {
            let response = self.http.get(url).query(params).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                attempt += 1;
                if attempt > self.config.max_retries {
                    return Err(TrendsError::MaxRetries(self.config.max_retries));
                }
                let backoff = Duration::from_millis(self.config.retry_backoff_ms * u64::from(attempt));
                warn!("Rate limited by {}, retry {} in {:?}", url, attempt, backoff);
                self.prime_cookies().await;
                tokio::time::sleep(backoff).await;
                continue;
            }

            if !status.is_success() {
                return Err(TrendsError::Status(status.as_u16()));
            }

            return Ok(response.text().await?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_default_config() {
        let config = TrendsConfig::default();
        assert_eq!(config.geo, "US");
        assert_eq!(config.timeframe, "now 4-H");
        assert_eq!(config.category, 0);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: TrendsConfig =
            serde_json::from_str(r#"{"geo":"GB","max_retries":5}"#).unwrap();
        assert_eq!(config.geo, "GB");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.language, "EN");
    }

    #[test]
    fn test_strip_guard() {
        assert_eq!(strip_guard(")]}'\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_guard(")]}',\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_guard("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_endpoint_joins_base() {
        let client = TrendsClient::new(TrendsConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.endpoint("/trends/api/explore"), "http://localhost:8080/trends/api/explore");
    }

    #[test]
    fn test_bad_proxy_rejected() {
        let result = create_client(&TrendsConfig {
            proxy: Some("not a url".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(TrendsError::ClientBuild(_))));
    }

    #[test]
    fn test_random_user_agent() {
        assert!(random_user_agent().contains("Mozilla"));
    }

    /// Answer every API request with `status`, and everything else (cookie priming) with 200.
    /// Returns the base URL and a counter of API requests served.
    async fn serve_status(status: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let api_hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&api_hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);

                let reply = if request.starts_with("GET /trends/api") {
                    counter.fetch_add(1, Ordering::SeqCst);
                    status
                } else {
                    "200 OK"
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    reply
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), api_hits)
    }

    fn local_client(base_url: String, max_retries: u32) -> TrendsClient {
        TrendsClient::new(TrendsConfig {
            base_url,
            max_retries,
            retry_backoff_ms: 1,
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_rate_limited_until_max_retries() {
        let (base_url, api_hits) = serve_status("429 Too Many Requests").await;
        let client = local_client(base_url, 2);

        let url = client.endpoint("/trends/api/explore");
        let result = client.get_text(&url, &client.common_params()).await;

        assert!(matches!(result, Err(TrendsError::MaxRetries(2))));
        assert_eq!(api_hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let (base_url, api_hits) = serve_status("500 Internal Server Error").await;
        let client = local_client(base_url, 2);

        let url = client.endpoint("/trends/api/widgetdata/multiline");
        let result = client.get_text(&url, &client.common_params()).await;

        assert!(matches!(result, Err(TrendsError::Status(500))));
        assert_eq!(api_hits.load(Ordering::SeqCst), 1);
    }
}
