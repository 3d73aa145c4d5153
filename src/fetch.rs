//! HTTP boundary: `fetch(url) -> markup`.
//!
//! The page readers depend on the [`Fetch`] trait rather than on `reqwest`
//! directly, so the crawl driver can be exercised against scripted pages.
//! No retries are performed; a failed or timed-out request is reported once
//! and the caller decides what to skip.

use crate::error::{CrawlError, Result};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Something that can turn a URL into page markup.
pub trait Fetch {
    /// GET `url` and return the body. Non-2xx statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client that sends `user_agent` on every request and gives up
    /// on any request after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(user_agent)
            .map_err(|e| CrawlError::Config(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CrawlError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Non-success status");
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| CrawlError::Fetch {
            url: url.to_string(),
            source,
        })?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted [`Fetch`] for driver and reader tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned bodies and records every URL requested.
    #[derive(Debug, Default)]
    pub struct ScriptedFetcher {
        pages: HashMap<String, std::result::Result<String, u16>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub fn failing(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        pub fn requested(&self, url: &str) -> bool {
            self.requests.borrow().iter().any(|u| u == url)
        }
    }

    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.borrow_mut().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(CrawlError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(CrawlError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedFetcher;
    use super::*;

    #[test]
    fn test_http_fetcher_rejects_invalid_user_agent() {
        let result = HttpFetcher::new("bad\nagent", Duration::from_secs(1));
        assert!(matches!(result, Err(CrawlError::Config(_))));
    }

    #[tokio::test]
    async fn test_http_fetcher_times_out_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold connections open without ever responding.
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let fetcher = HttpFetcher::new("nature_crawl-test", Duration::from_millis(300)).unwrap();
        let url = format!("http://{addr}/list?page=1");
        let result = tokio::time::timeout(Duration::from_secs(5), fetcher.fetch(&url))
            .await
            .expect("fetch should give up before the outer deadline");

        let err = result.unwrap_err();
        assert!(matches!(err, CrawlError::Fetch { .. }));
        assert!(err.is_fetch());
    }

    #[tokio::test]
    async fn test_scripted_fetcher_reports_status() {
        let fetcher = ScriptedFetcher::default()
            .page("https://a.test/ok", "<html></html>")
            .failing("https://a.test/down", 500);

        assert_eq!(fetcher.fetch("https://a.test/ok").await.unwrap(), "<html></html>");
        let err = fetcher.fetch("https://a.test/down").await.unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(fetcher.requests.borrow().len(), 2);
    }
}
