// SPDX-License-Identifier: GPL-3.0-or-later

use crate::decoder::{decode_content, decode_search};
use crate::error::{ItunesError, NotFoundError, Result};
use crate::logger::RequestLogger;
use crate::models::{ContentResponse, LookupOutcome, LookupRequest, LookupSelector, SearchRequest};
use crate::query::{lookup_query, search_query, QueryPairs, MAX_LOOKUP_BATCH_SIZE};
use crate::rate_limiter::{TokenBucket, DEFAULT_REQUESTS_PER_MINUTE};
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

/// Base URL of the public iTunes Search API.
pub const ITUNES_API_BASE: &str = "https://itunes.apple.com";
/// Attempts allowed for a request answered with HTTP 429.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Ceiling for a single Retry-After backoff.
pub const DEFAULT_MAX_RETRY_WAIT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("tunesearch/", env!("CARGO_PKG_VERSION"));

/// iTunes Search API client with rate limiting and 429 retry handling.
///
/// Cloning is cheap; clones share the same rate limiter and connection pool.
#[derive(Clone)]
pub struct ItunesClient {
    client: Client,
    base_url: String,
    rate_limiter: TokenBucket,
    max_retries: u32,
    max_retry_wait: Duration,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl fmt::Debug for ItunesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItunesClient")
            .field("base_url", &self.base_url)
            .field("rate_limiter", &self.rate_limiter)
            .field("max_retries", &self.max_retries)
            .field("max_retry_wait", &self.max_retry_wait)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl ItunesClient {
    /// Create a new client with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder() -> ItunesClientBuilder {
        ItunesClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search the store catalogue.
    ///
    /// # Example
    /// ```no_run
    /// # use tunesearch_client::{ItunesClient, SearchRequest};
    /// # use tokio_util::sync::CancellationToken;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = ItunesClient::new()?;
    /// let request = SearchRequest::new("jack johnson").media("music").limit(25);
    /// let response = client.search(&CancellationToken::new(), &request).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(
        &self,
        cancel: &CancellationToken,
        request: &SearchRequest,
    ) -> Result<ContentResponse> {
        let url = self.endpoint("search", &search_query(request)?)?;
        let body = self.execute(cancel, &url).await?;
        decode_search(&body, request.callback.as_deref())
    }

    /// Issue one physical lookup call.
    ///
    /// The selector may carry at most 200 values; use
    /// [`lookup_all`](Self::lookup_all) for larger sets. For track ID lookups
    /// the IDs absent from the response are reported in
    /// [`LookupOutcome::not_found`] alongside the results that were found.
    pub async fn lookup(
        &self,
        cancel: &CancellationToken,
        request: &LookupRequest,
    ) -> Result<LookupOutcome> {
        if request.selector.len() > MAX_LOOKUP_BATCH_SIZE {
            return Err(ItunesError::InvalidInput(format!(
                "a single lookup accepts at most {} values, got {}",
                MAX_LOOKUP_BATCH_SIZE,
                request.selector.len()
            )));
        }

        let url = self.endpoint("lookup", &lookup_query(request)?)?;
        let body = self.execute(cancel, &url).await?;
        let response = decode_content(&body)?;

        let not_found = match &request.selector {
            LookupSelector::Ids(ids) => missing_ids(ids, &response),
            _ => None,
        };

        Ok(LookupOutcome {
            results: response.results,
            not_found,
        })
    }

    fn endpoint(&self, path: &str, query: &QueryPairs) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    /// Perform one logical GET, waiting on the rate limiter and retrying
    /// HTTP 429 responses that carry a usable `Retry-After` header.
    ///
    /// Returns the body of a 200 response.
    pub async fn execute(&self, cancel: &CancellationToken, url: &Url) -> Result<String> {
        self.rate_limiter.take(cancel).await?;

        if let Some(logger) = &self.logger {
            logger.log_request("GET", url.as_str(), None);
        }
        trace!(target: "itunes", "GET {}", url);

        let mut retries = 0u32;
        loop {
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(ItunesError::Cancelled),
                response = self
                    .client
                    .get(url.clone())
                    .header(ACCEPT, "application/json")
                    .send() => response?,
            };

            let status = response.status();
            debug!(target: "itunes", %status, "response status");

            if status != StatusCode::TOO_MANY_REQUESTS {
                let headers = response.headers().clone();
                let body = tokio::select! {
                    _ = cancel.cancelled() => return Err(ItunesError::Cancelled),
                    body = response.text() => body?,
                };
                if let Some(logger) = &self.logger {
                    logger.log_response(status.as_u16(), &headers, Some(body.as_bytes()));
                }

                if status != StatusCode::OK {
                    return Err(ItunesError::Api {
                        status: status.as_u16(),
                        message: status
                            .canonical_reason()
                            .unwrap_or("unexpected status")
                            .to_string(),
                    });
                }

                trace!(target: "itunes", "response body: {}", body);
                return Ok(body);
            }

            if let Some(logger) = &self.logger {
                logger.log_response(status.as_u16(), response.headers(), None);
            }

            retries += 1;
            if retries >= self.max_retries {
                warn!(target: "itunes", attempts = retries, "giving up on rate-limited request");
                return Err(ItunesError::RetriesExhausted { attempts: retries });
            }

            let Some(raw) = response
                .headers()
                .get(RETRY_AFTER)
                .map(|v| v.to_str().unwrap_or(""))
            else {
                return Err(ItunesError::RateLimited);
            };

            let wait = match parse_retry_after(raw) {
                Some(retry_after) => {
                    (retry_after + Duration::from_secs(1)).min(self.max_retry_wait)
                }
                None => {
                    self.log_auth(
                        "Failed to parse Retry-After header",
                        json!({ "retry_after": raw }),
                    );
                    return Err(ItunesError::RateLimited);
                }
            };

            warn!(
                target: "itunes",
                retry_after = raw,
                wait = ?wait,
                retry_count = retries,
                "rate limited, waiting before retry"
            );
            self.log_auth(
                "Rate limited, waiting before retry",
                json!({
                    "retry_after_seconds": raw,
                    "wait_duration": format!("{:?}", wait),
                    "retry_count": retries,
                }),
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(ItunesError::Cancelled),
                _ = sleep(wait) => {}
            }
        }
    }

    fn log_auth(&self, message: &str, fields: Value) {
        if let Some(logger) = &self.logger {
            let fields = match fields {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            logger.log_auth(message, &fields);
        }
    }
}

/// Parse a `Retry-After` value given in (possibly fractional) seconds.
///
/// Negative values count as zero. HTTP-date values are not supported and
/// yield `None`.
pub(crate) fn parse_retry_after(raw: &str) -> Option<Duration> {
    let seconds: f64 = raw.trim().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    Duration::try_from_secs_f64(seconds.max(0.0)).ok()
}

/// Requested track IDs with no matching `trackId` in the response, in request order.
fn missing_ids(requested: &[i64], response: &ContentResponse) -> Option<NotFoundError> {
    let found: HashSet<i64> = response.results.iter().map(|r| r.track_id).collect();
    let missing_ids: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();

    if missing_ids.is_empty() {
        None
    } else {
        Some(NotFoundError {
            missing_ids,
            missing_urls: Vec::new(),
        })
    }
}

/// Builder for configuring an iTunes client.
pub struct ItunesClientBuilder {
    base_url: String,
    timeout: Duration,
    requests: u32,
    per: Duration,
    max_retries: u32,
    max_retry_wait: Duration,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl Default for ItunesClientBuilder {
    fn default() -> Self {
        Self {
            base_url: ITUNES_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            requests: DEFAULT_REQUESTS_PER_MINUTE,
            per: Duration::from_secs(60),
            max_retries: DEFAULT_MAX_RETRIES,
            max_retry_wait: DEFAULT_MAX_RETRY_WAIT,
            logger: None,
        }
    }
}

impl ItunesClientBuilder {
    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn requests_per_minute(self, requests: u32) -> Self {
        self.rate_limit(requests, Duration::from_secs(60))
    }

    /// Allow `requests` calls per `per` window.
    pub fn rate_limit(mut self, requests: u32, per: Duration) -> Self {
        self.requests = requests;
        self.per = per;
        self
    }

    /// Total attempts for a request that keeps receiving HTTP 429.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn max_retry_wait(mut self, wait: Duration) -> Self {
        self.max_retry_wait = wait;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the iTunes client.
    pub fn build(self) -> Result<ItunesClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(ItunesClient {
            client,
            base_url: self.base_url,
            rate_limiter: TokenBucket::new(self.requests, self.per),
            max_retries: self.max_retries,
            max_retry_wait: self.max_retry_wait,
            logger: self.logger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentResult;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("1.5"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-1"), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("inf"), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
    }

    #[test]
    fn test_missing_ids_in_request_order() {
        let response = ContentResponse {
            result_count: 2,
            results: vec![
                ContentResult {
                    track_id: 3,
                    ..Default::default()
                },
                ContentResult {
                    track_id: 1,
                    ..Default::default()
                },
            ],
        };

        let missing = missing_ids(&[1, 2, 3, 4], &response).unwrap();
        assert_eq!(missing.missing_ids, vec![2, 4]);
        assert!(missing_ids(&[1, 3], &response).is_none());
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = ItunesClient::builder()
            .base_url("http://localhost:1234/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}
