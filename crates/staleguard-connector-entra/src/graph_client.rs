//! Authenticated Graph GETs with `@odata.nextLink` paging and bounded retries.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{EntraConfig, EntraError, EntraResult, TokenCache};

/// Longest `Retry-After` we are willing to sleep for.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Graph error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
    #[serde(rename = "innerError")]
    pub inner_error: Option<serde_json::Value>,
}

/// One page of a collection.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub value: Vec<T>,
    /// Absolute URL of the next page; absent on the last page.
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// What to do with a non-success response.
#[derive(Debug)]
enum RetryDecision {
    /// Sleep, then repeat the request.
    Wait(Duration),
    /// Drop the cached token, then repeat immediately.
    RefreshToken,
    /// Give up with this error.
    Fail(EntraError),
    /// Not retryable; surface the response body as an error.
    Surface,
}

/// Retry policy: honour `Retry-After` on 429, back off on gateway errors,
/// refresh the token once on 401.
fn decide_retry(
    status: StatusCode,
    headers: &HeaderMap,
    attempt: u32,
    max_retries: u32,
    backoff: Duration,
) -> RetryDecision {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            if attempt >= max_retries {
                return RetryDecision::Fail(EntraError::MaxRetriesExceeded { attempts: attempt });
            }
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            match retry_after {
                Some(secs) if secs > MAX_RETRY_AFTER_SECS => {
                    RetryDecision::Fail(EntraError::RateLimited {
                        retry_after_secs: secs,
                    })
                }
                Some(secs) => RetryDecision::Wait(Duration::from_secs(secs)),
                None => RetryDecision::Wait(backoff),
            }
        }
        StatusCode::UNAUTHORIZED if attempt == 0 => RetryDecision::RefreshToken,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
            if attempt < max_retries =>
        {
            RetryDecision::Wait(backoff)
        }
        _ => RetryDecision::Surface,
    }
}

fn graph_error(status: StatusCode, body: String) -> EntraError {
    match serde_json::from_str::<ODataError>(&body) {
        Ok(odata) => EntraError::GraphApi {
            code: odata.error.code,
            message: odata.error.message,
            inner_error: odata.error.inner_error.map(|v| v.to_string()),
        },
        Err(_) => EntraError::GraphApi {
            code: status.to_string(),
            message: body,
            inner_error: None,
        },
    }
}

/// Microsoft Graph client bound to one tenant's token cache.
#[derive(Debug)]
pub struct GraphClient {
    http_client: reqwest::Client,
    token_cache: Arc<TokenCache>,
    base_url: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl GraphClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token_cache: Arc<TokenCache>, config: &EntraConfig) -> EntraResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EntraError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            token_cache,
            base_url: format!("{}/{}", config.graph_endpoint(), config.api_version),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_secs(1),
        })
    }

    /// First backoff delay; doubles after every retried attempt.
    #[must_use]
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Versioned Graph root, e.g. `https://graph.microsoft.com/v1.0`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and deserialize the body.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> EntraResult<T> {
        let mut attempt = 0u32;
        let mut backoff = self.initial_backoff;

        loop {
            let token = self.token_cache.get_token().await?;
            let response = self
                .http_client
                .get(url)
                .bearer_auth(&token)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return response.json().await.map_err(EntraError::from);
            }

            match decide_retry(
                status,
                response.headers(),
                attempt,
                self.max_retries,
                backoff,
            ) {
                RetryDecision::Wait(wait) => {
                    attempt += 1;
                    warn!(%status, attempt, max_retries = self.max_retries, ?wait, "Retrying Graph request");
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                }
                RetryDecision::RefreshToken => {
                    debug!("Graph rejected the token, requesting a new one");
                    self.token_cache.invalidate().await;
                    attempt += 1;
                }
                RetryDecision::Fail(err) => return Err(err),
                RetryDecision::Surface => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(graph_error(status, body));
                }
            }
        }
    }

    /// Walk a collection from `first_url`, handing each page to `on_page`.
    #[instrument(skip(self, on_page))]
    pub async fn get_paginated<T, F>(&self, first_url: &str, mut on_page: F) -> EntraResult<()>
    where
        T: DeserializeOwned,
        F: FnMut(Vec<T>) -> EntraResult<()>,
    {
        let mut next = Some(first_url.to_string());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            debug!(page = pages + 1, %url, "Fetching page");
            let page: ODataResponse<T> = self.get(&url).await?;
            pages += 1;
            on_page(page.value)?;
            next = page.next_link;
        }

        debug!(pages, "Pagination complete");
        Ok(())
    }
}
