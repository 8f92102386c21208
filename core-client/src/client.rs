//! Resilient API client.
//!
//! Wraps the platform's single-shot [`HttpClient`] with authentication,
//! failure classification and bounded exponential backoff. Retries happen
//! here and only here; the transport below never retries on its own.

use crate::error::{RequestFailure, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::time::Sleeper;
use bytes::Bytes;
use core_runtime::config::{DashboardConfig, RequestSettings};
use core_session::error::AcquisitionFailure;
use core_session::types::AccessToken;
use core_session::TokenBroker;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Where the client gets its bearer tokens.
///
/// [`TokenBroker`] is the production implementation; the seam exists so
/// request behaviour can be tested without a full session.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn acquire(
        &self,
        scopes: &[String],
    ) -> std::result::Result<AccessToken, AcquisitionFailure>;
}

#[async_trait]
impl TokenSource for TokenBroker {
    async fn acquire(
        &self,
        scopes: &[String],
    ) -> std::result::Result<AccessToken, AcquisitionFailure> {
        TokenBroker::acquire(self, scopes).await
    }
}

/// Bounded exponential backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &RequestSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: settings.retry_base_delay,
            max_delay: settings.retry_max_delay,
        }
    }

    /// Delay before retry number `attempt` (zero-based), capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// A request against the dashboard API, relative to the configured base.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    body: Option<Bytes>,
    json: bool,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            json: false,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: None,
            json: false,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            path: path.into(),
            body: None,
            json: false,
        }
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> std::result::Result<Self, RequestFailure> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| RequestFailure::Decode(e.to_string()))?;
        self.body = Some(Bytes::from(bytes));
        self.json = true;
        Ok(self)
    }
}

/// A classified, successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| RequestFailure::Decode(e.to_string()))
    }
}

/// Authenticated HTTP client with classification and backoff.
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    tokens: Arc<dyn TokenSource>,
    sleeper: Arc<dyn Sleeper>,
    base_url: String,
    api_scopes: Vec<String>,
    timeout: Duration,
    policy: RetryPolicy,
}

impl ApiClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        tokens: Arc<dyn TokenSource>,
        sleeper: Arc<dyn Sleeper>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            http,
            tokens,
            sleeper,
            base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
            api_scopes: config.api_scopes.clone(),
            timeout: config.request.timeout,
            policy: RetryPolicy::from_settings(&config.request),
        }
    }

    /// Send a request, retrying transient failures with backoff.
    ///
    /// Token acquisition failing is not fatal: the request goes out
    /// without a bearer header and the server answers 401 if it minds.
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let token = match self.tokens.acquire(&self.api_scopes).await {
            Ok(token) => Some(token),
            Err(failure) => {
                debug!(%failure, "Proceeding without a bearer token");
                None
            }
        };

        let mut attempt = 0u32;
        loop {
            let outcome = classify(
                self.http
                    .execute(self.build_request(&request, token.as_ref()))
                    .await,
            );

            match outcome {
                Ok(response) => return Ok(response),
                Err(failure) if failure.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        %failure,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    warn!(%failure, attempt, "Request failed");
                    return Err(failure);
                }
            }
        }
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    fn build_request(&self, request: &ApiRequest, token: Option<&AccessToken>) -> HttpRequest {
        let url = format!("{}{}", self.base_url, request.path);
        let mut http = HttpRequest::new(request.method, url).timeout(self.timeout);

        if let Some(token) = token {
            http = http.bearer_token(&token.value);
        }
        if request.json {
            http = http.header("Content-Type", "application/json");
        }
        if let Some(body) = &request.body {
            http = http.body(body.clone());
        }

        http
    }
}

/// Collapse a transport outcome into success or a typed failure.
fn classify(outcome: bridge_traits::error::Result<HttpResponse>) -> Result<ApiResponse> {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => return Err(RequestFailure::Network(e.to_string())),
    };

    match response.status {
        200..=299 => Ok(ApiResponse {
            status: response.status,
            body: response.body,
        }),
        429 => Err(RequestFailure::RateLimited),
        400..=499 => Err(RequestFailure::ClientError {
            status: response.status,
            detail: extract_detail(&response.body),
        }),
        _ => Err(RequestFailure::ServerError {
            status: response.status,
        }),
    }
}

/// Pull a human-readable detail string out of an error body, if present.
fn extract_detail(body: &Bytes) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    for field in ["detail", "message"] {
        if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }
    None
}
