//! HTTP client for the school management API
//!
//! Directory endpoints live under `{base}/school/manage_school/`, the home
//! summary under `{base}/core/dashboard/getDashboardData`. Reads are retried
//! on 429, 5xx and connection errors; writes are sent exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ApiSettings;
use crate::error::{Error, Result};
use crate::types::{
    Board, CurrentUser, NewSchool, RoleSummary, School, SchoolId, SummaryEnvelope,
};

use super::{BoardList, DirectoryApi, SchoolEnvelope, SchoolList, SummaryApi, TransitionReply};

const DIRECTORY_PATH: &str = "school/manage_school";
const SUMMARY_PATH: &str = "core/dashboard/getDashboardData";

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Connection settings for [`HttpApi`]
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// API base URL, e.g. "https://school.example.com/api"
    pub base_url: String,

    /// Bearer token
    pub auth_token: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for reads
    pub max_retries: u32,

    /// First retry delay; doubles per attempt
    pub retry_base_delay: Duration,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            timeout_secs: 30,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl From<&ApiSettings> for HttpApiConfig {
    fn from(settings: &ApiSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            auth_token: settings.auth_token.clone().filter(|t| !t.is_empty()),
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
            ..Default::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ReactivateRequest<'a> {
    school_id: &'a str,
}

/// Registration replies come either wrapped or bare
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateResponse {
    Wrapped(SchoolEnvelope),
    Bare(School),
}

/// Longest wait between two read attempts
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Exponential delay before retry `attempt` (1-based), capped at
/// `MAX_RETRY_DELAY`
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

/// Pull a human-readable reason out of an error body
fn error_reason(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["error", "message", "detail"]
            .iter()
            .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
    });
    match detail {
        Some(d) => format!("HTTP {}: {}", status.as_u16(), d),
        None if body.trim().is_empty() => format!("HTTP {}", status.as_u16()),
        None => format!("HTTP {}: {}", status.as_u16(), body.trim()),
    }
}

// ─────────────────────────────────────────────────────────────────
// HttpApi
// ─────────────────────────────────────────────────────────────────

/// Remote implementation of the directory and summary contracts
pub struct HttpApi {
    config: HttpApiConfig,
    client: Client,
    total_requests: AtomicU64,
}

impl HttpApi {
    /// Create a client for the given base URL
    pub fn new(config: HttpApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %config.base_url, "School API client created");

        Ok(Self {
            config,
            client,
            total_requests: AtomicU64::new(0),
        })
    }

    /// Number of HTTP requests sent, retries included
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    fn directory_url(&self, action: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            DIRECTORY_PATH,
            action
        )
    }

    fn summary_url(&self) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), SUMMARY_PATH)
    }

    /// Build the authorization header value (if a token is set)
    fn auth_header(&self) -> Option<String> {
        self.config
            .auth_token
            .as_ref()
            .map(|token| format!("Bearer {}", token))
    }

    fn decorate(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("X-Request-Id", Uuid::new_v4().to_string());
        match self.auth_header() {
            Some(auth) => req.header("Authorization", auth),
            None => req,
        }
    }

    /// GET with retry on transient failures
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut last_error: Option<Error> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = retry_delay(self.config.retry_base_delay, attempt);
                debug!(resource, attempt, ?backoff, "Retrying after error");
                tokio::time::sleep(backoff).await;
            }

            let req = self.decorate(self.client.get(url).query(query));
            self.total_requests.fetch_add(1, Ordering::Relaxed);

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .map_err(|e| Error::malformed(resource, e.to_string()));
                    }

                    let body = response.text().await.unwrap_or_default();
                    let reason = error_reason(status, &body);
                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        warn!(resource, status = %status, attempt, "Retryable API error");
                        last_error = Some(Error::fetch_failed(resource, reason));
                    } else {
                        return Err(Error::fetch_failed(resource, reason));
                    }
                }
                Err(e) if e.is_timeout() => {
                    warn!(resource, attempt, "Request timed out");
                    last_error = Some(Error::FetchTimeout {
                        resource: resource.to_string(),
                        timeout_secs: self.config.timeout_secs,
                    });
                }
                Err(e) if e.is_connect() => {
                    warn!(resource, attempt, error = %e, "Retryable connection error");
                    last_error = Some(Error::fetch_failed(resource, format!("connection error: {}", e)));
                }
                Err(e) => {
                    return Err(Error::fetch_failed(resource, format!("request error: {}", e)));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::fetch_failed(resource, "all retry attempts exhausted")
        }))
    }

    /// Send a write once. Any failure leaves the server state unknown to us
    /// and is reported to the caller without retrying.
    async fn send_write(
        &self,
        req: RequestBuilder,
        subject: &str,
        action: &'static str,
    ) -> Result<Response> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let response = self
            .decorate(req)
            .send()
            .await
            .map_err(|e| Error::transition_failed(subject, action, format!("request error: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::transition_failed(subject, action, error_reason(status, &body)))
    }

    async fn transition(
        &self,
        req: RequestBuilder,
        id: &SchoolId,
        action: &'static str,
    ) -> Result<TransitionReply> {
        let response = self.send_write(req, id.as_str(), action).await?;
        let reply = response
            .json::<TransitionReply>()
            .await
            .map_err(|e| Error::transition_failed(id.as_str(), action, format!("unreadable reply: {}", e)))?;
        debug!(school_id = %id, action, message = ?reply.message, "Transition reply");
        Ok(reply)
    }
}

#[async_trait]
impl DirectoryApi for HttpApi {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn list_by_status(&self, is_active: bool) -> Result<SchoolList> {
        self.get_json(
            "school list",
            &self.directory_url("school_list"),
            &[("is_active", is_active.to_string())],
        )
        .await
    }

    async fn get_by_id(&self, id: &SchoolId) -> Result<School> {
        let envelope: SchoolEnvelope = self
            .get_json(
                "school",
                &self.directory_url("getSchoolById"),
                &[("school_id", id.to_string())],
            )
            .await?;
        Ok(envelope.school)
    }

    async fn deactivate(&self, id: &SchoolId) -> Result<TransitionReply> {
        let req = self
            .client
            .delete(self.directory_url("deactivateSchoolById"))
            .query(&[("school_id", id.as_str())]);
        self.transition(req, id, "deactivate").await
    }

    async fn reactivate(&self, id: &SchoolId) -> Result<TransitionReply> {
        let req = self
            .client
            .patch(self.directory_url("reactivateSchoolById"))
            .json(&ReactivateRequest { school_id: id.as_str() });
        self.transition(req, id, "reactivate").await
    }

    async fn create(&self, draft: NewSchool) -> Result<School> {
        let name = draft.name.clone();
        let req = self.client.post(self.directory_url("create")).json(&draft);
        let response = self.send_write(req, &name, "register").await?;

        match response.json::<CreateResponse>().await {
            Ok(CreateResponse::Wrapped(envelope)) => Ok(envelope.school),
            Ok(CreateResponse::Bare(school)) => Ok(school),
            Err(e) => Err(Error::transition_failed(
                name,
                "register",
                format!("unreadable reply: {}", e),
            )),
        }
    }

    async fn list_boards(&self) -> Result<Vec<Board>> {
        let list: BoardList = self
            .get_json("board list", &self.directory_url("board_list"), &[])
            .await?;
        Ok(list.boards)
    }

    async fn boards_for_school(&self, id: &SchoolId) -> Result<Vec<Board>> {
        let list: BoardList = self
            .get_json(
                "school boards",
                &self.directory_url("getBoardsBySchoolId"),
                &[("school_id", id.to_string())],
            )
            .await?;
        Ok(list.boards)
    }
}

#[async_trait]
impl SummaryApi for HttpApi {
    async fn get_summary(&self, user: &CurrentUser) -> Result<RoleSummary> {
        debug!(role_id = user.role.id(), "Requesting dashboard summary");
        let envelope: SummaryEnvelope = self
            .get_json("dashboard summary", &self.summary_url(), &[])
            .await?;
        envelope
            .data
            .ok_or_else(|| Error::malformed("dashboard summary", "response has no data object"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(HttpApiConfig {
            base_url: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let api = api("https://school.example.com/api/");
        assert_eq!(
            api.directory_url("school_list"),
            "https://school.example.com/api/school/manage_school/school_list"
        );
        assert_eq!(
            api.summary_url(),
            "https://school.example.com/api/core/dashboard/getDashboardData"
        );
    }

    #[test]
    fn test_auth_header() {
        assert_eq!(api("http://x").auth_header(), None);

        let with_token = HttpApi::new(HttpApiConfig {
            auth_token: Some("tok-123".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(with_token.auth_header(), Some("Bearer tok-123".to_string()));
    }

    #[test]
    fn test_config_from_settings_drops_empty_token() {
        let settings = ApiSettings {
            base_url: "https://school.example.com".to_string(),
            auth_token: Some(String::new()),
            timeout_secs: 5,
            max_retries: 0,
        };
        let config = HttpApiConfig::from(&settings);
        assert!(config.auth_token.is_none());
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_retry_delay_doubles_then_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(retry_delay(base, 1), base);
        assert_eq!(retry_delay(base, 3), Duration::from_secs(2));
        assert_eq!(retry_delay(base, 10), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(base, 33), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(base, u32::MAX), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(Duration::from_secs(u64::MAX), 2), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_error_reason_prefers_error_field() {
        let reason = error_reason(StatusCode::FORBIDDEN, r#"{"error": "Not allowed"}"#);
        assert_eq!(reason, "HTTP 403: Not allowed");
        assert_eq!(error_reason(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
        assert_eq!(error_reason(StatusCode::NOT_FOUND, "gone"), "HTTP 404: gone");
    }
}
