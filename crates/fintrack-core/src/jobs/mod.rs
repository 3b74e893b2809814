//! Remote job service client.
//!
//! The backend exposes `POST /api/jobs` (initiate a bank sync, carrying
//! an `Idempotency-Key` header so retried submissions of the same
//! attempt collapse onto the original job) and `GET /api/jobs/{jobId}`
//! (status projection). The backend is the authority on deduplication;
//! this client only has to keep resending the same key.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{BankAccountId, IdempotencyKey, JobId, JobRecord};
use crate::util::{compact_text, normalize_text_option};

#[derive(Debug, Error)]
pub enum JobApiError {
    #[error("Invalid job service configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Job service HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Job service unavailable: {0}")]
    Unavailable(String),
    #[error("Job service rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid job service payload: {0}")]
    InvalidPayload(String),
}

pub type JobApiResult<T> = Result<T, JobApiError>;

impl JobApiError {
    /// Transient failures are safe to retry with the same idempotency
    /// key; everything else is a definitive outcome for the attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Unavailable(_))
    }
}

/// Seam between the sync orchestration and the remote job service.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Initiate a sync job for `account`, deduplicated by `key`.
    async fn initiate_sync(
        &self,
        account: BankAccountId,
        key: &IdempotencyKey,
    ) -> JobApiResult<JobId>;

    /// Fetch the current projection of a job.
    async fn job_status(&self, job_id: &JobId) -> JobApiResult<JobRecord>;
}

/// HTTP implementation of [`JobService`] backed by the FinTrack API.
#[derive(Clone)]
pub struct HttpJobClient {
    base_url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl HttpJobClient {
    pub fn new(base_url: impl Into<String>) -> JobApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            bearer_token: None,
            client: reqwest::Client::builder().build()?,
        })
    }

    /// Attach the signed-in user's access token to every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = normalize_text_option(Some(token.into()));
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl JobService for HttpJobClient {
    async fn initiate_sync(
        &self,
        account: BankAccountId,
        key: &IdempotencyKey,
    ) -> JobApiResult<JobId> {
        let url = format!("{}/api/jobs", self.base_url);
        let response = self
            .authorize(self.client.post(&url))
            .header("Idempotency-Key", key.as_str())
            .header("Accept", "application/json")
            .json(&InitiateSyncRequest {
                bank_account_id: account,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        let payload = response
            .json::<InitiateSyncResponse>()
            .await
            .map_err(decode_error)?;
        let job_id = normalize_text_option(Some(payload.job_id)).ok_or_else(|| {
            JobApiError::InvalidPayload("response did not include jobId".to_string())
        })?;
        Ok(JobId::from(job_id))
    }

    async fn job_status(&self, job_id: &JobId) -> JobApiResult<JobRecord> {
        let url = format!("{}/api/jobs/{}", self.base_url, job_id);
        let response = self
            .authorize(self.client.get(&url))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        response.json::<JobRecord>().await.map_err(decode_error)
    }
}

/// A body we could not decode is a definitive outcome for the attempt,
/// not a service hiccup; keep only transport failures under `Http`.
fn decode_error(err: reqwest::Error) -> JobApiError {
    if err.is_decode() {
        JobApiError::InvalidPayload(err.to_string())
    } else {
        JobApiError::Http(err)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateSyncRequest {
    bank_account_id: BankAccountId,
}

/// The backend answers 202 with `{jobId, status}`; only the id matters here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateSyncResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Split failures into the transient/terminal taxonomy: 5xx and 429
/// mean the service is temporarily unavailable, other statuses are a
/// definitive rejection of the request.
fn classify_api_error(status: StatusCode, body: &str) -> JobApiError {
    let message = parse_api_error(status, body);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        JobApiError::Unavailable(message)
    } else {
        JobApiError::Rejected(message)
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> JobApiResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        JobApiError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(JobApiError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url(String::new()).is_err());
        assert!(normalize_base_url("api.example.com".to_string()).is_err());
    }

    #[test]
    fn normalize_base_url_trims_trailing_slash() {
        let client = HttpJobClient::new("https://api.example.com/").unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
    }

    #[test]
    fn classify_api_error_splits_transient_and_terminal() {
        let unavailable = classify_api_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(unavailable.is_transient());

        let throttled = classify_api_error(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(throttled.is_transient());

        let rejected = classify_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": "bankAccountId is required"}"#,
        );
        assert!(!rejected.is_transient());
        assert!(rejected.to_string().contains("bankAccountId is required"));
    }

    #[test]
    fn invalid_payload_is_terminal() {
        let garbled = JobApiError::InvalidPayload("error decoding response body".to_string());
        assert!(!garbled.is_transient());
    }

    #[test]
    fn parse_api_error_prefers_structured_message() {
        let message = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Account not found"}"#,
        );
        assert_eq!(message, "Account not found (400)");
    }

    #[test]
    fn parse_api_error_falls_back_to_raw_body() {
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down (502)"
        );
    }
}
