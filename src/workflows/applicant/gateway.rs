use async_trait::async_trait;
use reqwest::StatusCode;

use super::domain::{ProgressId, TransitionRecord, TransitionRequest};

/// The external applicant-tracking collaborator. Idempotency and stale
/// `from_status` conflict handling are this collaborator's responsibility,
/// not the engine's.
#[async_trait]
pub trait StatusGateway: Send + Sync {
    /// Persist a status change and return the created audit record.
    async fn update_status(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionRecord, GatewayError>;

    /// Full transition history for one progress row, newest-first.
    async fn history(&self, progress_id: &ProgressId) -> Result<Vec<TransitionRecord>, GatewayError>;
}

/// Failures surfaced by the upstream tracking API. All are terminal for the
/// attempt; the engine never retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("status update conflicts with a newer change")]
    Conflict,
    #[error("status update rejected upstream: {0}")]
    Rejected(String),
    #[error("applicant tracking API unavailable: {0}")]
    Unavailable(String),
}

/// HTTP implementation over the upstream tracking API.
pub struct HttpStatusGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl StatusGateway for HttpStatusGateway {
    async fn update_status(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionRecord, GatewayError> {
        let response = self
            .client
            .put(self.url("applicant/update/status"))
            .json(request)
            .send()
            .await
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<TransitionRecord>()
                .await
                .map_err(|err| GatewayError::Rejected(format!("malformed record payload: {err}"))),
            StatusCode::CONFLICT => Err(GatewayError::Conflict),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GatewayError::Rejected(format!("{status}: {body}")))
            }
        }
    }

    async fn history(&self, progress_id: &ProgressId) -> Result<Vec<TransitionRecord>, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("applicant/status-history/{}", progress_id.0)))
            .send()
            .await
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<Vec<TransitionRecord>>()
                .await
                .map_err(|err| GatewayError::Rejected(format!("malformed history payload: {err}"))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GatewayError::Rejected(format!("{status}: {body}")))
            }
        }
    }
}
