use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NotificationId, ProgressId, PromptConfirmations, TransitionRequest, UserId};
use super::events::WorkflowEvents;
use super::gateway::{GatewayError, StatusGateway};
use super::service::{ApplicantStatusService, CommitError, UndoError};

/// Router builder exposing the status workflow over HTTP.
pub fn status_router<G, E>(service: Arc<ApplicantStatusService<G, E>>) -> Router
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    Router::new()
        .route("/api/v1/applicants/status", put(commit_handler::<G, E>))
        .route(
            "/api/v1/applicants/:progress_id/status-history",
            get(history_handler::<G, E>),
        )
        .route(
            "/api/v1/applicants/status/notifications",
            get(notifications_handler::<G, E>),
        )
        .route(
            "/api/v1/applicants/status/notifications/:notification_id",
            delete(dismiss_handler::<G, E>),
        )
        .route(
            "/api/v1/applicants/status/undo",
            post(undo_handler::<G, E>),
        )
        .route("/api/v1/pipeline/catalog", get(catalog_handler::<G, E>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitPayload {
    #[serde(flatten)]
    request: TransitionRequest,
    /// The caller accepted the blocking skip warning.
    #[serde(default)]
    skip_confirmed: bool,
    /// The caller acknowledged the outbound-email preview.
    #[serde(default)]
    email_preview_confirmed: bool,
}

pub(crate) async fn commit_handler<G, E>(
    State(service): State<Arc<ApplicantStatusService<G, E>>>,
    axum::Json(payload): axum::Json<CommitPayload>,
) -> Response
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    let confirmations = PromptConfirmations {
        skipped_statuses: payload.skip_confirmed,
        email_preview: payload.email_preview_confirmed,
    };

    match service.commit(payload.request, confirmations).await {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(CommitError::SkipNotConfirmed { skipped }) => {
            let payload = json!({
                "error": "transition skips statuses and must be confirmed",
                "skipped_statuses": skipped,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error @ CommitError::Gateway(_)) => gateway_failure(error).into_response(),
        Err(validation) => {
            let payload = json!({ "error": validation.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn history_handler<G, E>(
    State(service): State<Arc<ApplicantStatusService<G, E>>>,
    Path(progress_id): Path<String>,
) -> Response
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    match service.history(&ProgressId(progress_id)).await {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(error) => gateway_failure(CommitError::Gateway(error)).into_response(),
    }
}

pub(crate) async fn notifications_handler<G, E>(
    State(service): State<Arc<ApplicantStatusService<G, E>>>,
) -> Response
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    (StatusCode::OK, axum::Json(service.notifications())).into_response()
}

pub(crate) async fn dismiss_handler<G, E>(
    State(service): State<Arc<ApplicantStatusService<G, E>>>,
    Path(notification_id): Path<u64>,
) -> Response
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    if service.dismiss(NotificationId(notification_id)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        let payload = json!({ "error": "notification not found" });
        (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UndoPayload {
    notification_id: u64,
    user_id: String,
}

pub(crate) async fn undo_handler<G, E>(
    State(service): State<Arc<ApplicantStatusService<G, E>>>,
    axum::Json(payload): axum::Json<UndoPayload>,
) -> Response
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    let id = NotificationId(payload.notification_id);
    match service.undo(id, UserId(payload.user_id)).await {
        Ok(restored) => {
            let payload = json!({ "restored_status": restored });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(UndoError::UnknownNotification(_)) => {
            let payload = json!({ "error": "notification not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(UndoError::Gateway(error)) => {
            gateway_failure(CommitError::Gateway(error)).into_response()
        }
    }
}

pub(crate) async fn catalog_handler<G, E>(
    State(service): State<Arc<ApplicantStatusService<G, E>>>,
) -> Response
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    let catalog = service.catalog();
    let payload = json!({
        "stages": catalog.stages(),
        "statuses": catalog.statuses(),
        "blacklist_reasons": catalog.blacklist_reasons(),
        "rejection_reasons": catalog.rejection_reasons(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn gateway_failure(error: CommitError) -> (StatusCode, axum::Json<serde_json::Value>) {
    let status = match &error {
        CommitError::Gateway(GatewayError::Conflict) => StatusCode::CONFLICT,
        CommitError::Gateway(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, axum::Json(json!({ "error": error.to_string() })))
}
