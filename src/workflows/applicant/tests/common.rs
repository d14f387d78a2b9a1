use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::workflows::applicant::catalog::{StageCatalog, StageGroup, StatusEntry};
use crate::workflows::applicant::domain::{
    ApplicantId, EffectiveDate, NotificationId, ProgressId, PromptConfirmations, RecordId,
    SideEffects, StatusId, TransitionRecord, TransitionRequest, UserId,
};
use crate::workflows::applicant::events::WorkflowEvents;
use crate::workflows::applicant::gateway::{GatewayError, StatusGateway};
use crate::workflows::applicant::service::ApplicantStatusService;
use crate::workflows::applicant::UndoableNotification;

/// The five-status pipeline used throughout the scenario tests.
pub(super) fn pipeline_catalog() -> StageCatalog {
    StageCatalog::new(vec![StageGroup::new(
        "PIPELINE",
        "Pipeline",
        vec![
            StatusEntry::new("APPLIED"),
            StatusEntry::new("SCREENED"),
            StatusEntry::new("TEST_SENT"),
            StatusEntry::new("INTERVIEW"),
            StatusEntry::new("OFFER"),
        ],
    )])
    .with_test_dispatch("TEST_SENT")
}

pub(super) fn status(raw: &str) -> StatusId {
    StatusId::new(raw)
}

pub(super) fn progress(raw: &str) -> ProgressId {
    ProgressId(raw.to_string())
}

pub(super) fn request(progress_id: &str, from: &str, to: &str) -> TransitionRequest {
    TransitionRequest {
        progress_id: progress(progress_id),
        applicant_id: ApplicantId(format!("app-{progress_id}")),
        to_status: status(to),
        from_status: status(from),
        actor_id: UserId("user-1".to_string()),
        effective_at: EffectiveDate::At(
            NaiveDate::from_ymd_opt(2025, 10, 1)
                .expect("valid date")
                .and_hms_opt(9, 30, 0)
                .expect("valid time"),
        ),
        side_effects: SideEffects::default(),
    }
}

pub(super) fn confirm_all() -> PromptConfirmations {
    PromptConfirmations {
        skipped_statuses: true,
        email_preview: true,
    }
}

pub(super) fn record(id: u64, progress_id: &str, raw_status: &str) -> TransitionRecord {
    TransitionRecord {
        id: RecordId(format!("rec-{id:04}")),
        progress_id: progress(progress_id),
        status: status(raw_status),
        changed_by: UserId("user-1".to_string()),
        changed_at: Utc::now(),
        deleted: false,
    }
}

/// In-memory stand-in for the upstream tracking API. Stores records
/// oldest-first and serves history newest-first like the real collaborator;
/// failures are scripted one call at a time.
#[derive(Default)]
pub(super) struct MemoryGateway {
    records: Mutex<HashMap<ProgressId, Vec<TransitionRecord>>>,
    requests: Mutex<Vec<TransitionRequest>>,
    sequence: AtomicU64,
    fail_with: Mutex<Option<GatewayError>>,
}

impl MemoryGateway {
    pub(super) fn fail_next(&self, error: GatewayError) {
        *self.fail_with.lock().expect("failure mutex poisoned") = Some(error);
    }

    pub(super) fn seed(&self, progress_id: &str, statuses: &[&str]) {
        let mut guard = self.records.lock().expect("record mutex poisoned");
        let rows = guard.entry(progress(progress_id)).or_default();
        for raw in statuses {
            let id = self.sequence.fetch_add(1, Ordering::Relaxed);
            rows.push(record(id, progress_id, raw));
        }
    }

    pub(super) fn update_calls(&self) -> usize {
        self.requests.lock().expect("request mutex poisoned").len()
    }

    pub(super) fn last_request(&self) -> Option<TransitionRequest> {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl StatusGateway for MemoryGateway {
    async fn update_status(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionRecord, GatewayError> {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request.clone());

        if let Some(error) = self.fail_with.lock().expect("failure mutex poisoned").take() {
            return Err(error);
        }

        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let row = TransitionRecord {
            id: RecordId(format!("rec-{id:04}")),
            progress_id: request.progress_id.clone(),
            status: request.to_status.clone(),
            changed_by: request.actor_id.clone(),
            changed_at: Utc::now(),
            deleted: false,
        };

        self.records
            .lock()
            .expect("record mutex poisoned")
            .entry(request.progress_id.clone())
            .or_default()
            .push(row.clone());

        Ok(row)
    }

    async fn history(&self, progress_id: &ProgressId) -> Result<Vec<TransitionRecord>, GatewayError> {
        if let Some(error) = self.fail_with.lock().expect("failure mutex poisoned").take() {
            return Err(error);
        }

        let guard = self.records.lock().expect("record mutex poisoned");
        let mut rows = guard.get(progress_id).cloned().unwrap_or_default();
        rows.reverse();
        Ok(rows)
    }
}

/// Event sink that records everything it sees.
#[derive(Default)]
pub(super) struct RecordingEvents {
    committed: Mutex<Vec<TransitionRecord>>,
    failed: Mutex<Vec<String>>,
    undo_requests: Mutex<Vec<NotificationId>>,
}

impl RecordingEvents {
    pub(super) fn committed(&self) -> Vec<TransitionRecord> {
        self.committed.lock().expect("event mutex poisoned").clone()
    }

    pub(super) fn failed(&self) -> Vec<String> {
        self.failed.lock().expect("event mutex poisoned").clone()
    }

    pub(super) fn undo_requests(&self) -> Vec<NotificationId> {
        self.undo_requests
            .lock()
            .expect("event mutex poisoned")
            .clone()
    }
}

impl WorkflowEvents for RecordingEvents {
    fn transition_committed(&self, record: &TransitionRecord) {
        self.committed
            .lock()
            .expect("event mutex poisoned")
            .push(record.clone());
    }

    fn transition_failed(&self, error: &GatewayError) {
        self.failed
            .lock()
            .expect("event mutex poisoned")
            .push(error.to_string());
    }

    fn undo_requested(&self, notification: &UndoableNotification) {
        self.undo_requests
            .lock()
            .expect("event mutex poisoned")
            .push(notification.id);
    }
}

pub(super) fn build_service(
    catalog: StageCatalog,
) -> (
    ApplicantStatusService<MemoryGateway, RecordingEvents>,
    Arc<MemoryGateway>,
    Arc<RecordingEvents>,
) {
    let gateway = Arc::new(MemoryGateway::default());
    let events = Arc::new(RecordingEvents::default());
    let service =
        ApplicantStatusService::new(Arc::new(catalog), gateway.clone(), events.clone());
    (service, gateway, events)
}
