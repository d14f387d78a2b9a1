use tracing::{info, warn};

use super::domain::{TransitionRecord, UndoableNotification};
use super::gateway::GatewayError;

/// Outbound hooks consumed by the toast/history layers. Implementations must
/// be cheap and non-blocking; the engine calls them inline.
pub trait WorkflowEvents: Send + Sync {
    fn transition_committed(&self, record: &TransitionRecord);
    fn transition_failed(&self, error: &GatewayError);
    fn undo_requested(&self, notification: &UndoableNotification);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl WorkflowEvents for NoopEvents {
    fn transition_committed(&self, _record: &TransitionRecord) {}
    fn transition_failed(&self, _error: &GatewayError) {}
    fn undo_requested(&self, _notification: &UndoableNotification) {}
}

/// Default production sink: structured log lines per workflow event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl WorkflowEvents for TracingEvents {
    fn transition_committed(&self, record: &TransitionRecord) {
        info!(
            progress_id = %record.progress_id.0,
            status = %record.status,
            record_id = %record.id.0,
            "status transition committed"
        );
    }

    fn transition_failed(&self, error: &GatewayError) {
        warn!(%error, "status transition failed");
    }

    fn undo_requested(&self, notification: &UndoableNotification) {
        info!(
            notification_id = %notification.id,
            progress_id = %notification.applicant.progress_id.0,
            restore_to = %notification.previous_backend_status,
            "undo requested for committed transition"
        );
    }
}
