use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use super::catalog::StageCatalog;
use super::domain::{
    ApplicantRef, EffectiveDate, NotificationId, ProgressId, PromptConfirmations, ReasonCode,
    SideEffects, StatusId, TransitionRecord, TransitionRequest, UndoableNotification, UserId,
};
use super::events::WorkflowEvents;
use super::feed::NotificationFeed;
use super::gateway::{GatewayError, StatusGateway};
use super::history::StatusHistory;
use super::validator::{self, TransitionChecks};

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    NotificationId(NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Service composing the stage catalog, the upstream gateway, and the event
/// sink into the status workflow engine: validation, commit, history
/// reconstruction, and compensating undo.
///
/// The service keeps a local projection of each applicant's current status.
/// That projection is updated only after the gateway confirms a change —
/// never optimistically before — so a failed commit leaves nothing stale to
/// roll back beyond resetting to `from_status`.
pub struct ApplicantStatusService<G, E> {
    catalog: Arc<StageCatalog>,
    gateway: Arc<G>,
    events: Arc<E>,
    statuses: Mutex<HashMap<ProgressId, StatusId>>,
    feed: Mutex<NotificationFeed>,
}

impl<G, E> ApplicantStatusService<G, E>
where
    G: StatusGateway + 'static,
    E: WorkflowEvents + 'static,
{
    pub fn new(catalog: Arc<StageCatalog>, gateway: Arc<G>, events: Arc<E>) -> Self {
        Self::with_feed(catalog, gateway, events, NotificationFeed::default())
    }

    pub fn with_feed(
        catalog: Arc<StageCatalog>,
        gateway: Arc<G>,
        events: Arc<E>,
        feed: NotificationFeed,
    ) -> Self {
        Self {
            catalog,
            gateway,
            events,
            statuses: Mutex::new(HashMap::new()),
            feed: Mutex::new(feed),
        }
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    /// Seed the local projection with whatever status the applicant record
    /// already holds. There is no canonical start state.
    pub fn load_applicant(&self, progress_id: ProgressId, status: StatusId) {
        self.statuses
            .lock()
            .expect("status cache mutex poisoned")
            .insert(progress_id, status);
    }

    pub fn current_status(&self, progress_id: &ProgressId) -> Option<StatusId> {
        self.statuses
            .lock()
            .expect("status cache mutex poisoned")
            .get(progress_id)
            .cloned()
    }

    /// Which prompts a requested change needs before it can commit.
    pub fn validate(&self, current: &StatusId, requested: &StatusId) -> TransitionChecks {
        validator::validate(current, requested, &self.catalog)
    }

    /// Commit a validated transition through the upstream gateway.
    ///
    /// Side-effect prompts must already be resolved: unconfirmed skips, an
    /// unacknowledged email preview, or missing blacklist/rejection fields
    /// block the commit before any network call. Failures from the gateway
    /// are terminal for the attempt; a fresh user-initiated retry is the only
    /// way forward.
    pub async fn commit(
        &self,
        request: TransitionRequest,
        confirmations: PromptConfirmations,
    ) -> Result<TransitionRecord, CommitError> {
        let checks = self.validate(&request.from_status, &request.to_status);
        self.enforce_prompts(&checks, &request.side_effects, confirmations)?;

        match self.gateway.update_status(&request).await {
            Ok(record) => {
                self.set_status(request.progress_id.clone(), request.to_status.clone());

                let applicant = ApplicantRef {
                    applicant_id: request.applicant_id.clone(),
                    progress_id: request.progress_id.clone(),
                };
                let notification = self.record_transition(
                    applicant,
                    request.to_status.clone(),
                    request.from_status.clone(),
                );
                self.feed
                    .lock()
                    .expect("notification feed mutex poisoned")
                    .push(notification);

                self.events.transition_committed(&record);
                info!(
                    progress_id = %request.progress_id.0,
                    from = %request.from_status,
                    to = %request.to_status,
                    "applicant status updated"
                );
                Ok(record)
            }
            Err(error) => {
                self.set_status(request.progress_id.clone(), request.from_status.clone());
                self.events.transition_failed(&error);
                warn!(
                    progress_id = %request.progress_id.0,
                    attempted = %request.to_status,
                    %error,
                    "applicant status update failed"
                );
                Err(CommitError::Gateway(error))
            }
        }
    }

    fn enforce_prompts(
        &self,
        checks: &TransitionChecks,
        side_effects: &SideEffects,
        confirmations: PromptConfirmations,
    ) -> Result<(), CommitError> {
        if !checks.skipped.is_empty() && !confirmations.skipped_statuses {
            return Err(CommitError::SkipNotConfirmed {
                skipped: checks.skipped.clone(),
            });
        }

        if checks.requires_email_preview && !confirmations.email_preview {
            return Err(CommitError::EmailPreviewNotAcknowledged);
        }

        if checks.requires_blacklist_fields {
            let reason = match (&side_effects.blacklist_type, &side_effects.blacklist_reason) {
                (Some(_), Some(reason)) => reason,
                _ => return Err(CommitError::MissingBlacklistFields),
            };
            if !self.catalog.is_valid_blacklist_reason(reason) {
                return Err(CommitError::UnknownBlacklistReason(reason.clone()));
            }
        }

        if checks.requires_rejection_reason {
            let reason = side_effects
                .rejection_reason
                .as_ref()
                .ok_or(CommitError::MissingRejectionReason)?;
            if !self.catalog.is_valid_rejection_reason(reason) {
                return Err(CommitError::UnknownRejectionReason(reason.clone()));
            }
        }

        Ok(())
    }

    /// Represent a committed transition as an undoable unit. The previous
    /// display label rides along for the toast; the raw previous status is
    /// what the compensating transition targets.
    pub fn record_transition(
        &self,
        applicant: ApplicantRef,
        to: StatusId,
        from_backend: StatusId,
    ) -> UndoableNotification {
        UndoableNotification {
            id: next_notification_id(),
            applicant,
            new_status: to,
            previous_status: self.catalog.label_of(&from_backend),
            previous_backend_status: from_backend,
            created_at: Utc::now(),
        }
    }

    /// Issue the compensating transition for one notification.
    ///
    /// Restores the status field only; blacklist/rejection data from the
    /// undone transition is not resurrected. On success the notification
    /// leaves the feed; on failure it stays so the user can retry.
    pub async fn undo(
        &self,
        id: NotificationId,
        actor_id: UserId,
    ) -> Result<StatusId, UndoError> {
        let notification = self
            .feed
            .lock()
            .expect("notification feed mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(UndoError::UnknownNotification(id))?;

        self.events.undo_requested(&notification);

        let compensating = TransitionRequest {
            progress_id: notification.applicant.progress_id.clone(),
            applicant_id: notification.applicant.applicant_id.clone(),
            to_status: notification.previous_backend_status.clone(),
            from_status: notification.new_status.clone(),
            actor_id,
            effective_at: EffectiveDate::NotApplicable,
            side_effects: SideEffects::default(),
        };

        self.gateway.update_status(&compensating).await?;

        self.set_status(
            notification.applicant.progress_id.clone(),
            notification.previous_backend_status.clone(),
        );
        self.feed
            .lock()
            .expect("notification feed mutex poisoned")
            .remove(id);

        info!(
            notification_id = %id,
            progress_id = %notification.applicant.progress_id.0,
            restored = %notification.previous_backend_status,
            "status transition undone"
        );
        Ok(notification.previous_backend_status)
    }

    /// Drop a notification without compensating. True when it was present.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.feed
            .lock()
            .expect("notification feed mutex poisoned")
            .remove(id)
            .is_some()
    }

    /// Insertion-ordered snapshot of the undoable notifications.
    pub fn notifications(&self) -> Vec<UndoableNotification> {
        self.feed
            .lock()
            .expect("notification feed mutex poisoned")
            .snapshot()
    }

    /// Caller-driven TTL pruning of the feed; see `NotificationFeed`.
    pub fn prune_notifications(
        &self,
        now: chrono::DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> usize {
        self.feed
            .lock()
            .expect("notification feed mutex poisoned")
            .prune_expired(now, ttl)
    }

    /// Fetch the audit trail and rebuild the skip map. The gateway returns
    /// newest-first; reconstruction reverses explicitly.
    pub async fn history(&self, progress_id: &ProgressId) -> Result<StatusHistory, GatewayError> {
        let records = self.gateway.history(progress_id).await?;
        Ok(StatusHistory::from_newest_first(records, &self.catalog))
    }

    fn set_status(&self, progress_id: ProgressId, status: StatusId) {
        self.statuses
            .lock()
            .expect("status cache mutex poisoned")
            .insert(progress_id, status);
    }
}

/// Error raised while committing a transition. Every variant except
/// `Gateway` is produced before any network call.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("transition skips {} and must be confirmed first", format_skipped(.skipped))]
    SkipNotConfirmed { skipped: Vec<StatusId> },
    #[error("changing to the test dispatch status sends an assessment email; the preview must be acknowledged")]
    EmailPreviewNotAcknowledged,
    #[error("blacklist transitions require both a blacklist type and a reason")]
    MissingBlacklistFields,
    #[error("'{0}' is not a configured blacklist reason")]
    UnknownBlacklistReason(ReasonCode),
    #[error("rejection transitions require a rejection reason")]
    MissingRejectionReason,
    #[error("'{0}' is not a configured rejection reason")]
    UnknownRejectionReason(ReasonCode),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Error raised while undoing a committed transition.
#[derive(Debug, thiserror::Error)]
pub enum UndoError {
    #[error("notification {0} is no longer in the feed")]
    UnknownNotification(NotificationId),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

fn format_skipped(skipped: &[StatusId]) -> String {
    skipped
        .iter()
        .map(StatusId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
