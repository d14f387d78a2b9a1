use chrono::{Duration, Utc};

use super::common::{
    build_service, confirm_all, pipeline_catalog, progress, request, status,
};
use crate::workflows::applicant::catalog::StageCatalog;
use crate::workflows::applicant::domain::{BlacklistType, PromptConfirmations, ReasonCode, UserId};
use crate::workflows::applicant::feed::NotificationFeed;
use crate::workflows::applicant::gateway::GatewayError;
use crate::workflows::applicant::service::{ApplicantStatusService, CommitError, UndoError};

#[tokio::test]
async fn commit_updates_local_status_only_after_success() {
    let (service, _, events) = build_service(pipeline_catalog());
    service.load_applicant(progress("p-1"), status("APPLIED"));

    let record = service
        .commit(request("p-1", "APPLIED", "SCREENED"), confirm_all())
        .await
        .expect("commit succeeds");

    assert_eq!(record.status, status("SCREENED"));
    assert_eq!(service.current_status(&progress("p-1")), Some(status("SCREENED")));
    assert_eq!(events.committed().len(), 1);
    assert_eq!(service.notifications().len(), 1);
}

#[tokio::test]
async fn failed_commit_reverts_local_status_and_surfaces_error() {
    let (service, gateway, events) = build_service(pipeline_catalog());
    service.load_applicant(progress("p-1"), status("APPLIED"));
    gateway.fail_next(GatewayError::Unavailable("tracking api offline".to_string()));

    let error = service
        .commit(request("p-1", "APPLIED", "SCREENED"), confirm_all())
        .await
        .expect_err("commit must fail");

    assert!(matches!(error, CommitError::Gateway(GatewayError::Unavailable(_))));
    assert_eq!(service.current_status(&progress("p-1")), Some(status("APPLIED")));
    assert!(service.notifications().is_empty(), "no undoable entry on failure");
    assert_eq!(events.failed().len(), 1);
    assert!(events.committed().is_empty());
}

#[tokio::test]
async fn unconfirmed_skip_blocks_before_any_network_call() {
    let (service, gateway, _) = build_service(pipeline_catalog());

    let error = service
        .commit(
            request("p-1", "APPLIED", "INTERVIEW"),
            PromptConfirmations::default(),
        )
        .await
        .expect_err("skip must block");

    match error {
        CommitError::SkipNotConfirmed { skipped } => {
            assert_eq!(skipped, vec![status("SCREENED"), status("TEST_SENT")]);
        }
        other => panic!("expected skip confirmation error, got {other:?}"),
    }
    assert_eq!(gateway.update_calls(), 0);
}

#[tokio::test]
async fn confirmed_skip_commits() {
    let (service, _, _) = build_service(pipeline_catalog());

    let record = service
        .commit(request("p-1", "APPLIED", "INTERVIEW"), confirm_all())
        .await
        .expect("confirmed skip commits");
    assert_eq!(record.status, status("INTERVIEW"));
}

#[tokio::test]
async fn test_dispatch_commit_requires_email_preview_ack() {
    let (service, gateway, _) = build_service(pipeline_catalog());

    let error = service
        .commit(
            request("p-1", "SCREENED", "TEST_SENT"),
            PromptConfirmations {
                skipped_statuses: true,
                email_preview: false,
            },
        )
        .await
        .expect_err("preview must be acknowledged");

    assert!(matches!(error, CommitError::EmailPreviewNotAcknowledged));
    assert_eq!(gateway.update_calls(), 0);

    service
        .commit(request("p-1", "SCREENED", "TEST_SENT"), confirm_all())
        .await
        .expect("acknowledged preview commits");
}

#[tokio::test]
async fn blacklist_commit_requires_type_and_configured_reason() {
    let (service, gateway, _) = build_service(StageCatalog::standard());

    let bare = request("p-1", "UNPROCESSED", "BLACKLISTED");
    let error = service
        .commit(bare.clone(), confirm_all())
        .await
        .expect_err("fields are mandatory");
    assert!(matches!(error, CommitError::MissingBlacklistFields));

    let mut unknown_reason = bare.clone();
    unknown_reason.side_effects.blacklist_type = Some(BlacklistType::Soft);
    unknown_reason.side_effects.blacklist_reason = Some(ReasonCode::new("BAD_VIBES"));
    let error = service
        .commit(unknown_reason, confirm_all())
        .await
        .expect_err("reason must come from the configured vocabulary");
    assert!(matches!(error, CommitError::UnknownBlacklistReason(_)));
    assert_eq!(gateway.update_calls(), 0);

    let mut valid = bare;
    valid.side_effects.blacklist_type = Some(BlacklistType::Hard);
    valid.side_effects.blacklist_reason = Some(ReasonCode::new("NO_SHOW"));
    service
        .commit(valid, confirm_all())
        .await
        .expect("complete blacklist fields commit");
}

#[tokio::test]
async fn rejection_commit_requires_configured_reason() {
    let (service, _, _) = build_service(StageCatalog::standard());

    let bare = request("p-1", "UNPROCESSED", "NOT_FIT");
    let error = service
        .commit(bare.clone(), confirm_all())
        .await
        .expect_err("reason is mandatory");
    assert!(matches!(error, CommitError::MissingRejectionReason));

    let mut valid = bare;
    valid.side_effects.rejection_reason = Some(ReasonCode::new("SKILLSET_MISMATCH"));
    service
        .commit(valid, confirm_all())
        .await
        .expect("rejection with reason commits");
}

#[tokio::test]
async fn undo_restores_the_previous_status_only() {
    let (service, gateway, events) = build_service(StageCatalog::standard());
    service.load_applicant(progress("p-1"), status("UNPROCESSED"));

    let mut blacklist = request("p-1", "UNPROCESSED", "BLACKLISTED");
    blacklist.side_effects.blacklist_type = Some(BlacklistType::Soft);
    blacklist.side_effects.blacklist_reason = Some(ReasonCode::new("NO_SHOW"));
    service
        .commit(blacklist, confirm_all())
        .await
        .expect("blacklist commits");

    let notification = service.notifications().pop().expect("one notification");
    assert_eq!(notification.previous_backend_status, status("UNPROCESSED"));
    assert_eq!(notification.previous_status, "Unprocessed");

    let restored = service
        .undo(notification.id, UserId("user-2".to_string()))
        .await
        .expect("undo succeeds");

    assert_eq!(restored, status("UNPROCESSED"));
    assert_eq!(
        service.current_status(&progress("p-1")),
        Some(status("UNPROCESSED"))
    );
    assert!(service.notifications().is_empty());
    assert_eq!(events.undo_requests(), vec![notification.id]);

    // The compensating request carries no side-effect fields: blacklist
    // type/reason from the undone transition are not restored. Expected
    // behavior, not a bug.
    let compensating = gateway.last_request().expect("compensating request sent");
    assert_eq!(compensating.to_status, status("UNPROCESSED"));
    assert!(compensating.side_effects.blacklist_type.is_none());
    assert!(compensating.side_effects.blacklist_reason.is_none());
    assert!(compensating.side_effects.rejection_reason.is_none());
}

#[tokio::test]
async fn failed_undo_preserves_the_notification_for_retry() {
    let (service, gateway, _) = build_service(pipeline_catalog());
    service
        .commit(request("p-1", "APPLIED", "SCREENED"), confirm_all())
        .await
        .expect("commit succeeds");

    let notification = service.notifications().pop().expect("one notification");
    gateway.fail_next(GatewayError::Unavailable("tracking api offline".to_string()));

    let error = service
        .undo(notification.id, UserId("user-1".to_string()))
        .await
        .expect_err("undo must fail");
    assert!(matches!(error, UndoError::Gateway(_)));
    assert_eq!(service.notifications().len(), 1, "notification stays for retry");

    service
        .undo(notification.id, UserId("user-1".to_string()))
        .await
        .expect("retry succeeds");
    assert!(service.notifications().is_empty());
}

#[tokio::test]
async fn undo_of_unknown_notification_is_rejected() {
    let (service, gateway, _) = build_service(pipeline_catalog());

    let error = service
        .undo(
            crate::workflows::applicant::NotificationId(9999),
            UserId("user-1".to_string()),
        )
        .await
        .expect_err("nothing to undo");
    assert!(matches!(error, UndoError::UnknownNotification(_)));
    assert_eq!(gateway.update_calls(), 0);
}

#[tokio::test]
async fn notifications_coexist_and_are_independently_undoable() {
    let (service, _, _) = build_service(pipeline_catalog());
    service
        .commit(request("p-1", "APPLIED", "SCREENED"), confirm_all())
        .await
        .expect("first commit");
    service
        .commit(request("p-2", "SCREENED", "TEST_SENT"), confirm_all())
        .await
        .expect("second commit");

    let notifications = service.notifications();
    assert_eq!(notifications.len(), 2);

    service
        .undo(notifications[1].id, UserId("user-1".to_string()))
        .await
        .expect("second notification undoes independently");

    let remaining = service.notifications();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, notifications[0].id);
}

#[tokio::test]
async fn feed_evicts_oldest_past_capacity() {
    let gateway = std::sync::Arc::new(super::common::MemoryGateway::default());
    let events = std::sync::Arc::new(super::common::RecordingEvents::default());
    let service = ApplicantStatusService::with_feed(
        std::sync::Arc::new(pipeline_catalog()),
        gateway,
        events,
        NotificationFeed::new(2),
    );

    for (progress_id, to) in [("p-1", "SCREENED"), ("p-2", "SCREENED"), ("p-3", "SCREENED")] {
        service
            .commit(request(progress_id, "APPLIED", to), confirm_all())
            .await
            .expect("commit succeeds");
    }

    let notifications = service.notifications();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].applicant.progress_id, progress("p-2"));
    assert_eq!(notifications[1].applicant.progress_id, progress("p-3"));
}

#[tokio::test]
async fn dismissal_removes_without_compensating() {
    let (service, gateway, _) = build_service(pipeline_catalog());
    service
        .commit(request("p-1", "APPLIED", "SCREENED"), confirm_all())
        .await
        .expect("commit succeeds");
    let notification = service.notifications().pop().expect("one notification");

    assert!(service.dismiss(notification.id));
    assert!(!service.dismiss(notification.id), "second dismissal is a no-op");
    assert!(service.notifications().is_empty());
    assert_eq!(gateway.update_calls(), 1, "dismissal never calls the gateway");
}

#[tokio::test]
async fn notifications_never_expire_unless_pruned() {
    let (service, _, _) = build_service(pipeline_catalog());
    service
        .commit(request("p-1", "APPLIED", "SCREENED"), confirm_all())
        .await
        .expect("commit succeeds");

    assert_eq!(service.notifications().len(), 1);

    let removed = service.prune_notifications(Utc::now() + Duration::hours(2), Duration::hours(1));
    assert_eq!(removed, 1);
    assert!(service.notifications().is_empty());
}

#[tokio::test]
async fn history_reverses_and_reconstructs() {
    let (service, gateway, _) = build_service(pipeline_catalog());
    gateway.seed("p-1", &["APPLIED", "TEST_SENT", "INTERVIEW"]);

    let history = service
        .history(&progress("p-1"))
        .await
        .expect("history fetch succeeds");

    assert_eq!(history.records.len(), 3);
    assert_eq!(history.records[0].status, status("APPLIED"));
    assert_eq!(history.skipped.get(&1), Some(&vec![status("SCREENED")]));
    assert!(!history.skipped.contains_key(&2));
}
