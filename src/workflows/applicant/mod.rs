//! Applicant status workflow engine.
//!
//! The ordered pipeline of hiring stages an applicant moves through, skip
//! detection over the catalog's total order, history reconstruction from the
//! upstream audit trail, and the compensating undo surfaced through a
//! bounded notification feed. The upstream tracking API and the event
//! consumers are collaborators behind traits so the engine runs without a UI
//! runtime.

pub mod catalog;
pub mod domain;
pub mod events;
pub mod feed;
pub mod gateway;
pub mod history;
pub mod router;
pub mod service;
pub mod validator;

#[cfg(test)]
mod tests;

pub use catalog::{
    bulk_blacklist_reasons, label_from_id, standard_blacklist_reasons, standard_rejection_reasons,
    StageCatalog, StageCount, StageGroup, StatusEntry,
};
pub use domain::{
    ApplicantId, ApplicantRef, BlacklistType, EffectiveDate, NotificationId, ProgressId,
    PromptConfirmations, ReasonCode, RecordId, SideEffects, StatusId, TransitionRecord,
    TransitionRequest, UndoableNotification, UserId,
};
pub use events::{NoopEvents, TracingEvents, WorkflowEvents};
pub use feed::{NotificationFeed, DEFAULT_FEED_CAPACITY};
pub use gateway::{GatewayError, HttpStatusGateway, StatusGateway};
pub use history::{oldest_first, reconstruct, SkipMap, StatusHistory};
pub use router::status_router;
pub use service::{ApplicantStatusService, CommitError, UndoError};
pub use validator::{validate, TransitionChecks};
