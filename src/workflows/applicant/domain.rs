use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for applicants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Identifier for an applicant's progress row, the key the status history
/// hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressId(pub String);

/// Identifier for the acting user recorded on each transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Server-assigned identifier for a persisted transition record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

/// Session-local identifier for an undoable notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque status identifier drawn from the Stage Catalog. Ordering is defined
/// entirely by catalog position, never by the identifier itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusId(pub String);

impl StatusId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two-valued blacklist classification carried on blacklist transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlacklistType {
    Soft,
    Hard,
}

/// Closed-vocabulary reason code; membership is validated against the
/// catalog's configured reason sets at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReasonCode(pub String);

impl ReasonCode {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const NOT_APPLICABLE: &str = "N/A";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// When a status change took effect. The upstream API accepts either a
/// caller-confirmed timestamp or the literal sentinel "N/A" when the user
/// declared the date inapplicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveDate {
    At(NaiveDateTime),
    NotApplicable,
}

impl EffectiveDate {
    /// Wire representation: `2025-10-01T09:30:00`, `2025-10-01`, or `N/A`.
    pub fn as_wire(&self) -> String {
        match self {
            EffectiveDate::At(at) => at.format(DATETIME_FORMAT).to_string(),
            EffectiveDate::NotApplicable => NOT_APPLICABLE.to_string(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(NOT_APPLICABLE) {
            return Ok(EffectiveDate::NotApplicable);
        }
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT) {
            return Ok(EffectiveDate::At(at));
        }
        // The bulk table submits a bare date without a time component.
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(|date| EffectiveDate::At(date.and_hms_opt(0, 0, 0).expect("midnight is valid")))
            .map_err(|err| format!("'{raw}' is neither a timestamp nor {NOT_APPLICABLE} ({err})"))
    }
}

impl Serialize for EffectiveDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for EffectiveDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        EffectiveDate::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Extra mandatory input carried by designated target statuses. Populated by
/// whichever prompt is relevant; empty for ordinary transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffects {
    #[serde(rename = "blacklisted_type", skip_serializing_if = "Option::is_none", default)]
    pub blacklist_type: Option<BlacklistType>,
    #[serde(rename = "reason", skip_serializing_if = "Option::is_none", default)]
    pub blacklist_reason: Option<ReasonCode>,
    #[serde(
        rename = "reason_for_rejection",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub rejection_reason: Option<ReasonCode>,
}

/// A requested status change, shaped to the upstream update API's field
/// names. `from_status` must equal the applicant's currently recorded status
/// at commit time; that optimistic-concurrency check belongs to the upstream
/// collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub progress_id: ProgressId,
    pub applicant_id: ApplicantId,
    #[serde(rename = "status")]
    pub to_status: StatusId,
    #[serde(rename = "previous_status")]
    pub from_status: StatusId,
    #[serde(rename = "user_id")]
    pub actor_id: UserId,
    #[serde(rename = "change_date")]
    pub effective_at: EffectiveDate,
    #[serde(flatten)]
    pub side_effects: SideEffects,
}

/// Immutable audit entry for one committed status change. Records are
/// append-only; a compensating undo may mark one `deleted` upstream but it is
/// never physically removed, and deleted rows still participate in skip
/// reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: RecordId,
    pub progress_id: ProgressId,
    pub status: StatusId,
    #[serde(rename = "user_id")]
    pub changed_by: UserId,
    #[serde(rename = "created_at")]
    pub changed_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

/// The applicant a notification refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRef {
    pub applicant_id: ApplicantId,
    pub progress_id: ProgressId,
}

/// An in-flight committed transition represented as an undoable unit.
/// `previous_status` carries the display label shown in the toast;
/// `previous_backend_status` is the raw identifier the compensating
/// transition targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoableNotification {
    pub id: NotificationId,
    pub applicant: ApplicantRef,
    pub new_status: StatusId,
    pub previous_status: String,
    pub previous_backend_status: StatusId,
    pub created_at: DateTime<Utc>,
}

/// Caller-resolved prompt outcomes gating a commit. The engine never shows
/// UI; it only refuses to commit until the relevant confirmations arrive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptConfirmations {
    /// The blocking skip warning naming every skipped status was accepted.
    pub skipped_statuses: bool,
    /// The outbound-email preview for the test dispatch status was accepted.
    pub email_preview: bool,
}
