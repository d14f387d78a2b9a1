use super::catalog::StageCatalog;
use super::domain::StatusId;

/// Outcome of validating a requested transition: which statuses would be
/// skipped and which prompts must be resolved before the change can commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionChecks {
    /// Every transition confirms an effective date before commit.
    pub requires_date_prompt: bool,
    /// The target is the designated test dispatch status, whose commit sends
    /// an assessment email upstream; the preview must be acknowledged.
    pub requires_email_preview: bool,
    /// Statuses strictly between current and requested in catalog order.
    /// Non-empty only for forward jumps with an index gap greater than one.
    pub skipped: Vec<StatusId>,
    /// The target is the designated blacklist status; type and reason are
    /// mandatory.
    pub requires_blacklist_fields: bool,
    /// The target is the designated rejection status; a reason is mandatory.
    pub requires_rejection_reason: bool,
}

impl TransitionChecks {
    /// True when nothing beyond the date prompt stands between the caller
    /// and commit.
    pub fn is_plain(&self) -> bool {
        self.skipped.is_empty()
            && !self.requires_email_preview
            && !self.requires_blacklist_fields
            && !self.requires_rejection_reason
    }
}

/// Validate a requested status change against the catalog's total order.
///
/// Backward transitions and single-step forward moves carry no skip flags;
/// only a forward jump with a gap greater than one yields a non-empty
/// `skipped` slice, which callers must surface as a blocking confirmation
/// naming every skipped status. Transitions are flagged, never forbidden.
///
/// A requested status absent from the catalog is a programming error, not a
/// user-facing one, and panics. An unknown *current* status (legacy audit
/// data) yields no skip flags so those applicants can still move.
pub fn validate(current: &StatusId, requested: &StatusId, catalog: &StageCatalog) -> TransitionChecks {
    let requested_index = catalog.index_of(requested).unwrap_or_else(|| {
        panic!("requested status '{requested}' is not part of the stage catalog")
    });

    let skipped = match catalog.index_of(current) {
        Some(current_index) => catalog.slice_between(current_index, requested_index),
        None => Vec::new(),
    };

    TransitionChecks {
        requires_date_prompt: true,
        requires_email_preview: catalog.is_test_dispatch(requested),
        skipped,
        requires_blacklist_fields: catalog.is_blacklist(requested),
        requires_rejection_reason: catalog.is_rejection(requested),
    }
}
