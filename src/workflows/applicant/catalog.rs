use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{ReasonCode, StatusId};

/// One status entry with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub id: StatusId,
    pub label: String,
}

impl StatusEntry {
    /// Entry with the label derived from the identifier the way the status
    /// dropdowns render it (`JOB_OFFER_ACCEPTED` -> `Job Offer Accepted`).
    pub fn new(id: impl Into<String>) -> Self {
        let id = StatusId::new(id);
        let label = label_from_id(id.as_str());
        Self { id, label }
    }

    pub fn labeled(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: StatusId::new(id),
            label: label.into(),
        }
    }
}

/// A named group of consecutive statuses. Grouping never affects skip
/// arithmetic, which runs over the flattened status order; it only
/// contextualizes a status within the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageGroup {
    pub name: String,
    pub label: String,
    pub statuses: Vec<StatusEntry>,
}

impl StageGroup {
    pub fn new(name: impl Into<String>, label: impl Into<String>, statuses: Vec<StatusEntry>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            statuses,
        }
    }
}

/// Applicant count rollup for one stage, derived from a set of current
/// statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: String,
    pub label: String,
    pub total: usize,
}

/// Ordered, immutable catalog of valid applicant statuses.
///
/// The flattened status order is the total order that drives skip detection.
/// Designated statuses (test dispatch, blacklist, rejection) and the reason
/// vocabularies are configuration, not engine code: deployments feed their
/// own sets in, and `standard()` reproduces the stock hiring pipeline.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    stages: Vec<StageGroup>,
    order: Vec<StatusId>,
    index: HashMap<StatusId, usize>,
    labels: HashMap<StatusId, String>,
    test_dispatch: Option<StatusId>,
    blacklist: Option<StatusId>,
    rejection: Option<StatusId>,
    blacklist_reasons: Vec<ReasonCode>,
    rejection_reasons: Vec<ReasonCode>,
}

impl StageCatalog {
    /// Build a catalog from stage groups. Panics on duplicate status
    /// identifiers; a duplicated entry is a configuration programming error.
    pub fn new(stages: Vec<StageGroup>) -> Self {
        let mut order = Vec::new();
        let mut index = HashMap::new();
        let mut labels = HashMap::new();

        for stage in &stages {
            for entry in &stage.statuses {
                let position = order.len();
                let previous = index.insert(entry.id.clone(), position);
                assert!(
                    previous.is_none(),
                    "status '{}' appears more than once in the stage catalog",
                    entry.id
                );
                labels.insert(entry.id.clone(), entry.label.clone());
                order.push(entry.id.clone());
            }
        }

        Self {
            stages,
            order,
            index,
            labels,
            test_dispatch: None,
            blacklist: None,
            rejection: None,
            blacklist_reasons: Vec::new(),
            rejection_reasons: Vec::new(),
        }
    }

    /// Designate the status whose commit triggers an outbound email in the
    /// upstream system, gating it behind an email-preview confirmation.
    pub fn with_test_dispatch(mut self, status: impl Into<String>) -> Self {
        self.test_dispatch = Some(self.checked(StatusId::new(status)));
        self
    }

    /// Designate the blacklist status and its closed reason vocabulary.
    pub fn with_blacklist(mut self, status: impl Into<String>, reasons: Vec<ReasonCode>) -> Self {
        self.blacklist = Some(self.checked(StatusId::new(status)));
        self.blacklist_reasons = reasons;
        self
    }

    /// Designate the rejection status and its closed reason vocabulary,
    /// distinct from the blacklist set.
    pub fn with_rejection(mut self, status: impl Into<String>, reasons: Vec<ReasonCode>) -> Self {
        self.rejection = Some(self.checked(StatusId::new(status)));
        self.rejection_reasons = reasons;
        self
    }

    fn checked(&self, status: StatusId) -> StatusId {
        assert!(
            self.contains(&status),
            "designated status '{status}' is not part of the stage catalog"
        );
        status
    }

    pub fn contains(&self, status: &StatusId) -> bool {
        self.index.contains_key(status)
    }

    /// Position of a status in the pipeline's total order.
    pub fn index_of(&self, status: &StatusId) -> Option<usize> {
        self.index.get(status).copied()
    }

    /// Catalog slice strictly between two positions, in pipeline order.
    pub fn slice_between(&self, from: usize, to: usize) -> Vec<StatusId> {
        if to <= from + 1 {
            return Vec::new();
        }
        self.order[from + 1..to].to_vec()
    }

    pub fn statuses(&self) -> &[StatusId] {
        &self.order
    }

    pub fn stages(&self) -> &[StageGroup] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Display label for a status; falls back to prettifying the identifier
    /// for statuses outside the catalog (legacy audit rows).
    pub fn label_of(&self, status: &StatusId) -> String {
        self.labels
            .get(status)
            .cloned()
            .unwrap_or_else(|| label_from_id(status.as_str()))
    }

    /// The stage a status belongs to.
    pub fn stage_of(&self, status: &StatusId) -> Option<&StageGroup> {
        self.stages
            .iter()
            .find(|stage| stage.statuses.iter().any(|entry| &entry.id == status))
    }

    pub fn is_test_dispatch(&self, status: &StatusId) -> bool {
        self.test_dispatch.as_ref() == Some(status)
    }

    pub fn is_blacklist(&self, status: &StatusId) -> bool {
        self.blacklist.as_ref() == Some(status)
    }

    pub fn is_rejection(&self, status: &StatusId) -> bool {
        self.rejection.as_ref() == Some(status)
    }

    pub fn blacklist_reasons(&self) -> &[ReasonCode] {
        &self.blacklist_reasons
    }

    pub fn rejection_reasons(&self) -> &[ReasonCode] {
        &self.rejection_reasons
    }

    pub fn is_valid_blacklist_reason(&self, reason: &ReasonCode) -> bool {
        self.blacklist_reasons.contains(reason)
    }

    pub fn is_valid_rejection_reason(&self, reason: &ReasonCode) -> bool {
        self.rejection_reasons.contains(reason)
    }

    /// Count current statuses per stage. Statuses outside the catalog are
    /// ignored rather than counted into a synthetic bucket.
    pub fn stage_counts<'a>(&self, current: impl IntoIterator<Item = &'a StatusId>) -> Vec<StageCount> {
        let mut totals = vec![0usize; self.stages.len()];
        for status in current {
            if let Some(position) = self
                .stages
                .iter()
                .position(|stage| stage.statuses.iter().any(|entry| &entry.id == status))
            {
                totals[position] += 1;
            }
        }

        self.stages
            .iter()
            .zip(totals)
            .map(|(stage, total)| StageCount {
                stage: stage.name.clone(),
                label: stage.label.clone(),
                total,
            })
            .collect()
    }

    /// The stock hiring pipeline: pre-screening through job offer, with the
    /// archive states at the tail. Designations and reason vocabularies match
    /// the product defaults.
    pub fn standard() -> Self {
        let stages = vec![
            StageGroup::new(
                "PRE_SCREENING",
                "Pre-Screening Stage",
                vec![
                    StatusEntry::new("UNPROCESSED"),
                    StatusEntry::new("PRE_SCREENING"),
                    StatusEntry::new("TEST_SENT"),
                ],
            ),
            StageGroup::new(
                "INTERVIEW_SCHEDULE",
                "Interview Schedule",
                vec![
                    StatusEntry::new("INTERVIEW_SCHEDULE_SENT"),
                    StatusEntry::new("FIRST_INTERVIEW"),
                    StatusEntry::new("SECOND_INTERVIEW"),
                    StatusEntry::new("THIRD_INTERVIEW"),
                    StatusEntry::new("FOURTH_INTERVIEW"),
                    StatusEntry::labeled("FOLLOW_UP_INTERVIEW", "Follow-up Interview"),
                ],
            ),
            StageGroup::new(
                "JOB_OFFER",
                "Job Offer",
                vec![
                    StatusEntry::new("FOR_JOB_OFFER"),
                    StatusEntry::new("JOB_OFFER_REJECTED"),
                    StatusEntry::new("JOB_OFFER_ACCEPTED"),
                ],
            ),
            StageGroup::new(
                "ARCHIVES",
                "Archives",
                vec![
                    StatusEntry::new("WITHDREW_APPLICATION"),
                    StatusEntry::new("FOR_FUTURE_POOLING"),
                    StatusEntry::new("GHOSTED"),
                    StatusEntry::new("NOT_FIT"),
                    StatusEntry::new("BLACKLISTED"),
                ],
            ),
        ];

        StageCatalog::new(stages)
            .with_test_dispatch("TEST_SENT")
            .with_blacklist("BLACKLISTED", standard_blacklist_reasons())
            .with_rejection("NOT_FIT", standard_rejection_reasons())
    }
}

/// Blacklist reasons offered by the applicant detail view. The bulk table
/// historically offered only a subset; see `bulk_blacklist_reasons`.
pub fn standard_blacklist_reasons() -> Vec<ReasonCode> {
    [
        "DID_NOT_TAKE_TEST",
        "NO_SHOW",
        "CULTURE_MISMATCH",
        "EXPECTED_SALARY_MISMATCH",
        "WORKING_SCHEDULE_MISMATCH",
        "OTHER_REASONS",
    ]
    .into_iter()
    .map(ReasonCode::new)
    .collect()
}

/// The narrower blacklist vocabulary observed on the bulk applicant table.
/// Kept as a distinct configurable set; whether the two call sites should
/// share one vocabulary is still an open product question.
pub fn bulk_blacklist_reasons() -> Vec<ReasonCode> {
    ["DID_NOT_TAKE_TEST", "NO_SHOW", "OTHER_REASONS"]
        .into_iter()
        .map(ReasonCode::new)
        .collect()
}

/// Rejection reasons; a closed enumeration not shared with the blacklist set.
pub fn standard_rejection_reasons() -> Vec<ReasonCode> {
    [
        "CULTURE_MISMATCH",
        "ASKING_SALARY_MISMATCH",
        "WORKING_SCHEDULE_MISMATCH",
        "SKILLSET_MISMATCH",
        "OTHER_REASONS",
    ]
    .into_iter()
    .map(ReasonCode::new)
    .collect()
}

/// `SNAKE_CASE` identifier to display label, matching the dropdown renderer.
pub fn label_from_id(id: &str) -> String {
    id.to_lowercase()
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
