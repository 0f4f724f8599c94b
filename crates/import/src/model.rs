use std::collections::BTreeMap;

use serde::Serialize;
use sitedesk_model::{Entity, EntityDraft, Family, FieldDiff};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One normalized row from an import source: canonical field name to raw
/// cell value. Blank cells are absent. Owned by the run that processes it.
#[derive(Debug, Clone)]
pub struct IncomingRecord {
    /// 1-based data row index, for error reporting.
    pub row: usize,
    pub fields: BTreeMap<String, String>,
}

impl IncomingRecord {
    /// Raw value of a field, if present and non-blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// The upstream provider's identifier, if the source carries one.
    pub fn external_id(&self) -> Option<&str> {
        self.get("external_id")
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Confidence tiers, lowest first so `Ord` ranks `Exact` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Weak,
    Strong,
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExternalId,
    NaturalKey,
    FuzzyValue,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExternalId => write!(f, "external id"),
            Self::NaturalKey => write!(f, "natural key"),
            Self::FuzzyValue => write!(f, "fuzzy value"),
        }
    }
}

/// One existing entity found by one strategy. Lives only while its row is
/// being evaluated.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub entity: Entity,
    pub strategy: MatchStrategy,
    pub tier: MatchTier,
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// The classifier's verdict for one incoming record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Insert { draft: EntityDraft },
    Update { id: String, diff: FieldDiff },
    SkipUnchanged { id: String },
    SkipLocked { id: String, reason: String },
    Conflict { candidate_ids: Vec<String>, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Insert,
    Update,
    SkipUnchanged,
    SkipLocked,
    Conflict,
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Insert { .. } => DecisionKind::Insert,
            Self::Update { .. } => DecisionKind::Update,
            Self::SkipUnchanged { .. } => DecisionKind::SkipUnchanged,
            Self::SkipLocked { .. } => DecisionKind::SkipLocked,
            Self::Conflict { .. } => DecisionKind::Conflict,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome for one row, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    pub row: usize,
    pub decision: Decision,
    pub reason: String,
}

/// A row that could not be classified or committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped_locked: usize,
    pub conflicts: usize,
}

impl ReportSummary {
    pub fn from_outcomes(outcomes: &[RowOutcome]) -> Self {
        let mut summary = Self {
            inserted: 0,
            updated: 0,
            unchanged: 0,
            skipped_locked: 0,
            conflicts: 0,
        };
        for outcome in outcomes {
            match outcome.decision.kind() {
                DecisionKind::Insert => summary.inserted += 1,
                DecisionKind::Update => summary.updated += 1,
                DecisionKind::SkipUnchanged => summary.unchanged += 1,
                DecisionKind::SkipLocked => summary.skipped_locked += 1,
                DecisionKind::Conflict => summary.conflicts += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub family: Family,
    pub dry_run: bool,
    pub engine_version: String,
    pub run_at: String,
}

/// Aggregate result of one import run. Identical decisions whether or not
/// the run committed; `meta.dry_run` records which it was.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    pub outcomes: Vec<RowOutcome>,
    pub errors: Vec<RowError>,
}

impl RunReport {
    /// Row outcomes of one decision kind, in input order.
    pub fn rows_with(&self, kind: DecisionKind) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(move |o| o.decision.kind() == kind)
    }
}
