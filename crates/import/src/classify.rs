use std::collections::HashSet;

use sitedesk_model::{composite_key, FamilySchema};

use crate::error::RowProblem;
use crate::merge::{build_draft, diff_fields};
use crate::model::{Decision, IncomingRecord, MatchCandidate, MatchTier};

/// Normalized composite key for intra-run duplicate tracking.
pub fn record_key(record: &IncomingRecord, schema: &FamilySchema) -> String {
    let [a, b] = schema.key_fields;
    composite_key(record.get(a).unwrap_or(""), record.get(b).unwrap_or(""))
}

/// Identities claimed by earlier rows of the same run. Two rows naming the
/// same new identity must not both insert, whether they collide on the
/// composite key or on the upstream identifier. Scoped to one run call.
#[derive(Debug, Default)]
pub struct SeenIdentities {
    keys: HashSet<String>,
    external_ids: HashSet<String>,
}

impl SeenIdentities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the identities an Insert/Update decision claims.
    pub fn claim(&mut self, record: &IncomingRecord, schema: &FamilySchema) {
        self.keys.insert(record_key(record, schema));
        if let Some(external_id) = record.external_id() {
            self.external_ids.insert(external_id.to_string());
        }
    }

    fn claimed(&self, record: &IncomingRecord, schema: &FamilySchema) -> bool {
        if record
            .external_id()
            .is_some_and(|id| self.external_ids.contains(id))
        {
            return true;
        }
        self.keys.contains(&record_key(record, schema))
    }
}

/// Decide what to do with one record given its match candidates and the
/// identities already claimed by earlier rows of this run.
///
/// Pure: reads nothing beyond its arguments, writes nothing. Returns the
/// decision plus the human-readable reason the report carries.
pub fn classify(
    record: &IncomingRecord,
    candidates: &[MatchCandidate],
    seen: &SeenIdentities,
    schema: &FamilySchema,
) -> Result<(Decision, String), RowProblem> {
    if candidates.is_empty() {
        if seen.claimed(record, schema) {
            let reason = "duplicate within import batch".to_string();
            return Ok((
                Decision::Conflict { candidate_ids: Vec::new(), reason: reason.clone() },
                reason,
            ));
        }
        let draft = build_draft(record, schema)?;
        return Ok((
            Decision::Insert { draft },
            format!("no existing {} matched", schema.family),
        ));
    }

    // The matcher short-circuits by tier, but filter defensively so a mixed
    // list still resolves to its best tier.
    let top = candidates.iter().map(|c| c.tier).max().unwrap_or(MatchTier::Weak);
    let top_candidates: Vec<&MatchCandidate> =
        candidates.iter().filter(|c| c.tier == top).collect();
    let ids = |cands: &[&MatchCandidate]| -> Vec<String> {
        cands.iter().map(|c| c.entity.id.clone()).collect()
    };

    if top == MatchTier::Weak {
        let reason = "possible duplicate, needs review".to_string();
        return Ok((
            Decision::Conflict { candidate_ids: ids(&top_candidates), reason: reason.clone() },
            reason,
        ));
    }

    if top_candidates.len() > 1 {
        let reason = "ambiguous match".to_string();
        return Ok((
            Decision::Conflict { candidate_ids: ids(&top_candidates), reason: reason.clone() },
            reason,
        ));
    }

    let candidate = top_candidates[0];
    let outcome = diff_fields(record, &candidate.entity, schema)?;
    let id = candidate.entity.id.clone();

    if !outcome.diff.is_empty() {
        let reason = format!(
            "matched by {}; {} field(s) changed",
            candidate.strategy,
            outcome.diff.len()
        );
        return Ok((Decision::Update { id, diff: outcome.diff }, reason));
    }

    if top == MatchTier::Strong && !outcome.locked.is_empty() {
        let reason = "would overwrite user data".to_string();
        return Ok((Decision::SkipLocked { id, reason: reason.clone() }, reason));
    }

    Ok((
        Decision::SkipUnchanged { id },
        format!("matched by {}; already up to date", candidate.strategy),
    ))
}
