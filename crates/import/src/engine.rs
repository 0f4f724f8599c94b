use std::collections::BTreeMap;

use chrono::Utc;
use sitedesk_model::{Family, FamilySchema};
use sitedesk_store::EntityStore;

use crate::classify::{classify, SeenIdentities};
use crate::config::ImportProfile;
use crate::error::{ImportError, RowProblem};
use crate::matcher::find_candidates;
use crate::model::{
    Decision, IncomingRecord, ReportMeta, ReportSummary, RowError, RowOutcome, RunReport,
};

/// Run one import: match, classify, and merge every record, then commit the
/// Insert/Update decisions unless `dry_run` is set.
///
/// The classification pass is read-only and completes for every row before
/// the first write, so a dry run and a real run over the same input and
/// store state produce identical decisions. Per-row failures (malformed
/// records, lookup errors, write errors during commit) are recorded in the
/// report and never abort the run; only an unknown family does.
pub fn run<S: EntityStore + ?Sized>(
    store: &mut S,
    family: &str,
    records: &[IncomingRecord],
    dry_run: bool,
) -> Result<RunReport, ImportError> {
    let family: Family = family.parse().map_err(ImportError::UnknownFamily)?;
    let schema = FamilySchema::of(family);

    let mut outcomes: Vec<RowOutcome> = Vec::new();
    let mut errors: Vec<RowError> = Vec::new();
    let mut seen = SeenIdentities::new();

    for record in records {
        let classified = find_candidates(record, &*store, schema)
            .map_err(RowProblem::from)
            .and_then(|candidates| classify(record, &candidates, &seen, schema));
        match classified {
            Ok((decision, reason)) => {
                if matches!(decision, Decision::Insert { .. } | Decision::Update { .. }) {
                    seen.claim(record, schema);
                }
                outcomes.push(RowOutcome { row: record.row, decision, reason });
            }
            Err(problem) => {
                errors.push(RowError { row: record.row, message: problem.to_string() });
            }
        }
    }

    // Commit phase. A failed write is recorded against its row; rows already
    // committed stay committed — the run is re-runnable, not transactional.
    if !dry_run {
        for outcome in &outcomes {
            let written = match &outcome.decision {
                Decision::Insert { draft } => store.insert(draft.clone()).map(|_| ()),
                Decision::Update { id, diff } => store.apply_diff(id, diff),
                _ => Ok(()),
            };
            if let Err(err) = written {
                errors.push(RowError {
                    row: outcome.row,
                    message: format!("write failed: {err}"),
                });
            }
        }
    }

    let summary = ReportSummary::from_outcomes(&outcomes);
    Ok(RunReport {
        meta: ReportMeta {
            family,
            dry_run,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: Utc::now().to_rfc3339(),
        },
        summary,
        outcomes,
        errors,
    })
}

/// Load CSV text into records using a profile's column mapping.
///
/// Header-driven; blank cells become absent fields, and `[defaults]` fill
/// fields the row did not supply. Row indexes are 1-based over data rows.
pub fn load_csv_records(
    csv_data: &str,
    profile: &ImportProfile,
) -> Result<Vec<IncomingRecord>, ImportError> {
    profile.validate()?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut mapping: Vec<(String, usize)> = Vec::with_capacity(profile.columns.len());
    for (field, column) in &profile.columns {
        let idx = headers.iter().position(|h| h == column).ok_or_else(|| {
            ImportError::MissingColumn { column: column.clone(), field: field.clone() }
        })?;
        mapping.push((field.clone(), idx));
    }

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| ImportError::Csv(e.to_string()))?;
        let mut fields = BTreeMap::new();
        for (field, idx) in &mapping {
            let raw = row.get(*idx).unwrap_or("").trim();
            if !raw.is_empty() {
                fields.insert(field.clone(), raw.to_string());
            }
        }
        for (field, value) in &profile.defaults {
            fields.entry(field.clone()).or_insert_with(|| value.clone());
        }
        records.push(IncomingRecord { row: i + 1, fields });
    }

    Ok(records)
}
