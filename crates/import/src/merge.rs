use sitedesk_model::{
    parse_amount, parse_date, parse_flag, Entity, EntityDraft, FamilySchema, FieldDiff, FieldKind,
    FieldSpec, FieldValue, COMPLETED_STATUS,
};

use crate::error::RowProblem;
use crate::model::IncomingRecord;

/// Result of diffing one record against one existing entity.
#[derive(Debug)]
pub struct DiffOutcome {
    /// Writable changes. Empty means the entity is already up to date.
    pub diff: FieldDiff,
    /// Fields that differ but are locked by user-entered values.
    pub locked: Vec<String>,
}

/// Parse a raw cell under the field's declared kind.
pub fn parse_field(spec: &FieldSpec, raw: &str) -> Result<FieldValue, RowProblem> {
    let bad = |expected: &'static str| RowProblem::BadField {
        field: spec.name.to_string(),
        value: raw.to_string(),
        expected,
    };
    match spec.kind {
        FieldKind::Text => Ok(FieldValue::Text(raw.trim().to_string())),
        FieldKind::Amount => parse_amount(raw).map(FieldValue::Amount).ok_or_else(|| bad("an amount")),
        FieldKind::Date => parse_date(raw).map(FieldValue::Date).ok_or_else(|| bad("a date")),
        FieldKind::Flag => parse_flag(raw).map(FieldValue::Flag).ok_or_else(|| bad("a flag")),
    }
}

/// Build the entity draft an `Insert` decision will commit.
///
/// Requires the first key field (name); everything else the record carries
/// is parsed under the schema. Fields the schema does not know are dropped.
pub fn build_draft(
    record: &IncomingRecord,
    schema: &FamilySchema,
) -> Result<EntityDraft, RowProblem> {
    if record.get(schema.key_fields[0]).is_none() {
        return Err(RowProblem::MissingField(schema.key_fields[0].to_string()));
    }

    let mut fields = std::collections::BTreeMap::new();
    for name in record.fields.keys() {
        let Some(spec) = schema.field(name) else {
            continue;
        };
        let Some(raw) = record.get(name) else {
            continue;
        };
        fields.insert(spec.name.to_string(), parse_field(spec, raw)?);
    }

    Ok(EntityDraft {
        family: schema.family,
        external_id: record.external_id().map(String::from),
        fields,
    })
}

/// Compute the field-level changes an update would apply.
///
/// - Import-owned fields change whenever the parsed incoming value differs.
/// - User-owned fields change only while the existing value is still at its
///   default; once a human set one it stays set (value-based lock).
/// - A record never leaves `completed` status via import.
/// - Blank incoming cells never write and never clear.
pub fn diff_fields(
    record: &IncomingRecord,
    existing: &Entity,
    schema: &FamilySchema,
) -> Result<DiffOutcome, RowProblem> {
    let mut diff = FieldDiff::new();
    let mut locked = Vec::new();

    for spec in schema.fields {
        let Some(raw) = record.get(spec.name) else {
            continue;
        };
        let incoming = parse_field(spec, raw)?;
        let current = existing.field(spec.name);

        if current == Some(&incoming) {
            continue;
        }

        if schema.is_user_owned(spec.name) {
            let untouched = current.map_or(true, FieldValue::is_default);
            if !untouched {
                locked.push(spec.name.to_string());
                continue;
            }
        }

        if Some(spec.name) == schema.status_field
            && existing.text(spec.name) == COMPLETED_STATUS
            && incoming.as_text() != Some(COMPLETED_STATUS)
        {
            // Completed is terminal; the reverse direction is allowed.
            continue;
        }

        diff.insert(spec.name.to_string(), incoming);
    }

    Ok(DiffOutcome { diff, locked })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sitedesk_model::Family;

    fn schema() -> &'static FamilySchema {
        FamilySchema::of(Family::Job)
    }

    fn existing(fields: &[(&str, FieldValue)]) -> Entity {
        Entity {
            id: "J1".to_string(),
            family: Family::Job,
            external_id: Some("DGE-100".to_string()),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            updated_at: Utc::now(),
        }
    }

    fn record(pairs: &[(&str, &str)]) -> IncomingRecord {
        IncomingRecord {
            row: 1,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn import_owned_fields_update() {
        let entity = existing(&[
            ("name", FieldValue::Text("Oak St Tower".into())),
            ("value", FieldValue::Amount(500_000_000)),
            ("status", FieldValue::Text("planning".into())),
        ]);
        let rec = record(&[
            ("name", "Oak St Tower"),
            ("value", "5,250,000"),
            ("status", "active"),
        ]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert_eq!(out.diff.len(), 2);
        assert_eq!(out.diff["value"], FieldValue::Amount(525_000_000));
        assert_eq!(out.diff["status"], FieldValue::Text("active".into()));
        assert!(out.locked.is_empty());
    }

    #[test]
    fn formatting_differences_are_not_changes() {
        let entity = existing(&[("value", FieldValue::Amount(100_000_000))]);
        let rec = record(&[("value", "1,000,000.00")]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert!(out.diff.is_empty());
    }

    #[test]
    fn user_set_notes_never_overwritten() {
        let entity = existing(&[("notes", FieldValue::Text("called 3x".into()))]);
        let rec = record(&[("notes", "imported remark")]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert!(out.diff.is_empty());
        assert_eq!(out.locked, vec!["notes".to_string()]);
    }

    #[test]
    fn default_user_field_may_be_filled() {
        let entity = existing(&[("notes", FieldValue::Text(String::new()))]);
        let rec = record(&[("notes", "from sales log")]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert_eq!(out.diff["notes"], FieldValue::Text("from sales log".into()));
        assert!(out.locked.is_empty());
    }

    #[test]
    fn set_flag_is_locked() {
        let entity = existing(&[("favorite", FieldValue::Flag(true))]);
        let rec = record(&[("favorite", "no")]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert!(out.diff.is_empty());
        assert_eq!(out.locked, vec!["favorite".to_string()]);
    }

    #[test]
    fn completed_status_is_terminal() {
        let entity = existing(&[("status", FieldValue::Text(COMPLETED_STATUS.into()))]);
        let rec = record(&[("status", "active")]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert!(out.diff.is_empty());
        assert!(out.locked.is_empty());
    }

    #[test]
    fn status_may_move_into_completed() {
        let entity = existing(&[("status", FieldValue::Text("active".into()))]);
        let rec = record(&[("status", COMPLETED_STATUS)]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert_eq!(out.diff["status"], FieldValue::Text(COMPLETED_STATUS.into()));
    }

    #[test]
    fn blank_incoming_never_clears() {
        let entity = existing(&[("contractor", FieldValue::Text("Acme Builders".into()))]);
        let rec = record(&[("contractor", "  ")]);
        let out = diff_fields(&rec, &entity, schema()).unwrap();
        assert!(out.diff.is_empty());
    }

    #[test]
    fn unparseable_amount_is_a_row_problem() {
        let entity = existing(&[]);
        let rec = record(&[("value", "TBD")]);
        let err = diff_fields(&rec, &entity, schema()).unwrap_err();
        assert!(err.to_string().contains("'TBD'"));
    }

    #[test]
    fn draft_requires_name() {
        let rec = record(&[("address", "1 Main St")]);
        let err = build_draft(&rec, schema()).unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn draft_parses_known_fields_and_drops_unknown() {
        let rec = record(&[
            ("external_id", "DGE-100"),
            ("name", "Oak St Tower"),
            ("value", "5,000,000"),
            ("bid_date", "2026-03-01"),
            ("unmapped_extra", "ignored"),
        ]);
        let draft = build_draft(&rec, schema()).unwrap();
        assert_eq!(draft.external_id.as_deref(), Some("DGE-100"));
        assert_eq!(draft.fields["value"], FieldValue::Amount(500_000_000));
        assert!(draft.fields.contains_key("bid_date"));
        assert!(!draft.fields.contains_key("unmapped_extra"));
    }
}
