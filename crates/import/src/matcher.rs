use sitedesk_model::{norm_text, parse_amount, FamilySchema};
use sitedesk_store::{EntityRead, StoreError};

use crate::model::{IncomingRecord, MatchCandidate, MatchStrategy, MatchTier};

/// Relative tolerance for the fuzzy value strategy (±2%).
pub const FUZZY_VALUE_TOLERANCE: f64 = 0.02;

/// Find existing entities that may be the same thing as `record`.
///
/// Strategies run in descending confidence order and short-circuit: a hit at
/// a higher tier suppresses the lower tiers, but everything found at the
/// winning tier is returned together so the classifier can see ambiguity.
///
/// 1. External-ID, verbatim → `Exact`
/// 2. Composite natural key, normalized → `Strong`
/// 3. Same name + value within tolerance + no conflicting address → `Weak`
pub fn find_candidates<S: EntityRead + ?Sized>(
    record: &IncomingRecord,
    store: &S,
    schema: &FamilySchema,
) -> Result<Vec<MatchCandidate>, StoreError> {
    if let Some(external_id) = record.external_id() {
        let hits = store.find_by_external_id(schema.family, external_id)?;
        if !hits.is_empty() {
            return Ok(candidates(hits, MatchStrategy::ExternalId, MatchTier::Exact));
        }
    }

    let [key_field_a, key_field_b] = schema.key_fields;
    if let (Some(a), Some(b)) = (record.get(key_field_a), record.get(key_field_b)) {
        let hits = store.find_by_natural_key(schema.family, &norm_text(a), &norm_text(b))?;
        if !hits.is_empty() {
            return Ok(candidates(hits, MatchStrategy::NaturalKey, MatchTier::Strong));
        }
    }

    if let (Some(value_field), Some(name)) = (schema.value_field, record.get(key_field_a)) {
        if let Some(value_cents) = record.get(value_field).and_then(parse_amount) {
            let hits = store.find_by_fuzzy_value(
                schema.family,
                &norm_text(name),
                value_cents,
                FUZZY_VALUE_TOLERANCE,
            )?;
            // A candidate with a different, non-empty second key part is a
            // different site, not a likely duplicate.
            let incoming_b = record.get(key_field_b).map(norm_text);
            let hits: Vec<_> = hits
                .into_iter()
                .filter(|e| match &incoming_b {
                    None => true,
                    Some(b) => {
                        let existing_b = norm_text(e.text(key_field_b));
                        existing_b.is_empty() || existing_b == *b
                    }
                })
                .collect();
            if !hits.is_empty() {
                return Ok(candidates(hits, MatchStrategy::FuzzyValue, MatchTier::Weak));
            }
        }
    }

    Ok(Vec::new())
}

fn candidates(
    hits: Vec<sitedesk_model::Entity>,
    strategy: MatchStrategy,
    tier: MatchTier,
) -> Vec<MatchCandidate> {
    hits.into_iter()
        .map(|entity| MatchCandidate { entity, strategy, tier })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitedesk_model::{Family, FieldValue};
    use sitedesk_store::{EntityWrite, MemoryStore};
    use std::collections::BTreeMap;

    fn schema() -> &'static FamilySchema {
        FamilySchema::of(Family::Job)
    }

    fn seed_job(
        store: &mut MemoryStore,
        name: &str,
        address: &str,
        external_id: Option<&str>,
        value_cents: i64,
    ) -> String {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldValue::Text(name.into()));
        fields.insert("address".to_string(), FieldValue::Text(address.into()));
        fields.insert("value".to_string(), FieldValue::Amount(value_cents));
        store
            .insert(sitedesk_model::EntityDraft {
                family: Family::Job,
                external_id: external_id.map(String::from),
                fields,
            })
            .unwrap()
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
    fn external_id_wins_over_natural_key() {
        let mut store = MemoryStore::new();
        let by_ext = seed_job(&mut store, "Oak St Tower", "12 Oak St", Some("DGE-100"), 500_000_000);
        // Same natural key as the incoming record, no external id.
        seed_job(&mut store, "Riverside Mall", "8 River Rd", None, 100_000_000);

        let rec = record(&[
            ("external_id", "DGE-100"),
            ("name", "Riverside Mall"),
            ("address", "8 River Rd"),
        ]);
        let found = find_candidates(&rec, &store, schema()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, MatchTier::Exact);
        assert_eq!(found[0].strategy, MatchStrategy::ExternalId);
        assert_eq!(found[0].entity.id, by_ext);
    }

    #[test]
    fn natural_key_match_is_normalized() {
        let mut store = MemoryStore::new();
        seed_job(&mut store, "Oak St  Tower", "12 OAK ST", None, 500_000_000);

        let rec = record(&[("name", "OAK ST TOWER"), ("address", "12 oak st ")]);
        let found = find_candidates(&rec, &store, schema()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, MatchTier::Strong);
        assert_eq!(found[0].strategy, MatchStrategy::NaturalKey);
    }

    #[test]
    fn unmatched_external_id_falls_through_to_natural_key() {
        let mut store = MemoryStore::new();
        seed_job(&mut store, "Oak St Tower", "12 Oak St", None, 500_000_000);

        let rec = record(&[
            ("external_id", "DGE-999"),
            ("name", "Oak St Tower"),
            ("address", "12 Oak St"),
        ]);
        let found = find_candidates(&rec, &store, schema()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, MatchTier::Strong);
    }

    #[test]
    fn fuzzy_value_within_two_percent() {
        let mut store = MemoryStore::new();
        seed_job(&mut store, "Oak St Tower", "12 Oak St", None, 500_000_000);

        // Different address would normally miss the natural key; value is
        // within 2% and the addresses agree, so it surfaces as Weak.
        let rec = record(&[("name", "Oak St Tower"), ("value", "5,050,000")]);
        let found = find_candidates(&rec, &store, schema()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, MatchTier::Weak);
        assert_eq!(found[0].strategy, MatchStrategy::FuzzyValue);
    }

    #[test]
    fn fuzzy_rejects_conflicting_address() {
        let mut store = MemoryStore::new();
        seed_job(&mut store, "Oak St Tower", "12 Oak St", None, 500_000_000);

        let rec = record(&[
            ("name", "Oak St Tower"),
            ("address", "99 Elm Ave"),
            ("value", "5,050,000"),
        ]);
        let found = find_candidates(&rec, &store, schema()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn fuzzy_outside_tolerance_is_no_match() {
        let mut store = MemoryStore::new();
        seed_job(&mut store, "Oak St Tower", "12 Oak St", None, 500_000_000);

        let rec = record(&[("name", "Oak St Tower"), ("value", "6,000,000")]);
        let found = find_candidates(&rec, &store, schema()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn same_tier_hits_returned_together() {
        let mut store = MemoryStore::new();
        // Store-side duplication: two entities with the same external id.
        seed_job(&mut store, "Oak St Tower", "12 Oak St", Some("DGE-100"), 500_000_000);
        seed_job(&mut store, "Oak Street Tower", "12 Oak St", Some("DGE-100"), 500_000_000);

        let rec = record(&[("external_id", "DGE-100"), ("name", "Oak St Tower")]);
        let found = find_candidates(&rec, &store, schema()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.tier == MatchTier::Exact));
    }

    #[test]
    fn no_match_is_empty() {
        let store = MemoryStore::new();
        let rec = record(&[("name", "Brand New Site"), ("address", "1 New Way")]);
        assert!(find_candidates(&rec, &store, schema()).unwrap().is_empty());
    }
}
