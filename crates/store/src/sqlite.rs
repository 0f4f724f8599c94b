use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sitedesk_model::{
    amounts_within, norm_text, Entity, EntityDraft, Family, FamilySchema, FieldDiff, FieldValue,
};
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::{EntityRead, EntityWrite};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entities (
    id          TEXT PRIMARY KEY,
    family      TEXT NOT NULL,
    external_id TEXT,
    key_a       TEXT NOT NULL,
    key_b       TEXT NOT NULL,
    value_cents INTEGER,
    fields      TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_entities_external ON entities(family, external_id);
CREATE INDEX IF NOT EXISTS idx_entities_key ON entities(family, key_a, key_b);
";

/// SQLite-backed entity store. One row per entity; the field map is stored
/// as a JSON column, with normalized key columns maintained for lookups.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { conn })
    }
}

/// Normalized key columns + fuzzy value column for one field map.
fn index_columns(
    family: Family,
    fields: &BTreeMap<String, FieldValue>,
) -> (String, String, Option<i64>) {
    let schema = FamilySchema::of(family);
    let text_of = |name: &str| -> String {
        fields
            .get(name)
            .and_then(FieldValue::as_text)
            .map(norm_text)
            .unwrap_or_default()
    };
    let key_a = text_of(schema.key_fields[0]);
    let key_b = text_of(schema.key_fields[1]);
    let value_cents = schema
        .value_field
        .and_then(|f| fields.get(f))
        .and_then(FieldValue::as_amount);
    (key_a, key_b, value_cents)
}

fn row_to_entity(row: &Row<'_>) -> Result<Entity, StoreError> {
    let family_str: String = row.get(1).map_err(|e| StoreError::Decode(e.to_string()))?;
    let family: Family = family_str
        .parse()
        .map_err(|e: String| StoreError::Decode(e))?;
    let fields_json: String = row.get(3).map_err(|e| StoreError::Decode(e.to_string()))?;
    let fields: BTreeMap<String, FieldValue> =
        serde_json::from_str(&fields_json).map_err(|e| StoreError::Decode(e.to_string()))?;
    let updated_at_str: String = row.get(4).map_err(|e| StoreError::Decode(e.to_string()))?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map_err(|e| StoreError::Decode(e.to_string()))?
        .with_timezone(&Utc);

    Ok(Entity {
        id: row.get(0).map_err(|e| StoreError::Decode(e.to_string()))?,
        family,
        external_id: row.get(2).map_err(|e| StoreError::Decode(e.to_string()))?,
        fields,
        updated_at,
    })
}

const ENTITY_COLUMNS: &str = "id, family, external_id, fields, updated_at";

impl SqliteStore {
    fn query_entities(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Entity>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let mut rows = stmt
            .query(params)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next().map_err(|e| StoreError::Query(e.to_string()))? {
            entities.push(row_to_entity(row)?);
        }
        Ok(entities)
    }
}

impl EntityRead for SqliteStore {
    fn find_by_external_id(
        &self,
        family: Family,
        external_id: &str,
    ) -> Result<Vec<Entity>, StoreError> {
        self.query_entities(
            &format!(
                "SELECT {ENTITY_COLUMNS} FROM entities \
                 WHERE family = ?1 AND external_id = ?2 ORDER BY rowid"
            ),
            &[&family.to_string(), &external_id],
        )
    }

    fn find_by_natural_key(
        &self,
        family: Family,
        key_a: &str,
        key_b: &str,
    ) -> Result<Vec<Entity>, StoreError> {
        self.query_entities(
            &format!(
                "SELECT {ENTITY_COLUMNS} FROM entities \
                 WHERE family = ?1 AND key_a = ?2 AND key_b = ?3 ORDER BY rowid"
            ),
            &[&family.to_string(), &key_a, &key_b],
        )
    }

    fn find_by_fuzzy_value(
        &self,
        family: Family,
        name: &str,
        value_cents: i64,
        tolerance: f64,
    ) -> Result<Vec<Entity>, StoreError> {
        let schema = FamilySchema::of(family);
        let Some(value_field) = schema.value_field else {
            return Ok(Vec::new());
        };
        // Same normalized name via the index; relative tolerance applied here.
        let candidates = self.query_entities(
            &format!(
                "SELECT {ENTITY_COLUMNS} FROM entities \
                 WHERE family = ?1 AND key_a = ?2 AND value_cents IS NOT NULL ORDER BY rowid"
            ),
            &[&family.to_string(), &name],
        )?;
        Ok(candidates
            .into_iter()
            .filter(|e| {
                e.amount(value_field)
                    .is_some_and(|v| amounts_within(v, value_cents, tolerance))
            })
            .collect())
    }

    fn list(&self, family: Family) -> Result<Vec<Entity>, StoreError> {
        self.query_entities(
            &format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE family = ?1 ORDER BY rowid"),
            &[&family.to_string()],
        )
    }
}

impl EntityWrite for SqliteStore {
    fn insert(&mut self, draft: EntityDraft) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let (key_a, key_b, value_cents) = index_columns(draft.family, &draft.fields);
        let fields_json =
            serde_json::to_string(&draft.fields).map_err(|e| StoreError::Query(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO entities (id, family, external_id, key_a, key_b, value_cents, fields, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    draft.family.to_string(),
                    draft.external_id,
                    key_a,
                    key_b,
                    value_cents,
                    fields_json,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(id)
    }

    fn apply_diff(&mut self, id: &str, diff: &FieldDiff) -> Result<(), StoreError> {
        let existing: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT family, fields FROM entities WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let (family_str, fields_json) =
            existing.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let family: Family = family_str
            .parse()
            .map_err(|e: String| StoreError::Decode(e))?;
        let mut fields: BTreeMap<String, FieldValue> =
            serde_json::from_str(&fields_json).map_err(|e| StoreError::Decode(e.to_string()))?;

        for (field, value) in diff {
            fields.insert(field.clone(), value.clone());
        }

        let (key_a, key_b, value_cents) = index_columns(family, &fields);
        let fields_json =
            serde_json::to_string(&fields).map_err(|e| StoreError::Query(e.to_string()))?;

        self.conn
            .execute(
                "UPDATE entities SET key_a = ?2, key_b = ?3, value_cents = ?4, fields = ?5, updated_at = ?6 \
                 WHERE id = ?1",
                params![
                    id,
                    key_a,
                    key_b,
                    value_cents,
                    fields_json,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, address: &str, external_id: Option<&str>, cents: i64) -> EntityDraft {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldValue::Text(name.into()));
        fields.insert("address".to_string(), FieldValue::Text(address.into()));
        fields.insert("value".to_string(), FieldValue::Amount(cents));
        EntityDraft {
            family: Family::Job,
            external_id: external_id.map(String::from),
            fields,
        }
    }

    #[test]
    fn insert_and_find_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert(draft("Oak St Tower", "12 Oak St", Some("DGE-100"), 500_000_000))
            .unwrap();

        let by_ext = store.find_by_external_id(Family::Job, "DGE-100").unwrap();
        assert_eq!(by_ext.len(), 1);
        assert_eq!(by_ext[0].id, id);
        assert_eq!(by_ext[0].text("name"), "Oak St Tower");
        assert_eq!(by_ext[0].amount("value"), Some(500_000_000));

        let by_key = store
            .find_by_natural_key(Family::Job, "oak st tower", "12 oak st")
            .unwrap();
        assert_eq!(by_key.len(), 1);
    }

    #[test]
    fn fuzzy_lookup_applies_tolerance() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(draft("Oak St Tower", "12 Oak St", None, 500_000_000))
            .unwrap();

        assert_eq!(
            store
                .find_by_fuzzy_value(Family::Job, "oak st tower", 509_000_000, 0.02)
                .unwrap()
                .len(),
            1
        );
        assert!(store
            .find_by_fuzzy_value(Family::Job, "oak st tower", 600_000_000, 0.02)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn apply_diff_reindexes_keys() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert(draft("Oak St Tower", "12 Oak St", None, 500_000_000))
            .unwrap();

        let mut diff = FieldDiff::new();
        diff.insert("address".to_string(), FieldValue::Text("99 Elm Ave".into()));
        store.apply_diff(&id, &diff).unwrap();

        assert!(store
            .find_by_natural_key(Family::Job, "oak st tower", "12 oak st")
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .find_by_natural_key(Family::Job, "oak st tower", "99 elm ave")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn apply_diff_unknown_id() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store.apply_diff("missing", &FieldDiff::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.db");

        let mut store = SqliteStore::open(&path).unwrap();
        store
            .insert(draft("Main Depot", "1 Main St", None, 100_000))
            .unwrap();
        drop(store);

        let store = SqliteStore::open(&path).unwrap();
        let all = store.list(Family::Job).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text("name"), "Main Depot");
    }
}
