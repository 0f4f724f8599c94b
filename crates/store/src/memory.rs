use chrono::Utc;
use sitedesk_model::{
    amounts_within, norm_text, Entity, EntityDraft, Family, FamilySchema, FieldDiff,
};

use crate::error::StoreError;
use crate::traits::{EntityRead, EntityWrite};

/// Scan-based store for tests and previews. Entities live in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: Vec<Entity>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

impl EntityRead for MemoryStore {
    fn find_by_external_id(
        &self,
        family: Family,
        external_id: &str,
    ) -> Result<Vec<Entity>, StoreError> {
        Ok(self
            .entities
            .iter()
            .filter(|e| e.family == family && e.external_id.as_deref() == Some(external_id))
            .cloned()
            .collect())
    }

    fn find_by_natural_key(
        &self,
        family: Family,
        key_a: &str,
        key_b: &str,
    ) -> Result<Vec<Entity>, StoreError> {
        let schema = FamilySchema::of(family);
        let [field_a, field_b] = schema.key_fields;
        Ok(self
            .entities
            .iter()
            .filter(|e| {
                e.family == family
                    && norm_text(e.text(field_a)) == key_a
                    && norm_text(e.text(field_b)) == key_b
            })
            .cloned()
            .collect())
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
        let name_field = schema.key_fields[0];
        Ok(self
            .entities
            .iter()
            .filter(|e| {
                e.family == family
                    && norm_text(e.text(name_field)) == name
                    && e.amount(value_field)
                        .is_some_and(|v| amounts_within(v, value_cents, tolerance))
            })
            .cloned()
            .collect())
    }

    fn list(&self, family: Family) -> Result<Vec<Entity>, StoreError> {
        Ok(self
            .entities
            .iter()
            .filter(|e| e.family == family)
            .cloned()
            .collect())
    }
}

impl EntityWrite for MemoryStore {
    fn insert(&mut self, draft: EntityDraft) -> Result<String, StoreError> {
        self.next_id += 1;
        let id = format!("{}-{}", draft.family, self.next_id);
        self.entities.push(Entity {
            id: id.clone(),
            family: draft.family,
            external_id: draft.external_id,
            fields: draft.fields,
            updated_at: Utc::now(),
        });
        Ok(id)
    }

    fn apply_diff(&mut self, id: &str, diff: &FieldDiff) -> Result<(), StoreError> {
        let entity = self
            .entities
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        for (field, value) in diff {
            entity.fields.insert(field.clone(), value.clone());
        }
        entity.updated_at = Utc::now();
        Ok(())
    }
}
