use sitedesk_model::{Entity, EntityDraft, Family, FieldDiff};

use crate::error::StoreError;

/// Read side of the import engine's store boundary.
///
/// Natural-key and fuzzy lookups take values already normalized by the
/// caller (lowercased, whitespace-collapsed); implementations normalize
/// their stored side the same way before comparing.
pub trait EntityRead {
    /// Entities of `family` carrying exactly this upstream identifier.
    fn find_by_external_id(&self, family: Family, external_id: &str)
        -> Result<Vec<Entity>, StoreError>;

    /// Entities of `family` whose normalized composite key parts equal
    /// `key_a` / `key_b` (name + address, or name + company).
    fn find_by_natural_key(&self, family: Family, key_a: &str, key_b: &str)
        -> Result<Vec<Entity>, StoreError>;

    /// Entities of `family` with the same normalized name and a value
    /// within `tolerance` (relative, e.g. 0.02) of `value_cents`.
    fn find_by_fuzzy_value(
        &self,
        family: Family,
        name: &str,
        value_cents: i64,
        tolerance: f64,
    ) -> Result<Vec<Entity>, StoreError>;

    /// Every entity of `family`, in insertion order.
    fn list(&self, family: Family) -> Result<Vec<Entity>, StoreError>;
}

/// Write side of the store boundary. Only the commit phase touches this.
pub trait EntityWrite {
    /// Persist a new entity, returning the minted id.
    fn insert(&mut self, draft: EntityDraft) -> Result<String, StoreError>;

    /// Apply a field diff to an existing entity.
    fn apply_diff(&mut self, id: &str, diff: &FieldDiff) -> Result<(), StoreError>;
}

pub trait EntityStore: EntityRead + EntityWrite {}

impl<T: EntityRead + EntityWrite> EntityStore for T {}
