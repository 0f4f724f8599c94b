//! `sitedesk-model` — Shared entity types for the import machinery.
//!
//! Pure data crate: entity families, field values, per-family schemas,
//! and the normalization helpers used for matching and comparison.

pub mod entity;
pub mod family;
pub mod normalize;

pub use entity::{Entity, EntityDraft, FieldDiff, FieldValue};
pub use family::{Family, FamilySchema, FieldKind, FieldOwner, FieldSpec, COMPLETED_STATUS};
pub use normalize::{amounts_within, composite_key, norm_text, parse_amount, parse_date, parse_flag};
