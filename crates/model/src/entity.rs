use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::family::Family;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A typed field value on an entity.
///
/// Amounts are whole cents; formatting differences in the source
/// (`"1,000,000"` vs `"1000000.00"`) disappear at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Amount(i64),
    Date(NaiveDate),
    Flag(bool),
}

impl FieldValue {
    /// Whether this value is in its untouched default state.
    ///
    /// User-owned fields are locked the moment they leave this state:
    /// empty text and an unset flag are defaults, any amount or date is not.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Flag(b) => !b,
            Self::Amount(_) | Self::Date(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<i64> {
        match self {
            Self::Amount(cents) => Some(*cents),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Amount(cents) => {
                let sign = if *cents < 0 { "-" } else { "" };
                write!(f, "{sign}{}.{:02}", (cents / 100).abs(), (cents % 100).abs())
            }
            Self::Date(d) => write!(f, "{d}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Field-level changes to apply to one entity. Empty means "unchanged".
pub type FieldDiff = BTreeMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A persisted record of one entity family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub family: Family,
    /// Identifier minted by the upstream data provider, if any.
    pub external_id: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).and_then(FieldValue::as_text).unwrap_or("")
    }

    pub fn amount(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(FieldValue::as_amount)
    }
}

/// A new entity about to be inserted. The store mints the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDraft {
    pub family: Family,
    pub external_id: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl EntityDraft {
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).and_then(FieldValue::as_text).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_states() {
        assert!(FieldValue::Text(String::new()).is_default());
        assert!(FieldValue::Flag(false).is_default());
        assert!(!FieldValue::Text("called 3x".into()).is_default());
        assert!(!FieldValue::Flag(true).is_default());
        assert!(!FieldValue::Amount(0).is_default());
    }

    #[test]
    fn amount_display_in_dollars() {
        assert_eq!(FieldValue::Amount(525_000_000).to_string(), "5250000.00");
        assert_eq!(FieldValue::Amount(1050).to_string(), "10.50");
    }
}
