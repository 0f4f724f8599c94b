use std::fmt;

use sitedesk_store::StoreError;

/// Errors that abort a run before any row is processed. Everything that can
/// go wrong per row is captured in the report instead.
#[derive(Debug)]
pub enum ImportError {
    /// TOML parse / deserialization error in an import profile.
    ProfileParse(String),
    /// Profile references fields the target family does not have.
    ProfileValidation(String),
    /// The run was asked for an entity family that does not exist.
    UnknownFamily(String),
    /// A mapped source column is missing from the CSV header.
    MissingColumn { column: String, field: String },
    /// CSV read error.
    Csv(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProfileParse(msg) => write!(f, "profile parse error: {msg}"),
            Self::ProfileValidation(msg) => write!(f, "profile validation error: {msg}"),
            Self::UnknownFamily(msg) => write!(f, "{msg}"),
            Self::MissingColumn { column, field } => {
                write!(f, "source column '{column}' (mapped to '{field}') not found in CSV header")
            }
            Self::Csv(msg) => write!(f, "CSV read error: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {}

/// A per-row failure: recorded in the report, never aborts the run.
#[derive(Debug)]
pub enum RowProblem {
    /// The record is missing a field the family requires.
    MissingField(String),
    /// A field value cannot be parsed under its declared kind.
    BadField { field: String, value: String, expected: &'static str },
    /// A store lookup failed while matching this row.
    Lookup(StoreError),
}

impl fmt::Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field '{field}'"),
            Self::BadField { field, value, expected } => {
                write!(f, "field '{field}': cannot parse '{value}' as {expected}")
            }
            Self::Lookup(err) => write!(f, "store lookup failed: {err}"),
        }
    }
}

impl From<StoreError> for RowProblem {
    fn from(err: StoreError) -> Self {
        Self::Lookup(err)
    }
}
