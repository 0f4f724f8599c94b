use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// Cannot open or initialize the backing store.
    Open(String),
    /// Query or statement execution failed.
    Query(String),
    /// Stored row cannot be decoded back into an entity.
    Decode(String),
    /// No entity with the given id.
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "cannot open store: {msg}"),
            Self::Query(msg) => write!(f, "store query failed: {msg}"),
            Self::Decode(msg) => write!(f, "corrupt entity row: {msg}"),
            Self::NotFound(id) => write!(f, "no entity with id '{id}'"),
        }
    }
}

impl std::error::Error for StoreError {}
