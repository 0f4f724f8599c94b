//! `sitedesk-store` — Entity persistence behind narrow traits.
//!
//! The import engine only sees [`EntityRead`] and [`EntityWrite`]. The
//! dashboard's real schema lives elsewhere; the adapters here are the
//! in-memory store used by tests and previews, and a SQLite file store.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{EntityRead, EntityStore, EntityWrite};
