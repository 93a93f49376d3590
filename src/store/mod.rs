//! Ordered key-value facade.
//!
//! The engine depends on three primitives: point get, ascending range scan,
//! and an atomic batch of puts/deletes. Keys and values are strings; a
//! backend that cannot represent empty values says so and the engine
//! substitutes a single space on write, restoring it on read.

mod memory;
mod redb;

pub use self::memory::MemoryBackend;
pub use self::redb::RedbBackend;

use thiserror::Error;

/// One entry of an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Write {
    Put { key: String, value: String },
    Del { key: String },
}

impl Write {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Write::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Write::Del { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Write::Put { key, .. } => key,
            Write::Del { key } => key,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend rejects empty values")]
    EmptyValue,
    #[error("database error: {0}")]
    Database(#[from] ::redb::DatabaseError),
    #[error("transaction error: {0}")]
    Transaction(#[from] ::redb::TransactionError),
    #[error("table error: {0}")]
    Table(#[from] ::redb::TableError),
    #[error("storage error: {0}")]
    Storage(#[from] ::redb::StorageError),
    #[error("commit error: {0}")]
    Commit(#[from] ::redb::CommitError),
}

pub trait Backend: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Ascending scan over `[gte, lt)`, snapshot-consistent for one call.
    fn scan(&self, gte: &str, lt: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// All writes commit atomically or none do.
    fn batch(&mut self, writes: &[Write]) -> Result<(), StoreError>;

    fn forbids_empty_values(&self) -> bool {
        false
    }
}
