//! Durable backend over redb.
//!
//! One table of string keys and values; a batch is one write transaction.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use super::{Backend, StoreError, Write};

const RECORDS: TableDefinition<&str, &str> = TableDefinition::new("records");

pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        txn.open_table(RECORDS)?;
        txn.commit()?;
        Ok(Self { db })
    }
}

impl Backend for RedbBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RECORDS)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_string()))
    }

    fn scan(&self, gte: &str, lt: &str) -> Result<Vec<(String, String)>, StoreError> {
        if gte >= lt {
            return Ok(Vec::new());
        }
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RECORDS)?;
        let mut rows = Vec::new();
        for entry in table.range(gte..lt)? {
            let (key, value) = entry?;
            rows.push((key.value().to_string(), value.value().to_string()));
        }
        Ok(rows)
    }

    fn batch(&mut self, writes: &[Write]) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            for write in writes {
                match write {
                    Write::Put { key, value } => {
                        table.insert(key.as_str(), value.as_str())?;
                    }
                    Write::Del { key } => {
                        table.remove(key.as_str())?;
                    }
                }
            }
        }
        txn.commit()?;
        Ok(())
    }
}
