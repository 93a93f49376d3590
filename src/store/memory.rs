//! In-memory backend for unit and scenario tests.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::{Backend, StoreError, Write};

#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    map: BTreeMap<String, String>,
    forbid_empty: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a store that cannot hold empty values, so the engine's
    /// substitution path gets exercised.
    pub fn refusing_empty_values() -> Self {
        Self {
            map: BTreeMap::new(),
            forbid_empty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.get(key).cloned())
    }

    fn scan(&self, gte: &str, lt: &str) -> Result<Vec<(String, String)>, StoreError> {
        if gte >= lt {
            return Ok(Vec::new());
        }
        Ok(self
            .map
            .range::<str, _>((Bound::Included(gte), Bound::Excluded(lt)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn batch(&mut self, writes: &[Write]) -> Result<(), StoreError> {
        if self.forbid_empty {
            let rejects = writes
                .iter()
                .any(|w| matches!(w, Write::Put { value, .. } if value.is_empty()));
            if rejects {
                return Err(StoreError::EmptyValue);
            }
        }
        for write in writes {
            match write {
                Write::Put { key, value } => {
                    self.map.insert(key.clone(), value.clone());
                }
                Write::Del { key } => {
                    self.map.remove(key);
                }
            }
        }
        Ok(())
    }

    fn forbids_empty_values(&self) -> bool {
        self.forbid_empty
    }
}
