/// In-process store. Holds records for the lifetime of the value only.

use std::collections::BTreeMap;

use crate::model::{LevelRecord, StoreError};
use crate::store::LevelStore;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<String, LevelRecord>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&LevelRecord> {
        self.records.get(path)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of `set_record` calls, overwrites included.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl LevelStore for MemoryStore {
    fn set_record(&mut self, path: &str, record: &LevelRecord) -> Result<(), StoreError> {
        self.records.insert(path.to_string(), record.clone());
        self.writes += 1;
        Ok(())
    }
}
