/// Persistence of the latest lake levels.
///
/// A store is a key-value database that accepts one record per path and
/// overwrites whatever was there. Records go to `current/{lake name}`.
///
/// Submodules:
/// - `firebase`: Firebase Realtime Database over its REST API.
/// - `postgres`: `lake_levels.current_levels` table, one row per path.
/// - `memory`: in-process map, for tests and dry runs.

pub mod firebase;
pub mod memory;
pub mod postgres;

use std::time::Duration;

use crate::config::{StoreConfig, StoreKind};
use crate::model::{LevelRecord, StoreError};

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use self::postgres::PostgresStore;

/// Capability to upsert a level record at a path.
pub trait LevelStore {
    fn set_record(&mut self, path: &str, record: &LevelRecord) -> Result<(), StoreError>;
}

impl<S: LevelStore + ?Sized> LevelStore for Box<S> {
    fn set_record(&mut self, path: &str, record: &LevelRecord) -> Result<(), StoreError> {
        (**self).set_record(path, record)
    }
}

impl<S: LevelStore + ?Sized> LevelStore for &mut S {
    fn set_record(&mut self, path: &str, record: &LevelRecord) -> Result<(), StoreError> {
        (**self).set_record(path, record)
    }
}

/// Opens the backend selected in the configuration.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn LevelStore>, StoreError> {
    match config.kind {
        StoreKind::Firebase => {
            let url = config
                .firebase_url
                .as_deref()
                .ok_or_else(|| StoreError::Transport("firebase_url is not configured".to_string()))?;
            let store = FirebaseStore::new(url, Duration::from_secs(config.timeout_secs))?;
            Ok(Box::new(store))
        }
        StoreKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| StoreError::Database("DATABASE_URL is not configured".to_string()))?;
            Ok(Box::new(PostgresStore::connect(url)?))
        }
        StoreKind::Memory => Ok(Box::new(MemoryStore::new())),
    }
}
