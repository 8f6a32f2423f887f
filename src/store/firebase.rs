/// Firebase Realtime Database store
///
/// Writes each record with a REST `PUT {database}/{path}.json`, which
/// replaces the whole node at that path. Consumers (small web pages, IoT
/// displays) read `current/` directly from the database.
///
/// REST reference: https://firebase.google.com/docs/reference/rest/database

use std::time::Duration;

use reqwest::Url;

use crate::model::{LevelRecord, StoreError};
use crate::store::LevelStore;

pub const DEFAULT_DATABASE_URL: &str = "https://niveau-lacs.firebaseio.com/";

pub struct FirebaseStore {
    client: reqwest::blocking::Client,
    base: Url,
}

impl FirebaseStore {
    pub fn new(database_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base = Url::parse(database_url)
            .map_err(|e| StoreError::Transport(format!("invalid database URL {}: {}", database_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Transport(format!("invalid database URL {}", database_url)));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// REST endpoint for a store path, with every segment percent-encoded.
    ///
    /// `current/Lac de la Gruyère` becomes
    /// `{base}/current/Lac%20de%20la%20Gruy%C3%A8re.json`.
    pub fn record_url(&self, path: &str) -> Result<Url, StoreError> {
        let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if let Some(last) = segments.last_mut() {
            last.push_str(".json");
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("invalid database URL {}", self.base)))?
            .pop_if_empty()
            .extend(segments.iter());
        Ok(url)
    }
}

impl LevelStore for FirebaseStore {
    fn set_record(&mut self, path: &str, record: &LevelRecord) -> Result<(), StoreError> {
        let url = self.record_url(path)?;
        let body = serde_json::to_vec(record).map_err(|e| StoreError::Serialize(e.to_string()))?;

        let response = self
            .client
            .put(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Http(response.status().as_u16()));
        }
        Ok(())
    }
}
