/// One sync run: fetch the page, extract the lakes, write each one.
///
/// Every run starts from scratch and stops at the first failure. Records
/// already written when a later write fails stay written.

use std::time::Duration;

use chrono::NaiveDate;

use crate::config::{Config, StoreConfig};
use crate::extract::{self, TableLocator};
use crate::ingest::{Fetcher, HttpFetcher};
use crate::logging::{self, Component};
use crate::model::{ExtractError, LevelRecord, StoreError, SyncError};
use crate::store::{self, LevelStore};

/// What a successful run wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSummary {
    /// Level date shared by every record, `None` when the table was empty.
    pub date: Option<NaiveDate>,
    /// Names of the lakes written, in write order.
    pub lakes: Vec<String>,
    /// Lakes whose record holds at least one `0` placeholder.
    pub degraded: Vec<String>,
}

pub struct Synchronizer<F, S> {
    fetcher: F,
    store: S,
    source_url: String,
    locator: TableLocator,
}

impl<F: Fetcher, S: LevelStore> Synchronizer<F, S> {
    pub fn new(fetcher: F, store: S, source_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            store,
            source_url: source_url.into(),
            locator: TableLocator::default(),
        }
    }

    /// Replaces the default table layout.
    pub fn with_locator(mut self, locator: TableLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn sync(&mut self) -> Result<SyncSummary, SyncError> {
        let html = self.fetcher.fetch(&self.source_url)?;
        logging::debug(
            Component::Source,
            None,
            &format!("Fetched {} ({} bytes)", self.source_url, html.len()),
        );

        let lakes = extract::extract_with(&self.locator, &html)?;
        let date = lakes.values().next().map(|lake| lake.level_date());
        logging::info(
            Component::Extract,
            None,
            &format!(
                "Lakes: {} found{}",
                lakes.len(),
                date.map(|d| format!(", level date {}", d)).unwrap_or_default()
            ),
        );

        let mut summary = SyncSummary {
            date,
            lakes: Vec::with_capacity(lakes.len()),
            degraded: Vec::new(),
        };

        for (name, lake) in &lakes {
            let missing = lake.missing_fields();
            if !missing.is_empty() {
                logging::warn(
                    Component::Extract,
                    Some(name.as_str()),
                    &format!("unreadable values stored as 0: {}", missing.join(", ")),
                );
                summary.degraded.push(name.clone());
            }

            let path = lake.store_path();
            self.store
                .set_record(&path, lake)
                .map_err(|source| SyncError::Store { path: path.clone(), source })?;
            logging::debug(
                Component::Store,
                Some(name.as_str()),
                &format!("today {} / yesterday {} / max {}", lake.today, lake.yesterday, lake.max_level),
            );
            summary.lakes.push(name.clone());
        }

        logging::log_sync_summary(summary.lakes.len(), summary.degraded.len());
        Ok(summary)
    }
}

/// Builds the configured collaborators and performs one run.
///
/// Failures are logged here with their classification before being
/// returned.
pub fn run_once(config: &Config) -> Result<SyncSummary, SyncError> {
    let result = build_and_sync(config);
    if let Err(ref e) = result {
        logging::log_sync_failure(e);
    }
    result
}

fn build_and_sync(config: &Config) -> Result<SyncSummary, SyncError> {
    let fetcher = HttpFetcher::new(
        Duration::from_secs(config.source.timeout_secs),
        config.source.user_agent.as_deref(),
    )?;
    run_with_fetcher(config, fetcher)
}

/// Performs one run against the configured store with the given fetcher.
pub fn run_with_fetcher<F: Fetcher>(config: &Config, fetcher: F) -> Result<SyncSummary, SyncError> {
    let locator = config
        .locator()
        .map_err(|e| SyncError::Extract(ExtractError::Layout(e.to_string())))?;

    Synchronizer::new(fetcher, ConfiguredStore::new(&config.store), config.source.url.clone())
        .with_locator(locator)
        .sync()
}

/// Store backend opened on the first write, so that a failed fetch or
/// extraction never connects to the database.
struct ConfiguredStore<'a> {
    config: &'a StoreConfig,
    store: Option<Box<dyn LevelStore>>,
}

impl<'a> ConfiguredStore<'a> {
    fn new(config: &'a StoreConfig) -> Self {
        Self { config, store: None }
    }
}

impl LevelStore for ConfiguredStore<'_> {
    fn set_record(&mut self, path: &str, record: &LevelRecord) -> Result<(), StoreError> {
        if self.store.is_none() {
            self.store = Some(store::open_store(self.config)?);
        }
        match self.store.as_mut() {
            Some(store) => store.set_record(path, record),
            None => Err(StoreError::Transport("store not opened".to_string())),
        }
    }
}
