/// Core data types for the lake level service.
///
/// This module defines the shared domain model imported by all other modules:
/// the per-lake record produced by the extractor and the error types raised
/// at each stage of a sync run. It contains no I/O.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Public page listing the current levels of the lakes of the canton of Fribourg.
pub const DEFAULT_SOURCE_URL: &str = "https://www.groupe-e.ch/fr/univers-groupe-e/niveau-lacs";

/// Prefix under which every lake record is written in the store.
pub const CURRENT_PREFIX: &str = "current/";

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Current state of one lake, as read from the source page.
///
/// Field names match the layout consumers read from the store:
/// `name`, `max_level`, `date`, `today`, `yesterday`. `date` is the
/// later of the two header dates, at midnight UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub name: String,
    /// Maximum certified level in metres above sea level, `0` when unreadable.
    pub max_level: f64,
    pub date: DateTime<Utc>,
    pub today: f64,
    pub yesterday: f64,
}

/// Every lake extracted from one scrape, keyed by lake name.
///
/// Ordered so that writes and logs follow a stable sequence.
pub type Lakes = BTreeMap<String, LevelRecord>;

impl LevelRecord {
    /// Calendar day the `today` value belongs to.
    pub fn level_date(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Numeric fields that hold the `0` placeholder because the cell could
    /// not be read.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.max_level == 0.0 {
            missing.push("max_level");
        }
        if self.today == 0.0 {
            missing.push("today");
        }
        if self.yesterday == 0.0 {
            missing.push("yesterday");
        }
        missing
    }

    /// Store path of this record: `current/{name}`.
    pub fn store_path(&self) -> String {
        current_path(&self.name)
    }
}

/// Builds the store path for a lake. The name is used verbatim, an empty
/// name yields `current/`.
pub fn current_path(name: &str) -> String {
    format!("{}{}", CURRENT_PREFIX, name)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while obtaining the source page.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Non-2xx HTTP response from the source site.
    Http(u16),
    /// Connection, TLS or timeout failure.
    Transport(String),
    /// A saved page could not be read from disk.
    Io(String),
    /// The body could not be decoded as text.
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(code) => write!(f, "HTTP error: {}", code),
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::Io(msg) => write!(f, "I/O error: {}", msg),
            FetchError::Decode(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Errors raised while turning page content into level records.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// The content is not HTML-like enough to build a document from.
    ParseFailure(String),
    /// A header date cell is absent or not of the form `day.month.year`.
    HeaderParseFailure { column: usize, text: Option<String> },
    /// The configured table layout cannot be used (bad selector, overlapping columns).
    Layout(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::ParseFailure(msg) => write!(f, "Parse error: {}", msg),
            ExtractError::HeaderParseFailure { column, text: Some(text) } => {
                write!(f, "Header date in column {} is not a date: {:?}", column, text)
            }
            ExtractError::HeaderParseFailure { column, text: None } => {
                write!(f, "Header date column {} not found", column)
            }
            ExtractError::Layout(msg) => write!(f, "Layout error: {}", msg),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Errors raised by a store backend while writing a record.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Non-2xx HTTP response from a REST store.
    Http(u16),
    /// Connection, TLS or timeout failure.
    Transport(String),
    /// The database rejected the statement or the connection.
    Database(String),
    /// The record could not be encoded for the store.
    Serialize(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Http(code) => write!(f, "HTTP error: {}", code),
            StoreError::Transport(msg) => write!(f, "Transport error: {}", msg),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Serialize(msg) => write!(f, "Serialize error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Terminal failure of a sync run. No stage is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    Fetch(FetchError),
    Extract(ExtractError),
    Store { path: String, source: StoreError },
}

impl SyncError {
    /// Short name of the stage that failed, used in log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            SyncError::Fetch(_) => "fetch",
            SyncError::Extract(_) => "extract",
            SyncError::Store { .. } => "store",
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Fetch(e) => write!(f, "Error fetching URL: {}", e),
            SyncError::Extract(e) => write!(f, "Error scraping data: {}", e),
            SyncError::Store { path, source } => {
                write!(f, "Error writing {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Fetch(e) => Some(e),
            SyncError::Extract(e) => Some(e),
            SyncError::Store { source, .. } => Some(source),
        }
    }
}

impl From<FetchError> for SyncError {
    fn from(e: FetchError) -> Self {
        SyncError::Fetch(e)
    }
}

impl From<ExtractError> for SyncError {
    fn from(e: ExtractError) -> Self {
        SyncError::Extract(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(name: &str, max_level: f64, today: f64, yesterday: f64) -> LevelRecord {
        LevelRecord {
            name: name.to_string(),
            max_level,
            date: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            today,
            yesterday,
        }
    }

    #[test]
    fn test_store_path_uses_name_verbatim() {
        let lake = record("Lac de la Gruyère", 680.5, 675.2, 674.8);
        assert_eq!(lake.store_path(), "current/Lac de la Gruyère");
        assert_eq!(current_path(""), "current/");
    }

    #[test]
    fn test_missing_fields_lists_zero_placeholders() {
        assert!(record("Lac de Schiffenen", 532.0, 531.2, 531.1).missing_fields().is_empty());
        assert_eq!(
            record("Lac de Montsalvens", 0.0, 800.1, 0.0).missing_fields(),
            vec!["max_level", "yesterday"]
        );
    }

    #[test]
    fn test_record_serializes_with_store_field_names() {
        let json = serde_json::to_value(record("Lac de Pérolles", 560.0, 558.9, 558.7))
            .expect("record should serialize");
        assert_eq!(json["name"], "Lac de Pérolles");
        assert_eq!(json["max_level"], 560.0);
        assert_eq!(json["date"], "2024-01-02T00:00:00Z");
        assert_eq!(json["today"], 558.9);
        assert_eq!(json["yesterday"], 558.7);
    }

    #[test]
    fn test_level_date_is_calendar_day() {
        let lake = record("Lac de la Gruyère", 680.5, 675.2, 674.8);
        assert_eq!(lake.level_date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_sync_error_stage_and_message() {
        let err = SyncError::Store {
            path: "current/Lac de la Gruyère".to_string(),
            source: StoreError::Http(401),
        };
        assert_eq!(err.stage(), "store");
        assert_eq!(err.to_string(), "Error writing current/Lac de la Gruyère: HTTP error: 401");

        let err: SyncError = FetchError::Http(503).into();
        assert_eq!(err.stage(), "fetch");
    }
}
