/// Structured logging for the lake level service
///
/// Every line is tagged with the component that produced it and, where it
/// applies, the lake it concerns. Supports console output and an optional
/// append-only log file for hosted deployments.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::{FetchError, StoreError, SyncError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// Fetching the source page
    Source,
    Extract,
    Store,
    /// Trigger endpoint
    Http,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Source => write!(f, "SOURCE"),
            Component::Extract => write!(f, "EXTRACT"),
            Component::Store => write!(f, "STORE"),
            Component::Http => write!(f, "HTTP"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Points at a broken deployment or a changed source page
    Unexpected,
    /// May be transient (network hiccup, remote outage)
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: &Component, lake: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let entry = format_entry(level, component, lake, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", entry),
            }
        } else {
            let lake_part = lake_part(lake);
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, lake_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, lake_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn lake_part(lake: Option<&str>) -> String {
    lake.map(|name| format!(" [{}]", name)).unwrap_or_default()
}

/// One log line: `2024-01-02 06:00:00 UTC INFO STORE [Lac de la Gruyère]: message`
fn format_entry(level: LogLevel, component: &Component, lake: Option<&str>, message: &str) -> String {
    format!(
        "{} {} {}{}: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        level,
        component,
        lake_part(lake),
        message
    )
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, lake: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, lake, message);
        }
    }
}

pub fn info(component: Component, lake: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, lake, message);
}

pub fn warn(component: Component, lake: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, lake, message);
}

pub fn error(component: Component, lake: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, lake, message);
}

pub fn debug(component: Component, lake: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, lake, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a sync failure by the stage and error that stopped it
pub fn classify_failure(err: &SyncError) -> FailureType {
    match err {
        // The source answered but not with the page; or the page changed shape
        SyncError::Fetch(FetchError::Http(_)) => FailureType::Unexpected,
        SyncError::Extract(_) => FailureType::Unexpected,
        SyncError::Store { source: StoreError::Http(_), .. } => FailureType::Unexpected,
        SyncError::Store { source: StoreError::Serialize(_), .. } => FailureType::Unexpected,
        SyncError::Fetch(_) | SyncError::Store { .. } => FailureType::Unknown,
    }
}

fn component_for(err: &SyncError) -> Component {
    match err {
        SyncError::Fetch(_) => Component::Source,
        SyncError::Extract(_) => Component::Extract,
        SyncError::Store { .. } => Component::Store,
    }
}

/// Log a terminal sync failure with automatic classification
pub fn log_sync_failure(err: &SyncError) {
    let failure_type = classify_failure(err);
    let message = format!("{} failed [{}]: {}", err.stage(), failure_type, err);

    let lake = match err {
        SyncError::Store { path, .. } => path.strip_prefix(crate::model::CURRENT_PREFIX),
        _ => None,
    };

    match failure_type {
        FailureType::Unexpected => error(component_for(err), lake, &message),
        FailureType::Unknown => warn(component_for(err), lake, &message),
    }
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one sync run
pub fn log_sync_summary(written: usize, degraded: usize) {
    let message = format!(
        "Sync complete: {} lakes written, {} with unreadable values",
        written,
        degraded
    );

    if written == 0 {
        warn(Component::System, None, &message);
    } else {
        info(Component::System, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractError;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_from_config_string() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" INFO ".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("error".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_failure_classification() {
        let layout_drift = SyncError::Extract(ExtractError::HeaderParseFailure {
            column: 2,
            text: Some("Niveau".to_string()),
        });
        assert_eq!(classify_failure(&layout_drift), FailureType::Unexpected);

        let timeout = SyncError::Fetch(FetchError::Transport("operation timed out".to_string()));
        assert_eq!(classify_failure(&timeout), FailureType::Unknown);

        let rejected = SyncError::Store {
            path: "current/Lac de la Gruyère".to_string(),
            source: StoreError::Http(401),
        };
        assert_eq!(classify_failure(&rejected), FailureType::Unexpected);
    }

    #[test]
    fn test_entry_carries_component_and_lake() {
        let entry = format_entry(LogLevel::Warning, &Component::Store, Some("Lac de Schiffenen"), "slow");
        assert!(entry.ends_with("WARN STORE [Lac de Schiffenen]: slow"), "got {}", entry);
        let entry = format_entry(LogLevel::Info, &Component::Http, None, "Done");
        assert!(entry.ends_with("INFO HTTP: Done"), "got {}", entry);
    }
}
