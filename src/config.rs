/// Service configuration
///
/// Read from a TOML file (`NIVEAU_LACS_CONFIG`, default `./niveau_lacs.toml`)
/// after loading `.env`. Every section is optional; a missing file means
/// built-in defaults. Hosting and secret values come from the environment:
///
/// - `PORT`: listen on `0.0.0.0:$PORT`
/// - `DATABASE_URL`: PostgreSQL store connection string
/// - `FIREBASE_DATABASE_URL`: Firebase Realtime Database URL
///
/// ```toml
/// [source]
/// url = "https://www.groupe-e.ch/fr/univers-groupe-e/niveau-lacs"
/// timeout_secs = 30
///
/// [store]
/// kind = "postgres"
///
/// [layout]
/// first_date_column = 2
/// second_date_column = 3
/// ```

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::extract::{TableLayout, TableLocator};
use crate::logging::LogLevel;
use crate::model::DEFAULT_SOURCE_URL;
use crate::store::firebase::DEFAULT_DATABASE_URL;

pub const CONFIG_PATH_VAR: &str = "NIVEAU_LACS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./niveau_lacs.toml";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Cannot read configuration: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid configuration file: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub layout: TableLayout,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Firebase,
    Postgres,
    /// Keeps records in process only; nothing survives the run.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub firebase_url: Option<String>,
    pub database_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Firebase,
            firebase_url: Some(DEFAULT_DATABASE_URL.to_string()),
            database_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> Result<LogLevel, ConfigError> {
        self.level.parse().map_err(ConfigError::Invalid)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// A level date older than this many days is reported as stale.
    pub max_age_days: i64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self { max_age_days: 2 }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Loads `.env`, the configuration file and the environment overrides,
    /// then validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file_or_default(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads the file if it exists, otherwise returns the defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.server.bind = format!("0.0.0.0:{}", port.trim());
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            self.store.database_url = Some(url);
        }
        if let Some(url) = lookup("FIREBASE_DATABASE_URL").filter(|u| !u.is_empty()) {
            self.store.firebase_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locator()?;
        self.logging.min_level()?;

        if self.source.url.trim().is_empty() {
            return Err(ConfigError::Invalid("source.url is empty".to_string()));
        }
        match self.store.kind {
            StoreKind::Firebase if self.store.firebase_url.is_none() => Err(ConfigError::Invalid(
                "store.kind = \"firebase\" needs store.firebase_url or FIREBASE_DATABASE_URL".to_string(),
            )),
            StoreKind::Postgres if self.store.database_url.is_none() => Err(ConfigError::Invalid(
                "store.kind = \"postgres\" needs store.database_url or DATABASE_URL".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Compiled table locator for `[layout]`.
    pub fn locator(&self) -> Result<TableLocator, ConfigError> {
        TableLocator::new(&self.layout).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_target_groupe_e_and_firebase() {
        let config = Config::default();
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(config.store.kind, StoreKind::Firebase);
        assert_eq!(config.store.firebase_url.as_deref(), Some("https://niveau-lacs.firebaseio.com/"));
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.layout, TableLayout::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let config = Config::from_toml_str("").expect("empty file should parse");
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.verify.max_age_days, 2);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [store]
            kind = "postgres"
            database_url = "postgres://lacs@localhost/lacs"

            [layout]
            table = "table.niveaux"
            first_date_column = 3
            second_date_column = 2

            [logging]
            level = "debug"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.store.kind, StoreKind::Postgres);
        assert_eq!(config.layout.table, "table.niveaux");
        assert_eq!(config.layout.rows, "tbody tr");
        assert_eq!(config.layout.first_date_column, 3);
        assert_eq!(config.logging.min_level().unwrap(), LogLevel::Debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_store_kind_is_parse_error() {
        let result = Config::from_toml_str("[store]\nkind = \"redis\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://lacs@db/lacs"),
            ("FIREBASE_DATABASE_URL", "https://staging-lacs.firebaseio.com/"),
        ]));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.store.database_url.as_deref(), Some("postgres://lacs@db/lacs"));
        assert_eq!(
            config.store.firebase_url.as_deref(),
            Some("https://staging-lacs.firebaseio.com/")
        );
    }

    #[test]
    fn test_postgres_without_url_is_invalid() {
        let mut config = Config::default();
        config.store.kind = StoreKind::Postgres;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.apply_env(env(&[("DATABASE_URL", "postgres://lacs@db/lacs")]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_layout_is_invalid() {
        let mut config = Config::default();
        config.layout.second_date_column = config.layout.first_date_column;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_log_level_is_invalid() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let path = std::env::temp_dir().join("niveau_lacs_no_such_config.toml");
        let config = Config::from_file_or_default(&path).expect("missing file should default");
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
    }
}
