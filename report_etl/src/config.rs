//! Pipeline configuration: TOML file, environment overrides, defaults.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! data_dir = "data/raw"
//! db_path = "data/cme_data.db"
//! archive_dir = "data/archive"
//!
//! [log]
//! level = "info"
//! dir = "logs"            # omit to log to the console only
//! file_prefix = "report_etl.log"
//! json = true
//!
//! [store]
//! busy_timeout_ms = 5000
//!
//! [inventory]
//! metadata_scan_rows = 15
//! header_search_rows = 25
//! default_unit = "Troy Ounces"
//! ```
//!
//! Precedence, lowest first: defaults, file, environment
//! (`REPORT_ETL_DATA_DIR`, `REPORT_ETL_DB_PATH` or `DATABASE_URL`), command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use report_parsers::InventoryParserOptions;
use serde::{Deserialize, Serialize};
use shared_utils::env::{first_env_var, optional_env_var};

use crate::store::StoreOptions;

/// Environment variable overriding [`EtlConfig::data_dir`].
pub const DATA_DIR_VAR: &str = "REPORT_ETL_DATA_DIR";
/// Environment variables overriding [`EtlConfig::db_path`], first set wins.
pub const DB_PATH_VARS: [&str; 2] = ["REPORT_ETL_DB_PATH", "DATABASE_URL"];

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct EtlConfig {
    /// Directory scanned for report files.
    pub data_dir: PathBuf,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Root of the `<YYYY-MM>/` archive folders.
    pub archive_dir: PathBuf,
    /// Logging.
    pub log: LogConfig,
    /// Store tuning.
    pub store: StoreConfig,
    /// Inventory parser tuning.
    pub inventory: InventoryConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw"),
            db_path: PathBuf::from("data/cme_data.db"),
            archive_dir: PathBuf::from("data/archive"),
            log: LogConfig::default(),
            store: StoreConfig::default(),
            inventory: InventoryConfig::default(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Directory for daily-rolling log files. `None` disables file logging.
    pub dir: Option<PathBuf>,
    /// File name prefix for rolled files.
    pub file_prefix: String,
    /// Write the file layer as JSON lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            file_prefix: "report_etl.log".to_string(),
            json: true,
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreConfig {
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: StoreOptions::default().busy_timeout_ms,
        }
    }
}

impl StoreConfig {
    /// Options for [`crate::store::IngestionStore::open`].
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

/// `[inventory]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct InventoryConfig {
    /// Rows scanned for metadata.
    pub metadata_scan_rows: usize,
    /// Rows probed for the table header.
    pub header_search_rows: usize,
    /// Unit used when a sheet names none.
    pub default_unit: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        let options = InventoryParserOptions::default();
        Self {
            metadata_scan_rows: options.metadata_scan_rows,
            header_search_rows: options.header_search_rows,
            default_unit: options.default_unit,
        }
    }
}

impl InventoryConfig {
    /// Parser options built from this section.
    pub fn parser_options(&self) -> InventoryParserOptions {
        InventoryParserOptions {
            metadata_scan_rows: self.metadata_scan_rows,
            header_search_rows: self.header_search_rows,
            default_unit: self.default_unit.clone(),
        }
    }
}

/// Values read from the environment, kept separate so they can be applied
/// (and tested) without touching the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// From [`DATA_DIR_VAR`].
    pub data_dir: Option<String>,
    /// From the first set variable in [`DB_PATH_VARS`].
    pub db_path: Option<String>,
}

impl EnvOverrides {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self {
            data_dir: optional_env_var(DATA_DIR_VAR),
            db_path: first_env_var(&DB_PATH_VARS).map(|(_, v)| v),
        }
    }
}

impl EtlConfig {
    /// Applies environment overrides. `sqlite://` / `sqlite:` URL prefixes are
    /// stripped from the database location.
    pub fn apply_overrides(&mut self, env: EnvOverrides) {
        if let Some(dir) = env.data_dir {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = env.db_path {
            let path = url
                .strip_prefix("sqlite://")
                .or_else(|| url.strip_prefix("sqlite:"))
                .unwrap_or(&url);
            self.db_path = PathBuf::from(path);
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.inventory.metadata_scan_rows == 0 {
            bail!("inventory.metadata_scan_rows must be at least 1");
        }
        if self.inventory.header_search_rows == 0 {
            bail!("inventory.header_search_rows must be at least 1");
        }
        if self.log.file_prefix.trim().is_empty() {
            bail!("log.file_prefix must not be empty");
        }
        Ok(())
    }
}

/// Parse and validate configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<EtlConfig> {
    let cfg: EtlConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

/// Read a config TOML file from disk, parse and validate it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<EtlConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
