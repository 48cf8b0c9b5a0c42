//! Core configuration.
//!
//! # Responsibility
//! - Hold batch chunking parameters shared by write paths.
//! - Load process configuration from `EMRS_*` environment variables.
//!
//! # Invariants
//! - Chunk size is always at least 1 (`NonZeroUsize`).
//! - Unparseable values are reported, never silently replaced by defaults.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

pub const ENV_DB_PATH: &str = "EMRS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "EMRS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EMRS_LOG_DIR";
pub const ENV_BATCH_SIZE: &str = "EMRS_BATCH_SIZE";
pub const ENV_BATCH_ALIGNMENT: &str = "EMRS_BATCH_ALIGNMENT";

/// Where insert batches place their flush+clear boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkAlignment {
    /// Flush after every `chunk_size` submissions, counting from the first.
    #[default]
    Aligned,
    /// Flush after zero-based indices `N, 2N, ...`; the first chunk holds
    /// `N + 1` records.
    Legacy,
}

impl ChunkAlignment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aligned" => Some(Self::Aligned),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// Chunking parameters for batch writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub chunk_size: NonZeroUsize,
    #[serde(default)]
    pub alignment: ChunkAlignment,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_BATCH_SIZE,
            alignment: ChunkAlignment::Aligned,
        }
    }
}

impl BatchConfig {
    pub fn new(chunk_size: NonZeroUsize, alignment: ChunkAlignment) -> Self {
        Self {
            chunk_size,
            alignment,
        }
    }

    /// Whether the insert path flushes right after the record at `index`.
    pub fn flush_after(&self, index: usize) -> bool {
        let size = self.chunk_size.get();
        match self.alignment {
            ChunkAlignment::Aligned => (index + 1) % size == 0,
            ChunkAlignment::Legacy => index > 0 && index % size == 0,
        }
    }
}

/// Process-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub batch: BatchConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            batch: BatchConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Reads `EMRS_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, against an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = non_blank(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = non_blank(ENV_LOG_LEVEL) {
            config.log_level = level.trim().to_string();
        }
        if let Some(dir) = non_blank(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(size) = non_blank(ENV_BATCH_SIZE) {
            config.batch.chunk_size = size
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_BATCH_SIZE,
                    value: size.clone(),
                })?;
        }
        if let Some(alignment) = non_blank(ENV_BATCH_ALIGNMENT) {
            config.batch.alignment =
                ChunkAlignment::parse(&alignment).ok_or(ConfigError::InvalidValue {
                    key: ENV_BATCH_ALIGNMENT,
                    value: alignment.clone(),
                })?;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for {key}")
            }
        }
    }
}

impl Error for ConfigError {}
