// History configuration, loadable from RON or JSON

use crate::command::descriptor::DEFAULT_ID_FIELD;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of entries kept in history
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("History limit must be a positive integer")]
    InvalidLimit,

    #[error("Id field must not be empty")]
    InvalidIdField,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializable part of the history setup
///
/// Collaborators (registry, hooks, logger) are attached through
/// [`crate::command::CommandManager::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of entries kept; 0 falls back to [`DEFAULT_LIMIT`]
    pub limit: usize,
    /// Attribute key used to look up an invocation's target instance
    pub id_field: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }
}

impl HistoryConfig {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Limit actually applied to the buffer
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::InvalidLimit);
        }
        if self.id_field.is_empty() {
            return Err(ConfigError::InvalidIdField);
        }
        Ok(())
    }

    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, picking the format from its extension
    ///
    /// `.json` is parsed as JSON, anything else as RON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_ron_str(&source),
        }
    }
}
