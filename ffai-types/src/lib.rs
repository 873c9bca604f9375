use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod history;
pub mod preset;

pub use history::{FavoriteToggle, HistoryEntry, HistoryStats, ImportSummary};
pub use preset::{
    CustomPreset, Difficulty, ParamValue, ParameterType, ParameterValidation, Preset,
    PresetDraft, PresetParameter, PresetPatch,
};

/// ffai specific error types
#[derive(Error, Debug)]
pub enum FfaiError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Persistence failed: {operation} on {path}: {source}")]
    Persistence {
        operation: String,
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(String),
}

pub type FfaiResult<T> = std::result::Result<T, FfaiError>;

/// Outcome of reading a store's backing file at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No backing file existed (or the store is in-memory).
    Fresh,
    /// The file was read and parsed.
    Loaded(usize),
    /// The file was unreadable as JSON and the store started empty.
    Recovered { warning: String },
}

impl LoadStatus {
    pub fn is_recovered(&self) -> bool {
        matches!(self, LoadStatus::Recovered { .. })
    }
}

/// Serialization format for history export/import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = FfaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(FfaiError::Validation(format!(
                "unknown format '{other}' (expected json or csv)"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Csv => f.write_str("csv"),
        }
    }
}
