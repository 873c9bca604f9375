//! Whole-file JSON persistence shared by both stores.

use ffai_types::{FfaiError, FfaiResult, LoadStatus};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Items read from a backing file together with how the read went.
#[derive(Debug)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub status: LoadStatus,
}

/// A JSON array stored in a single file, rewritten in full on every save.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file yields an empty `Fresh` result. Unreadable
    /// or malformed content yields an empty `Recovered` one; reads never fail.
    pub fn load<T: DeserializeOwned>(&self) -> Loaded<T> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.path.display());
                return Loaded {
                    items: Vec::new(),
                    status: LoadStatus::Fresh,
                };
            }
            Err(err) => {
                return self.recovered(format!("could not read {}: {err}", self.path.display()));
            }
        };

        if contents.trim_ascii().is_empty() {
            return Loaded {
                items: Vec::new(),
                status: LoadStatus::Loaded(0),
            };
        }

        match serde_json::from_slice::<Vec<T>>(&contents) {
            Ok(items) => {
                debug!("loaded {} records from {}", items.len(), self.path.display());
                let status = LoadStatus::Loaded(items.len());
                Loaded { items, status }
            }
            Err(err) => {
                self.recovered(format!("could not parse {}: {err}", self.path.display()))
            }
        }
    }

    fn recovered<T>(&self, reason: String) -> Loaded<T> {
        let warning = format!("{reason}; starting with an empty store");
        warn!("{warning}");
        Loaded {
            items: Vec::new(),
            status: LoadStatus::Recovered { warning },
        }
    }

    /// Replace the file contents with `items`, pretty-printed.
    pub fn save<T: Serialize>(&self, items: &[T]) -> FfaiResult<()> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| FfaiError::Serialize(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| self.error("create directory", source))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|source| self.error("create", source))?;
        tmp.write_all(json.as_bytes())
            .map_err(|source| self.error("write", source))?;
        tmp.persist(&self.path)
            .map_err(|err| self.error("replace", err.error))?;

        debug!("wrote {} records to {}", items.len(), self.path.display());
        Ok(())
    }

    fn error(&self, operation: &str, source: std::io::Error) -> FfaiError {
        FfaiError::Persistence {
            operation: operation.to_string(),
            path: self.path.display().to_string(),
            source,
        }
    }
}
