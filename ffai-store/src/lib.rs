mod clock;
pub mod history;
mod persist;
pub mod presets;
mod tags;

pub use crate::clock::{Clock, SystemClock};
pub use crate::history::{DEFAULT_MAX_ENTRIES, HistoryStore, NewEntry};
pub use crate::persist::{JsonFile, Loaded};
pub use crate::presets::{CatalogEntry, ParameterIssue, TemplateStore};
pub use crate::tags::{TagMatching, derive_tags};

pub const HISTORY_FILE: &str = "history.json";
pub const PRESETS_FILE: &str = "presets.json";
