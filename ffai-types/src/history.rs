//! History entry structure and derived statistics.

use serde::{Deserialize, Serialize};

/// A single recorded generation attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    /// The natural-language request.
    pub prompt: String,
    /// The generated command line, empty when generation failed.
    pub command: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Epoch milliseconds of creation or last reuse.
    pub timestamp: i64,
    #[serde(default = "default_execution_count")]
    pub execution_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_execution_count() -> u64 {
    1
}

impl HistoryEntry {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }
}

/// Aggregates computed on demand from the current entry set.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub favorites: usize,
    pub most_used_provider: Option<String>,
    pub most_used_category: Option<String>,
    pub last_day: usize,
    pub last_week: usize,
    pub last_month: usize,
}

/// Result of flipping the favorite flag on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    NotFound,
    Toggled(bool),
}

/// Counts reported by a history import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Entries that carried the required fields, duplicates included.
    pub valid: usize,
    /// Entries actually appended to the store.
    pub inserted: usize,
}

impl ImportSummary {
    pub fn skipped(&self) -> usize {
        self.valid - self.inserted
    }
}
