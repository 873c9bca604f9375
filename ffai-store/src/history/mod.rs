//! Generation history store.
//!
//! Keeps a log of every generation attempt with:
//! - dedup-on-insert (case-insensitive prompt, exact command)
//! - keyword tag inference
//! - a capacity cap applied whenever the store is persisted
//! - favorites exempt from age-based pruning
//!
//! # Module Structure
//!
//! - [`transfer`] - JSON/CSV export and JSON import

mod transfer;

#[cfg(test)]
mod tests;

use crate::clock::{Clock, SystemClock};
use crate::persist::JsonFile;
use crate::tags::{TagMatching, derive_tags};
use ffai_types::{FavoriteToggle, FfaiResult, HistoryEntry, HistoryStats, LoadStatus};
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of entries kept after persistence.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Fields recorded for one generation attempt.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub prompt: String,
    pub command: String,
    pub provider: String,
    pub model: Option<String>,
    pub category: Option<String>,
    pub error: Option<String>,
}

impl NewEntry {
    pub fn new(prompt: &str, command: &str, provider: &str) -> Self {
        NewEntry {
            prompt: prompt.to_string(),
            command: command.to_string(),
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    pub fn model(mut self, model: Option<&str>) -> Self {
        self.model = model.map(str::to_string);
        self
    }

    pub fn category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(str::to_string);
        self
    }

    pub fn error(mut self, error: Option<&str>) -> Self {
        self.error = error.map(str::to_string);
        self
    }
}

/// Durable, queryable log of generation attempts.
pub struct HistoryStore {
    file: Option<JsonFile>,
    entries: Vec<HistoryEntry>,
    max_entries: usize,
    tag_matching: TagMatching,
    clock: Arc<dyn Clock>,
    load_status: LoadStatus,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("file", &self.file)
            .field("entries", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .field("tag_matching", &self.tag_matching)
            .field("load_status", &self.load_status)
            .finish()
    }
}

impl HistoryStore {
    /// Create a store with no backing file.
    pub fn in_memory() -> Self {
        HistoryStore {
            file: None,
            entries: Vec::new(),
            max_entries: DEFAULT_MAX_ENTRIES,
            tag_matching: TagMatching::default(),
            clock: Arc::new(SystemClock),
            load_status: LoadStatus::Fresh,
        }
    }

    /// Open the store backed by `path`, loading whatever it holds.
    ///
    /// An unreadable or malformed file leaves the store empty; check
    /// [`HistoryStore::load_status`] to tell that apart from a fresh start.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let file = JsonFile::new(path);
        let loaded = file.load::<HistoryEntry>();
        HistoryStore {
            file: Some(file),
            entries: loaded.items,
            load_status: loaded.status,
            ..Self::in_memory()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_tag_matching(mut self, tag_matching: TagMatching) -> Self {
        self.tag_matching = tag_matching;
        self
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Entries in store order (newest insertions first).
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Record a generation attempt and return the id of the new or merged entry.
    ///
    /// An entry with the same prompt (ignoring case) and the same command is
    /// reused: its execution count goes up and its timestamp is refreshed.
    pub fn add(&mut self, record: NewEntry) -> FfaiResult<String> {
        let now = self.clock.now_millis();
        let prompt_key = record.prompt.to_lowercase();

        let existing = self
            .entries
            .iter()
            .position(|e| e.command == record.command && e.prompt.to_lowercase() == prompt_key);

        let id = if let Some(idx) = existing {
            let entry = &mut self.entries[idx];
            entry.execution_count += 1;
            entry.timestamp = now;
            debug!("merged into {} (count {})", entry.id, entry.execution_count);
            entry.id.clone()
        } else {
            let id = self.new_id();
            let tags = derive_tags(&record.prompt, self.tag_matching);
            self.entries.insert(
                0,
                HistoryEntry {
                    id: id.clone(),
                    prompt: record.prompt,
                    command: record.command,
                    provider: record.provider,
                    model: record.model,
                    timestamp: now,
                    execution_count: 1,
                    tags,
                    is_favorite: false,
                    category: record.category,
                    error: record.error,
                },
            );
            debug!("added history entry {id}");
            id
        };

        self.persist()?;
        Ok(id)
    }

    /// Most recent entries first.
    pub fn get_recent(&self, limit: usize) -> Vec<&HistoryEntry> {
        let mut recent: Vec<&HistoryEntry> = self.entries.iter().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        recent
    }

    pub fn get_favorites(&self) -> Vec<&HistoryEntry> {
        let mut favorites: Vec<&HistoryEntry> =
            self.entries.iter().filter(|e| e.is_favorite).collect();
        favorites.sort_by(|a, b| b.execution_count.cmp(&a.execution_count));
        favorites
    }

    /// Entries run more than once, highest count first.
    pub fn get_most_used(&self, limit: usize) -> Vec<&HistoryEntry> {
        let mut used: Vec<&HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.execution_count > 1)
            .collect();
        used.sort_by(|a, b| b.execution_count.cmp(&a.execution_count));
        used.truncate(limit);
        used
    }

    /// Case-insensitive substring search over prompt, command, tags and category.
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.prompt.to_lowercase().contains(&query)
                    || e.command.to_lowercase().contains(&query)
                    || e.tags.iter().any(|t| t.to_lowercase().contains(&query))
                    || e
                        .category
                        .as_ref()
                        .is_some_and(|c| c.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn get_by_tag(&self, tag: &str) -> Vec<&HistoryEntry> {
        self.entries.iter().filter(|e| e.has_tag(tag)).collect()
    }

    pub fn get_by_category(&self, category: &str) -> Vec<&HistoryEntry> {
        let category = category.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.category
                    .as_ref()
                    .is_some_and(|c| c.to_lowercase() == category)
            })
            .collect()
    }

    pub fn toggle_favorite(&mut self, id: &str) -> FfaiResult<FavoriteToggle> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(FavoriteToggle::NotFound);
        };
        entry.is_favorite = !entry.is_favorite;
        let now_favorite = entry.is_favorite;
        self.persist()?;
        Ok(FavoriteToggle::Toggled(now_favorite))
    }

    /// Union `tags` into the entry's tag set. Returns false when the id is unknown.
    pub fn add_tags<S: AsRef<str>>(&mut self, id: &str, tags: &[S]) -> FfaiResult<bool> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        for tag in tags {
            let tag = tag.as_ref().trim();
            if !tag.is_empty() && !entry.tags.iter().any(|t| t == tag) {
                entry.tags.push(tag.to_string());
            }
        }
        self.persist()?;
        Ok(true)
    }

    pub fn set_category(&mut self, id: &str, category: &str) -> FfaiResult<bool> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        entry.category = Some(category.to_string());
        self.persist()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: &str) -> FfaiResult<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        self.persist()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> FfaiResult<()> {
        self.entries.clear();
        self.persist()
    }

    /// Drop non-favorite entries older than `days_to_keep` days. Returns how many were removed.
    pub fn clear_old_entries(&mut self, days_to_keep: u32) -> FfaiResult<usize> {
        let cutoff = self.clock.now_millis() - i64::from(days_to_keep) * DAY_MILLIS;
        let before = self.entries.len();
        self.entries
            .retain(|e| e.is_favorite || e.timestamp >= cutoff);
        let removed = before - self.entries.len();
        debug!("pruned {removed} entries older than {days_to_keep} days");
        self.persist()?;
        Ok(removed)
    }

    pub fn get_stats(&self) -> HistoryStats {
        let now = self.clock.now_millis();
        let within = |days: i64| {
            self.entries
                .iter()
                .filter(|e| e.timestamp >= now - days * DAY_MILLIS)
                .count()
        };

        HistoryStats {
            total: self.entries.len(),
            favorites: self.entries.iter().filter(|e| e.is_favorite).count(),
            most_used_provider: most_common(self.entries.iter().map(|e| e.provider.as_str())),
            most_used_category: most_common(
                self.entries.iter().filter_map(|e| e.category.as_deref()),
            ),
            last_day: within(1),
            last_week: within(7),
            last_month: within(30),
        }
    }

    fn new_id(&self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Keep only the newest `max_entries` entries. Favorites are not exempt.
    fn enforce_capacity(&mut self) {
        if self.entries.len() > self.max_entries {
            self.entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            let dropped = self.entries.len() - self.max_entries;
            self.entries.truncate(self.max_entries);
            debug!("trimmed {dropped} entries over capacity");
        }
    }

    fn persist(&mut self) -> FfaiResult<()> {
        self.enforce_capacity();
        if let Some(file) = &self.file {
            file.save(&self.entries)?;
        }
        Ok(())
    }
}

/// The most frequent value; ties go to whichever was seen first.
fn most_common<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut tally: IndexMap<&str, usize> = IndexMap::new();
    for value in values {
        *tally.entry(value).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in tally {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}
