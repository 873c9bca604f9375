//! Preset (prompt template) store.
//!
//! Built-in presets ship with the binary and are read-only. Custom presets
//! live in their own file and carry a usage counter.
//!
//! # Module Structure
//!
//! - [`catalog`] - the built-in catalog
//! - [`render`] - placeholder substitution and parameter checks

mod catalog;
mod render;


pub use catalog::builtin_presets;
pub use render::{ParameterIssue, normalize_value, render, validate_parameters};

use crate::clock::{Clock, SystemClock};
use crate::persist::JsonFile;
use ffai_types::{
    CustomPreset, FfaiError, FfaiResult, LoadStatus, ParamValue, Preset, PresetDraft,
    PresetParameter, PresetPatch,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A preset as seen through the unified catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CatalogEntry<'a> {
    BuiltIn(&'a Preset),
    Custom(&'a CustomPreset),
}

impl<'a> CatalogEntry<'a> {
    pub fn preset(&self) -> &'a Preset {
        match self {
            CatalogEntry::BuiltIn(p) => p,
            CatalogEntry::Custom(c) => &c.preset,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, CatalogEntry::Custom(_))
    }

    /// Built-ins do not track usage.
    pub fn usage_count(&self) -> Option<u64> {
        match self {
            CatalogEntry::BuiltIn(_) => None,
            CatalogEntry::Custom(c) => Some(c.usage_count),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetExport<'a> {
    built_in: &'a [Preset],
    custom: &'a [CustomPreset],
}

pub struct TemplateStore {
    file: Option<JsonFile>,
    builtins: Vec<Preset>,
    custom: Vec<CustomPreset>,
    clock: Arc<dyn Clock>,
    load_status: LoadStatus,
}

impl fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateStore")
            .field("file", &self.file)
            .field("builtins", &self.builtins.len())
            .field("custom", &self.custom.len())
            .field("load_status", &self.load_status)
            .finish()
    }
}

impl TemplateStore {
    /// Built-in catalog only, custom presets kept in memory.
    pub fn in_memory() -> Self {
        TemplateStore {
            file: None,
            builtins: builtin_presets(),
            custom: Vec::new(),
            clock: Arc::new(SystemClock),
            load_status: LoadStatus::Fresh,
        }
    }

    /// Open with custom presets backed by `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let file = JsonFile::new(path);
        let loaded = file.load::<CustomPreset>();
        let mut store = TemplateStore {
            file: Some(file),
            custom: Vec::new(),
            load_status: loaded.status,
            ..Self::in_memory()
        };
        for mut custom in loaded.items {
            if store.get_preset_by_id(&custom.preset.id).is_some() {
                let id = store.new_id();
                warn!(
                    "custom preset id '{}' is already taken; using {id}",
                    custom.preset.id
                );
                custom.preset.id = id;
            }
            store.custom.push(custom);
        }
        store
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn custom_presets(&self) -> &[CustomPreset] {
        &self.custom
    }

    /// Built-ins first, then custom presets in creation order.
    pub fn get_all_presets(&self) -> Vec<CatalogEntry<'_>> {
        self.builtins
            .iter()
            .map(CatalogEntry::BuiltIn)
            .chain(self.custom.iter().map(CatalogEntry::Custom))
            .collect()
    }

    pub fn get_presets_by_category(&self, category: &str) -> Vec<CatalogEntry<'_>> {
        let category = category.to_lowercase();
        self.get_all_presets()
            .into_iter()
            .filter(|e| e.preset().category.to_lowercase() == category)
            .collect()
    }

    pub fn get_preset_by_id(&self, id: &str) -> Option<CatalogEntry<'_>> {
        self.get_all_presets()
            .into_iter()
            .find(|e| e.preset().id == id)
    }

    /// Distinct categories, sorted.
    pub fn get_categories(&self) -> Vec<String> {
        self.get_all_presets()
            .iter()
            .map(|e| e.preset().category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn get_common_presets(&self) -> Vec<CatalogEntry<'_>> {
        self.get_all_presets()
            .into_iter()
            .filter(|e| e.preset().common_use)
            .collect()
    }

    /// Case-insensitive search over name, description, tags and prompt.
    pub fn search_presets(&self, query: &str) -> Vec<CatalogEntry<'_>> {
        let query = query.to_lowercase();
        self.get_all_presets()
            .into_iter()
            .filter(|e| {
                let p = e.preset();
                p.name.to_lowercase().contains(&query)
                    || p.description.to_lowercase().contains(&query)
                    || p.tags.iter().any(|t| t.to_lowercase().contains(&query))
                    || p.prompt.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Create a custom preset and return its generated id.
    pub fn add_custom_preset(&mut self, draft: PresetDraft) -> FfaiResult<String> {
        let id = self.push_custom(draft);
        self.persist()?;
        debug!("added custom preset {id}");
        Ok(id)
    }

    /// Apply `patch` to a custom preset. Built-in ids are never modified.
    pub fn update_custom_preset(&mut self, id: &str, patch: PresetPatch) -> FfaiResult<bool> {
        let Some(custom) = self.custom_mut(id) else {
            return Ok(false);
        };
        patch.apply(&mut custom.preset);
        // the id is fixed once assigned
        custom.preset.id = id.to_string();
        self.persist()?;
        Ok(true)
    }

    pub fn delete_custom_preset(&mut self, id: &str) -> FfaiResult<bool> {
        let before = self.custom.len();
        self.custom.retain(|c| c.preset.id != id);
        if self.custom.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn increment_usage_count(&mut self, id: &str) -> FfaiResult<bool> {
        let Some(custom) = self.custom_mut(id) else {
            return Ok(false);
        };
        custom.usage_count += 1;
        self.persist()?;
        Ok(true)
    }

    /// Render the preset's prompt with `values`, falling back to parameter defaults.
    pub fn build_prompt_from_preset(
        &self,
        id: &str,
        values: &BTreeMap<String, ParamValue>,
    ) -> FfaiResult<String> {
        let entry = self
            .get_preset_by_id(id)
            .ok_or_else(|| FfaiError::NotFound(format!("preset '{id}'")))?;
        Ok(render(entry.preset(), values))
    }

    /// JSON object with `builtIn` and `custom` arrays.
    pub fn export_presets(&self) -> FfaiResult<String> {
        serde_json::to_string_pretty(&PresetExport {
            built_in: &self.builtins,
            custom: &self.custom,
        })
        .map_err(|e| FfaiError::Serialize(e.to_string()))
    }

    /// Import custom presets from an array or an export's `custom` array.
    /// Returns how many were imported; each gets a fresh id.
    pub fn import_custom_presets(&mut self, data: &str) -> FfaiResult<usize> {
        let value: Value = serde_json::from_str(data)
            .map_err(|e| FfaiError::Validation(format!("preset import is not valid JSON: {e}")))?;

        let candidates = match value {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("custom") {
                Some(Value::Array(items)) => items,
                _ => return Err(invalid_import_type()),
            },
            _ => return Err(invalid_import_type()),
        };

        let mut drafts = Vec::new();
        for candidate in &candidates {
            match draft_from_value(candidate) {
                Some(draft) => drafts.push(draft),
                None => debug!("skipping incomplete preset in import"),
            }
        }

        let imported = drafts.len();
        for draft in drafts {
            self.push_custom(draft);
        }
        self.persist()?;
        info!(
            "imported {imported} of {} custom presets",
            candidates.len()
        );
        Ok(imported)
    }

    fn push_custom(&mut self, draft: PresetDraft) -> String {
        let id = self.new_id();
        self.custom.push(CustomPreset {
            preset: draft.into_preset(id.clone()),
            is_custom: true,
            created_at: self.clock.now_millis(),
            usage_count: 0,
        });
        id
    }

    fn custom_mut(&mut self, id: &str) -> Option<&mut CustomPreset> {
        self.custom.iter_mut().find(|c| c.preset.id == id)
    }

    fn new_id(&self) -> String {
        loop {
            let id = format!("custom-{}", uuid::Uuid::new_v4().simple());
            if self.get_preset_by_id(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&self) -> FfaiResult<()> {
        if let Some(file) = &self.file {
            file.save(&self.custom)?;
        }
        Ok(())
    }
}

fn invalid_import_type() -> FfaiError {
    FfaiError::Validation(
        "invalid import type: expected an array of presets or an object with a 'custom' array"
            .to_string(),
    )
}

fn draft_from_value(value: &Value) -> Option<PresetDraft> {
    let obj = value.as_object()?;
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    let strings = |key: &str| -> Vec<String> {
        obj.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let parameters = match obj.get("parameters") {
        Some(raw) => match serde_json::from_value::<Vec<PresetParameter>>(raw.clone()) {
            Ok(params) => params,
            Err(err) => {
                warn!("ignoring malformed parameters in imported preset: {err}");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    Some(PresetDraft {
        name: text("name")?,
        category: text("category")?,
        prompt: text("prompt")?,
        description: text("description").unwrap_or_default(),
        parameters,
        examples: strings("examples"),
        tags: strings("tags"),
        difficulty: obj
            .get("difficulty")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default(),
        common_use: obj
            .get("commonUse")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}
