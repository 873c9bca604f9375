//! History export (JSON, CSV) and import (JSON).

use super::HistoryStore;
use crate::tags::derive_tags;
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, WriterBuilder};
use ffai_types::{ExportFormat, FfaiError, FfaiResult, HistoryEntry, ImportSummary};
use serde_json::{Map, Value};
use tracing::{debug, info};

const CSV_HEADER: [&str; 8] = [
    "Timestamp",
    "Prompt",
    "Command",
    "Provider",
    "Model",
    "Tags",
    "Favorite",
    "Execution Count",
];

impl HistoryStore {
    /// Serialize every entry in store order.
    pub fn export_history(&self, format: ExportFormat) -> FfaiResult<String> {
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(&self.entries)
                .map_err(|e| FfaiError::Serialize(e.to_string())),
            ExportFormat::Csv => self.export_csv(),
        }
    }

    fn export_csv(&self) -> FfaiResult<String> {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::NonNumeric)
            .from_writer(vec![]);
        let csv_err = |e: csv::Error| FfaiError::Serialize(e.to_string());

        wtr.write_record(CSV_HEADER).map_err(csv_err)?;
        for entry in &self.entries {
            let favorite = if entry.is_favorite { "Yes" } else { "No" };
            wtr.write_record([
                iso_timestamp(entry.timestamp).as_str(),
                entry.prompt.as_str(),
                entry.command.as_str(),
                entry.provider.as_str(),
                entry.model.as_deref().unwrap_or(""),
                entry.tags.join(";").as_str(),
                favorite,
                entry.execution_count.to_string().as_str(),
            ])
            .map_err(csv_err)?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| FfaiError::Serialize(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| FfaiError::Serialize(e.to_string()))
    }

    /// Merge entries from an export. Only JSON is accepted.
    ///
    /// Records without a prompt, command or provider are ignored. Records whose
    /// exact prompt and command already exist are counted as valid but skipped.
    pub fn import_history(&mut self, data: &str, format: ExportFormat) -> FfaiResult<ImportSummary> {
        if format == ExportFormat::Csv {
            return Err(FfaiError::NotImplemented(
                "CSV import is not supported; export as JSON instead".to_string(),
            ));
        }

        let value: Value = serde_json::from_str(data)
            .map_err(|e| FfaiError::Validation(format!("history import is not valid JSON: {e}")))?;
        let Value::Array(records) = value else {
            return Err(FfaiError::Validation(
                "history import must be a JSON array of entries".to_string(),
            ));
        };

        let mut summary = ImportSummary::default();
        for record in records {
            let Some(obj) = record.as_object() else {
                continue;
            };
            let (Some(prompt), Some(command), Some(provider)) = (
                non_empty_str(obj, "prompt"),
                obj.get("command").and_then(Value::as_str),
                non_empty_str(obj, "provider"),
            ) else {
                continue;
            };
            summary.valid += 1;

            if self
                .entries
                .iter()
                .any(|e| e.prompt == prompt && e.command == command)
            {
                debug!("skipping duplicate import: {prompt}");
                continue;
            }

            let entry = self.entry_from_record(obj, prompt, command, provider);
            self.entries.push(entry);
            summary.inserted += 1;
        }

        self.persist()?;
        info!(
            "imported {} history entries ({} valid)",
            summary.inserted, summary.valid
        );
        Ok(summary)
    }

    fn entry_from_record(
        &self,
        obj: &Map<String, Value>,
        prompt: &str,
        command: &str,
        provider: &str,
    ) -> HistoryEntry {
        let id = match non_empty_str(obj, "id") {
            Some(id) if self.get(id).is_none() => id.to_string(),
            _ => self.new_id(),
        };
        let tags = match obj.get("tags").and_then(Value::as_array) {
            Some(tags) => tags
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => derive_tags(prompt, self.tag_matching),
        };

        HistoryEntry {
            id,
            prompt: prompt.to_string(),
            command: command.to_string(),
            provider: provider.to_string(),
            model: non_empty_str(obj, "model").map(str::to_string),
            timestamp: obj
                .get("timestamp")
                .and_then(Value::as_i64)
                .unwrap_or_else(|| self.clock.now_millis()),
            execution_count: obj
                .get("executionCount")
                .and_then(Value::as_u64)
                .filter(|n| *n >= 1)
                .unwrap_or(1),
            tags,
            is_favorite: obj
                .get("isFavorite")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            category: non_empty_str(obj, "category").map(str::to_string),
            error: non_empty_str(obj, "error").map(str::to_string),
        }
    }
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn iso_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_timestamp_matches_utc_millis() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_700_000_000_123), "2023-11-14T22:13:20.123Z");
    }
}
