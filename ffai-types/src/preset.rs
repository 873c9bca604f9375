//! Prompt template ("preset") types.

use crate::{FfaiError, FfaiResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a parameterized prompt template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    /// Template body with `{name}` placeholders.
    pub prompt: String,
    #[serde(default)]
    pub parameters: Vec<PresetParameter>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub common_use: bool,
}

impl Preset {
    pub fn parameter(&self, name: &str) -> Option<&PresetParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A user-defined preset, persisted alongside its usage counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomPreset {
    #[serde(flatten)]
    pub preset: Preset,
    #[serde(default = "default_true")]
    pub is_custom: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub usage_count: u64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => f.write_str("beginner"),
            Difficulty::Intermediate => f.write_str("intermediate"),
            Difficulty::Advanced => f.write_str("advanced"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[default]
    String,
    Number,
    Boolean,
    Select,
    File,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Select => "select",
            ParameterType::File => "file",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParameterValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresetParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ParameterValidation>,
}

impl PresetParameter {
    pub fn new(name: &str, kind: ParameterType, description: &str) -> Self {
        PresetParameter {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            default: None,
            required: false,
            options: Vec::new(),
            validation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<ParamValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        let validation = self.validation.get_or_insert_with(Default::default);
        validation.min = Some(min);
        validation.max = Some(max);
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        let validation = self.validation.get_or_insert_with(Default::default);
        validation.pattern = Some(pattern.to_string());
        self
    }

    /// Convert raw text (e.g. from the command line) into a value of this parameter's type.
    pub fn coerce(&self, raw: &str) -> FfaiResult<ParamValue> {
        match self.kind {
            ParameterType::Number => {
                let trimmed = raw.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Ok(ParamValue::from(n));
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(ParamValue::from(f)),
                    _ => Err(FfaiError::Validation(format!(
                        "parameter '{}' expects a number, got '{raw}'",
                        self.name
                    ))),
                }
            }
            ParameterType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => Ok(ParamValue::Bool(true)),
                "false" | "no" | "n" | "0" | "off" => Ok(ParamValue::Bool(false)),
                _ => Err(FfaiError::Validation(format!(
                    "parameter '{}' expects yes/no, got '{raw}'",
                    self.name
                ))),
            },
            ParameterType::String | ParameterType::Select | ParameterType::File => {
                Ok(ParamValue::Text(raw.to_string()))
            }
        }
    }
}

/// A parameter value as supplied by a caller or declared as a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => n.as_f64(),
            ParamValue::Text(s) => s.trim().parse().ok(),
            ParamValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(ParamValue::Number)
            .unwrap_or_else(|| ParamValue::Text(value.to_string()))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Fields supplied when creating a custom preset; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub prompt: String,
    pub parameters: Vec<PresetParameter>,
    pub examples: Vec<String>,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub common_use: bool,
}

impl PresetDraft {
    pub fn new(name: &str, category: &str, prompt: &str) -> Self {
        PresetDraft {
            name: name.to_string(),
            category: category.to_string(),
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    pub fn into_preset(self, id: String) -> Preset {
        Preset {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            prompt: self.prompt,
            parameters: self.parameters,
            examples: self.examples,
            tags: self.tags,
            difficulty: self.difficulty,
            common_use: self.common_use,
        }
    }
}

/// Partial update for a custom preset. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub prompt: Option<String>,
    pub parameters: Option<Vec<PresetParameter>>,
    pub examples: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
    pub common_use: Option<bool>,
}

impl PresetPatch {
    /// Shallow merge into `preset`.
    pub fn apply(self, preset: &mut Preset) {
        if let Some(v) = self.name {
            preset.name = v;
        }
        if let Some(v) = self.description {
            preset.description = v;
        }
        if let Some(v) = self.category {
            preset.category = v;
        }
        if let Some(v) = self.prompt {
            preset.prompt = v;
        }
        if let Some(v) = self.parameters {
            preset.parameters = v;
        }
        if let Some(v) = self.examples {
            preset.examples = v;
        }
        if let Some(v) = self.tags {
            preset.tags = v;
        }
        if let Some(v) = self.difficulty {
            preset.difficulty = v;
        }
        if let Some(v) = self.common_use {
            preset.common_use = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_value_untagged_roundtrip_shapes() {
        let v: ParamValue = serde_json::from_str("10").unwrap();
        assert_eq!(v.to_string(), "10");
        let v: ParamValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, ParamValue::Bool(true));
        let v: ParamValue = serde_json::from_str("\"23 (Medium)\"").unwrap();
        assert_eq!(v, ParamValue::Text("23 (Medium)".to_string()));
    }

    #[test]
    fn custom_preset_flattens_fields() {
        let json = r#"{
            "id": "custom-1",
            "name": "Mine",
            "category": "Conversion",
            "prompt": "convert {input}",
            "parameters": [{"name": "input", "type": "file", "required": true}],
            "createdAt": 42
        }"#;
        let custom: CustomPreset = serde_json::from_str(json).unwrap();
        assert!(custom.is_custom);
        assert_eq!(custom.usage_count, 0);
        assert_eq!(custom.preset.difficulty, Difficulty::Intermediate);
        assert_eq!(custom.preset.parameters[0].kind, ParameterType::File);

        let value = serde_json::to_value(&custom).unwrap();
        assert_eq!(value["name"], "Mine");
        assert_eq!(value["isCustom"], true);
        assert_eq!(value["usageCount"], 0);
    }

    #[test]
    fn coerce_is_type_aware() {
        let number = PresetParameter::new("fps", ParameterType::Number, "");
        assert_eq!(number.coerce("12").unwrap(), ParamValue::from(12i64));
        assert_eq!(number.coerce("0.5").unwrap().to_string(), "0.5");
        assert!(number.coerce("fast").is_err());

        let flag = PresetParameter::new("loop", ParameterType::Boolean, "");
        assert_eq!(flag.coerce("Yes").unwrap(), ParamValue::Bool(true));
        assert_eq!(flag.coerce("off").unwrap(), ParamValue::Bool(false));
        assert!(flag.coerce("maybe").is_err());

        let select = PresetParameter::new("crf", ParameterType::Select, "")
            .with_options(&["23 (Medium)"]);
        assert_eq!(
            select.coerce("23 (Medium)").unwrap(),
            ParamValue::Text("23 (Medium)".to_string())
        );
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut preset = PresetDraft::new("a", "cat", "body").into_preset("id".to_string());
        PresetPatch {
            name: Some("b".to_string()),
            common_use: Some(true),
            ..Default::default()
        }
        .apply(&mut preset);
        assert_eq!(preset.name, "b");
        assert_eq!(preset.category, "cat");
        assert!(preset.common_use);
    }
}
