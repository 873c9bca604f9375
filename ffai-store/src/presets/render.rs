//! Template rendering and parameter validation.

use ffai_types::{ParamValue, ParameterType, Preset, PresetParameter};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// Substitute every declared parameter that has a value (supplied or default).
/// Placeholders without either are left in place.
pub fn render(preset: &Preset, values: &BTreeMap<String, ParamValue>) -> String {
    let mut prompt = preset.prompt.clone();
    for param in &preset.parameters {
        let Some(value) = values.get(&param.name).or(param.default.as_ref()) else {
            continue;
        };
        let text = normalize_value(param.kind, &value.to_string());
        prompt = prompt.replace(&format!("{{{}}}", param.name), &text);
    }
    prompt
}

/// Strip option labels such as `"23 (Medium)"` or `"copy (fast)"` down to the usable value.
pub fn normalize_value(kind: ParameterType, raw: &str) -> String {
    if kind == ParameterType::Select
        && let Some(number) = leading_integer_before_paren(raw)
    {
        return number.to_string();
    }
    match raw.find('(') {
        Some(idx) => raw[..idx].trim_end().to_string(),
        None => raw.to_string(),
    }
}

fn leading_integer_before_paren(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_start();
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits == 0 {
        return None;
    }
    trimmed[digits..]
        .trim_start()
        .starts_with('(')
        .then(|| &trimmed[..digits])
}

/// A problem found while checking parameter values against a preset.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterIssue {
    Missing { name: String },
    OutOfRange { name: String, value: String, min: Option<f64>, max: Option<f64> },
    PatternMismatch { name: String, value: String, pattern: String },
    NotAnOption { name: String, value: String },
    WrongType { name: String, expected: ParameterType },
}

impl fmt::Display for ParameterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterIssue::Missing { name } => write!(f, "'{name}' is required"),
            ParameterIssue::OutOfRange { name, value, min, max } => {
                write!(f, "'{name}' = {value} is out of range")?;
                match (min, max) {
                    (Some(min), Some(max)) => write!(f, " ({min}..={max})"),
                    (Some(min), None) => write!(f, " (>= {min})"),
                    (None, Some(max)) => write!(f, " (<= {max})"),
                    (None, None) => Ok(()),
                }
            }
            ParameterIssue::PatternMismatch { name, value, pattern } => {
                write!(f, "'{name}' = {value} does not match {pattern}")
            }
            ParameterIssue::NotAnOption { name, value } => {
                write!(f, "'{name}' = {value} is not one of the listed options")
            }
            ParameterIssue::WrongType { name, expected } => {
                write!(f, "'{name}' must be a {expected}")
            }
        }
    }
}

/// Check supplied values (falling back to defaults) against each parameter's rules.
pub fn validate_parameters(
    preset: &Preset,
    values: &BTreeMap<String, ParamValue>,
) -> Vec<ParameterIssue> {
    let mut issues = Vec::new();
    for param in &preset.parameters {
        match values.get(&param.name).or(param.default.as_ref()) {
            None if param.required => issues.push(ParameterIssue::Missing {
                name: param.name.clone(),
            }),
            None => {}
            Some(value) => issues.extend(check_value(param, value)),
        }
    }
    issues
}

fn check_value(param: &PresetParameter, value: &ParamValue) -> Option<ParameterIssue> {
    let name = param.name.clone();
    let text = value.to_string();

    match param.kind {
        ParameterType::Number => {
            let Some(n) = value.as_f64() else {
                return Some(ParameterIssue::WrongType {
                    name,
                    expected: param.kind,
                });
            };
            let validation = param.validation.as_ref()?;
            let below = validation.min.is_some_and(|min| n < min);
            let above = validation.max.is_some_and(|max| n > max);
            if below || above {
                return Some(ParameterIssue::OutOfRange {
                    name,
                    value: text,
                    min: validation.min,
                    max: validation.max,
                });
            }
            None
        }
        ParameterType::Boolean => match value {
            ParamValue::Bool(_) => None,
            _ => Some(ParameterIssue::WrongType {
                name,
                expected: param.kind,
            }),
        },
        ParameterType::Select => {
            if param.options.is_empty() || param.options.iter().any(|o| *o == text) {
                None
            } else {
                Some(ParameterIssue::NotAnOption { name, value: text })
            }
        }
        ParameterType::String | ParameterType::File => {
            let pattern = param.validation.as_ref()?.pattern.as_ref()?;
            match Regex::new(pattern) {
                Ok(re) if re.is_match(&text) => None,
                Ok(_) => Some(ParameterIssue::PatternMismatch {
                    name,
                    value: text,
                    pattern: pattern.clone(),
                }),
                Err(err) => {
                    tracing::warn!("invalid pattern on parameter '{}': {err}", param.name);
                    None
                }
            }
        }
    }
}
