//! Keyword-based tag inference for history prompts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// How tag keywords are matched against a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatching {
    /// Plain substring search; "to" inside "photo" counts.
    #[default]
    Substring,
    /// Keywords must stand as whole words, allowing common suffixes.
    #[serde(alias = "word-boundary")]
    Word,
}

const TAG_RULES: &[(&str, &[&str])] = &[
    ("video", &["video", "mp4", "avi"]),
    ("audio", &["audio", "mp3", "sound"]),
    ("conversion", &["convert", "to"]),
    ("compression", &["compress", "reduce", "optimize"]),
    ("gif", &["gif"]),
    ("streaming", &["stream", "rtmp", "hls"]),
    ("extraction", &["extract"]),
    ("resize", &["resize", "scale", "resolution"]),
];

static WORD_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TAG_RULES
        .iter()
        .map(|(tag, keywords)| {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b(?:{alternation})(?:s|d|es|ed|ing|ion|ions|er)?\b");
            (*tag, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Derive tags from a prompt. Multiple tags may apply; order follows the rule table.
pub fn derive_tags(prompt: &str, mode: TagMatching) -> Vec<String> {
    let lower = prompt.to_lowercase();
    match mode {
        TagMatching::Substring => TAG_RULES
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(tag, _)| tag.to_string())
            .collect(),
        TagMatching::Word => WORD_RULES
            .iter()
            .filter(|(_, re)| re.is_match(&lower))
            .map(|(tag, _)| tag.to_string())
            .collect(),
    }
}
