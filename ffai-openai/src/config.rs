use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::client::ClientError;

/// Primary key for the chat endpoint path segment.
const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Overrides every provider-specific key variable.
const GENERIC_KEY_VAR: &str = "FFAI_API_KEY";

/// Backends speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    OpenRouter,
    Groq,
    Ollama,
    /// Any compatible server; needs an explicit base URL.
    Custom,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::OpenRouter,
        Provider::Groq,
        Provider::Ollama,
        Provider::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::OpenRouter => "openrouter",
            Provider::Groq => "groq",
            Provider::Ollama => "ollama",
            Provider::Custom => "custom",
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("https://api.openai.com/v1"),
            Provider::OpenRouter => Some("https://openrouter.ai/api/v1"),
            Provider::Groq => Some("https://api.groq.com/openai/v1"),
            Provider::Ollama => Some("http://localhost:11434/v1"),
            Provider::Custom => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi | Provider::Custom => "gpt-4o-mini",
            Provider::OpenRouter => "openai/gpt-4o-mini",
            Provider::Groq => "llama-3.3-70b-versatile",
            Provider::Ollama => "llama3.2",
        }
    }

    /// Environment variable holding this provider's key, if it has one.
    pub fn key_var(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::OpenRouter => Some("OPENROUTER_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::Ollama | Provider::Custom => None,
        }
    }

    /// Local servers accept unauthenticated requests.
    pub fn requires_key(&self) -> bool {
        !matches!(self, Provider::Ollama | Provider::Custom)
    }

    /// Look up the key through `getter`: the generic variable first, then the provider's own.
    pub fn api_key_from(&self, mut getter: impl FnMut(&str) -> Option<String>) -> Option<String> {
        getter(GENERIC_KEY_VAR)
            .or_else(|| self.key_var().and_then(&mut getter))
            .filter(|key| !key.trim().is_empty())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| ClientError::UnknownProvider(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    provider: Provider,
    api_key: Option<String>,
    base_url: Option<String>,
    default_model: String,
}

impl OpenAiConfig {
    pub fn new(
        provider: Provider,
        api_key: Option<String>,
        base_url: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let base_url = sanitize_base_url(base_url)
            .or_else(|| provider.default_base_url().map(str::to_string));
        let default_model = default_model
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        Self {
            provider,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url,
            default_model,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn chat_endpoint(&self) -> Option<String> {
        self.base_url.as_deref().map(build_chat_endpoint)
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

fn sanitize_base_url(base_url: Option<String>) -> Option<String> {
    base_url.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.trim_end_matches('/').to_string())
        }
    })
}

fn build_chat_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(CHAT_COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}/{CHAT_COMPLETIONS_PATH}")
    }
}
