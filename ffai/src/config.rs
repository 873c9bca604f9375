//! Layered configuration: command-line flags, then environment, then
//! `config.toml`, then built-in defaults.

use crate::environment::{self, CONFIG_FILE, LOG_FILE, expand_path};
use anyhow::{Context as _, Result, bail};
use ffai_openai::{OpenAiConfig, Provider};
use ffai_store::{DEFAULT_MAX_ENTRIES, HISTORY_FILE, PRESETS_FILE, TagMatching};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub auto_copy: Option<bool>,
    pub data_dir: Option<String>,
    pub history: HistorySection,
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistorySection {
    pub max_entries: Option<usize>,
    pub tag_matching: Option<TagMatching>,
}

impl FileConfig {
    /// A missing file is the same as an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .with_context(|| format!("failed to parse {}", path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no config file at {}", path.display());
                Ok(Self::default())
            }
            Err(err) => {
                Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// The effective configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: Provider,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub auto_copy: bool,
    pub data_dir: PathBuf,
    pub max_entries: usize,
    pub tag_matching: TagMatching,
    pub config_file: PathBuf,
}

impl Settings {
    /// Resolve against the real config file and process environment.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let config_file = environment::get_config_file(CONFIG_FILE)?;
        let file = FileConfig::load(&config_file)?;
        Self::resolve(file, overrides, |key| std::env::var(key).ok(), config_file)
    }

    pub fn resolve(
        file: FileConfig,
        overrides: &Overrides,
        mut getter: impl FnMut(&str) -> Option<String>,
        config_file: PathBuf,
    ) -> Result<Self> {
        let mut env = |key: &str| getter(key).filter(|v| !v.trim().is_empty());

        let provider = match overrides
            .provider
            .clone()
            .or_else(|| env("FFAI_PROVIDER"))
            .or(file.provider)
        {
            Some(name) => name.parse::<Provider>()?,
            None => Provider::default(),
        };

        let model = overrides
            .model
            .clone()
            .or_else(|| env("FFAI_MODEL"))
            .or(file.model);
        let base_url = env("FFAI_BASE_URL").or(file.base_url);
        let api_key = provider.api_key_from(&mut env).or(file.api_key);

        let data_dir = match &overrides.data_dir {
            Some(dir) => dir.clone(),
            None => match env("FFAI_DATA_DIR").or(file.data_dir) {
                Some(raw) => expand_path(&raw),
                None => environment::default_data_dir()?,
            },
        };

        let max_entries = file.history.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES);
        if max_entries == 0 {
            bail!("history.max_entries must be at least 1");
        }

        Ok(Settings {
            provider,
            model,
            base_url,
            api_key,
            auto_copy: file.auto_copy.unwrap_or(false),
            data_dir,
            max_entries,
            tag_matching: file.history.tag_matching.unwrap_or_default(),
            config_file,
        })
    }

    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig::new(
            self.provider,
            self.api_key.clone(),
            self.base_url.clone(),
            self.model.clone(),
        )
    }

    /// The model that will be requested when none is chosen per call.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    pub fn presets_path(&self) -> PathBuf {
        self.data_dir.join(PRESETS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// The API key with all but its first four characters hidden.
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            None => "(not set)".to_string(),
            Some(key) if key.chars().count() <= 8 => "********".to_string(),
            Some(key) => {
                let head: String = key.chars().take(4).collect();
                format!("{head}********")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn getter(vars: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn resolve(file: FileConfig, overrides: &Overrides, vars: &[(&str, &str)]) -> Settings {
        Settings::resolve(file, overrides, getter(vars), PathBuf::from("/cfg/config.toml")).unwrap()
    }

    fn with_dir() -> Overrides {
        Overrides {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        }
    }

    #[test]
    fn parses_full_file() {
        let file = FileConfig::parse(
            r#"
provider = "groq"
model = "llama"
auto_copy = true
data_dir = "/srv/ffai"

[history]
max_entries = 50
tag_matching = "word"
"#,
        )
        .unwrap();
        assert_eq!(file.provider.as_deref(), Some("groq"));
        assert_eq!(file.auto_copy, Some(true));
        assert_eq!(file.history.max_entries, Some(50));
        assert_eq!(file.history.tag_matching, Some(TagMatching::Word));
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings = resolve(FileConfig::parse("").unwrap(), &with_dir(), &[]);
        assert_eq!(settings.provider, Provider::OpenAi);
        assert_eq!(settings.model, None);
        assert_eq!(settings.effective_model(), "gpt-4o-mini");
        assert!(!settings.auto_copy);
        assert_eq!(settings.max_entries, DEFAULT_MAX_ENTRIES);
        assert_eq!(settings.tag_matching, TagMatching::Substring);
        assert_eq!(settings.history_path(), PathBuf::from("/data/history.json"));
        assert_eq!(settings.presets_path(), PathBuf::from("/data/presets.json"));
        assert_eq!(settings.log_path(), PathBuf::from("/data/ffai.log"));
    }

    #[test]
    fn flags_beat_env_beat_file() {
        let file = FileConfig {
            provider: Some("openrouter".to_string()),
            model: Some("file-model".to_string()),
            data_dir: Some("/file-dir".to_string()),
            ..Default::default()
        };
        let vars = [
            ("FFAI_PROVIDER", "groq"),
            ("FFAI_MODEL", "env-model"),
            ("FFAI_DATA_DIR", "/env-dir"),
        ];

        let settings = resolve(file.clone(), &Overrides::default(), &vars);
        assert_eq!(settings.provider, Provider::Groq);
        assert_eq!(settings.model.as_deref(), Some("env-model"));
        assert_eq!(settings.data_dir, PathBuf::from("/env-dir"));

        let overrides = Overrides {
            provider: Some("ollama".to_string()),
            model: Some("flag-model".to_string()),
            data_dir: Some(PathBuf::from("/flag-dir")),
        };
        let settings = resolve(file.clone(), &overrides, &vars);
        assert_eq!(settings.provider, Provider::Ollama);
        assert_eq!(settings.model.as_deref(), Some("flag-model"));
        assert_eq!(settings.data_dir, PathBuf::from("/flag-dir"));

        let settings = resolve(file, &Overrides::default(), &[]);
        assert_eq!(settings.provider, Provider::OpenRouter);
        assert_eq!(settings.model.as_deref(), Some("file-model"));
        assert_eq!(settings.data_dir, PathBuf::from("/file-dir"));
    }

    #[test]
    fn api_key_prefers_environment() {
        let file = FileConfig {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        let settings = resolve(file.clone(), &with_dir(), &[("OPENAI_API_KEY", "from-env")]);
        assert_eq!(settings.api_key.as_deref(), Some("from-env"));

        let settings = resolve(
            file.clone(),
            &with_dir(),
            &[("OPENAI_API_KEY", "from-env"), ("FFAI_API_KEY", "generic")],
        );
        assert_eq!(settings.api_key.as_deref(), Some("generic"));

        let settings = resolve(file, &with_dir(), &[("OPENAI_API_KEY", "  ")]);
        assert_eq!(settings.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let overrides = Overrides {
            provider: Some("skynet".to_string()),
            ..with_dir()
        };
        let err = Settings::resolve(
            FileConfig::default(),
            &overrides,
            getter(&[]),
            PathBuf::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("skynet"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let file = FileConfig {
            history: HistorySection {
                max_entries: Some(0),
                tag_matching: None,
            },
            ..Default::default()
        };
        assert!(Settings::resolve(file, &with_dir(), getter(&[]), PathBuf::new()).is_err());
    }

    #[test]
    fn key_is_masked() {
        let mut settings = resolve(FileConfig::default(), &with_dir(), &[]);
        assert_eq!(settings.masked_api_key(), "(not set)");
        settings.api_key = Some("sk-1234567890".to_string());
        assert_eq!(settings.masked_api_key(), "sk-1********");
        settings.api_key = Some("short".to_string());
        assert_eq!(settings.masked_api_key(), "********");
    }

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(file, FileConfig::default());
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "provider = [").unwrap();
        let err = FileConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
