//! Natural language to ffmpeg command generation.

use anyhow::{Result, bail};
use ffai_openai::ChatGptClient;
use ffai_store::{HistoryStore, NewEntry};
use tracing::{debug, warn};

pub const SYSTEM_MESSAGE: &str = "You are an ffmpeg expert. Convert the user's request into a single \
ffmpeg command line that can be pasted into a POSIX shell. \
Use the file names the user gives; when none are given use input.mp4 and a sensible output name. \
Prefer widely supported codecs and add -y only when the user asks to overwrite. \
Output ONLY the command. Do not output explanations or markdown code blocks.";

const FENCE_LANGUAGES: [&str; 5] = ["bash", "sh", "shell", "console", "zsh"];

/// Anything that can turn a prompt into a command line.
pub trait CommandGenerator {
    /// Provider name recorded in history.
    fn provider(&self) -> &str;
    fn default_model(&self) -> &str;
    fn generate(
        &self,
        prompt: &str,
        system_message: Option<&str>,
        model: Option<&str>,
    ) -> Result<String>;
}

impl CommandGenerator for ChatGptClient {
    fn provider(&self) -> &str {
        ChatGptClient::provider(self).name()
    }

    fn default_model(&self) -> &str {
        ChatGptClient::default_model(self)
    }

    fn generate(
        &self,
        prompt: &str,
        system_message: Option<&str>,
        model: Option<&str>,
    ) -> Result<String> {
        Ok(ChatGptClient::generate(self, prompt, system_message, model)?)
    }
}

/// Strip markdown fences and a leading shell prompt from model output.
pub fn sanitize_command(content: &str) -> String {
    let content = content.trim().trim_matches('`').trim();
    let content = FENCE_LANGUAGES
        .iter()
        .find_map(|lang| {
            content
                .strip_prefix(lang)
                .filter(|rest| rest.starts_with('\n'))
        })
        .unwrap_or(content);
    let content = content.trim();
    content
        .strip_prefix("$ ")
        .unwrap_or(content)
        .trim()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub id: String,
    pub command: String,
}

/// Ask `generator` for a command and record the attempt in `history`.
///
/// Failures are recorded with an empty command and the error text, then returned.
pub fn generate_command(
    generator: &dyn CommandGenerator,
    history: &mut HistoryStore,
    prompt: &str,
    model: Option<&str>,
    category: Option<&str>,
) -> Result<Generated> {
    let model = model.unwrap_or_else(|| generator.default_model()).to_string();
    let entry = |command: &str| {
        NewEntry::new(prompt, command, generator.provider())
            .model(Some(model.as_str()))
            .category(category)
    };

    debug!("generating with {} / {model}: {prompt}", generator.provider());
    let outcome = generator
        .generate(prompt, Some(SYSTEM_MESSAGE), Some(model.as_str()))
        .and_then(|raw| {
            let command = sanitize_command(&raw);
            if command.is_empty() {
                bail!("the model returned an empty command");
            }
            Ok(command)
        });

    match outcome {
        Ok(command) => {
            let id = history.add(entry(&command))?;
            Ok(Generated { id, command })
        }
        Err(err) => {
            warn!("generation failed: {err:#}");
            history.add(entry("").error(Some(format!("{err:#}").as_str())))?;
            Err(err)
        }
    }
}
