//! Subcommand handlers.

mod history;
mod preset;

use crate::cli::{Cli, Command, ConfigCommand, DeliveryArgs, GenArgs};
use crate::config::Settings;
use crate::errors::display_warning;
use crate::generate::{CommandGenerator, Generated, generate_command};
use crate::{clipboard, exec};
use anyhow::{Context as _, Result};
use console::style;
use ffai_openai::ChatGptClient;
use ffai_store::{HistoryStore, TemplateStore};
use ffai_types::LoadStatus;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Settings plus the handles every subcommand needs.
pub struct App {
    pub settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        App { settings }
    }

    pub fn history(&self) -> HistoryStore {
        let store = HistoryStore::open(self.settings.history_path())
            .with_max_entries(self.settings.max_entries)
            .with_tag_matching(self.settings.tag_matching);
        report_load(store.load_status());
        store
    }

    pub fn presets(&self) -> TemplateStore {
        let store = TemplateStore::open(self.settings.presets_path());
        report_load(store.load_status());
        store
    }

    pub fn generator(&self) -> Result<ChatGptClient> {
        Ok(ChatGptClient::try_from_config(&self.settings.openai_config())?)
    }

    /// Generate with the configured client and record the attempt.
    fn generate(&self, prompt: &str, category: Option<&str>) -> Result<Generated> {
        let generator = self.generator()?;
        self.generate_with(&generator, prompt, category)
    }

    fn generate_with(
        &self,
        generator: &dyn CommandGenerator,
        prompt: &str,
        category: Option<&str>,
    ) -> Result<Generated> {
        let mut history = self.history();
        generate_command(
            generator,
            &mut history,
            prompt,
            self.settings.model.as_deref(),
            category,
        )
    }

    /// Print a command, then copy and run it as requested.
    fn deliver(&self, command: &str, delivery: DeliveryArgs) -> Result<()> {
        println!("{}", style(command).for_stdout().green().bold());

        if delivery.copy || self.settings.auto_copy {
            if clipboard::copy(command) {
                eprintln!("✓ Copied to clipboard");
            } else {
                display_warning("could not access the clipboard");
            }
        }

        if delivery.run && !exec::execute(command, delivery.yes)? {
            eprintln!("Not run.");
        }
        Ok(())
    }
}

fn report_load(status: &LoadStatus) {
    if let LoadStatus::Recovered { warning } = status {
        display_warning(warning);
    }
}

pub fn run(cli: Cli, settings: Settings) -> Result<()> {
    let app = App::new(settings);
    debug!("command: {:?}", cli.command);
    match cli.command {
        Command::Gen(args) => gen_command(&app, args),
        Command::Preset(cmd) => preset::run(&app, cmd),
        Command::History(cmd) => history::run(&app, cmd),
        Command::Config(cmd) => config_command(&app, cmd),
    }
}

fn gen_command(app: &App, args: GenArgs) -> Result<()> {
    let prompt = args.prompt.join(" ");
    let generated = app.generate(&prompt, args.category.as_deref())?;
    app.deliver(&generated.command, args.delivery)
}

fn config_command(app: &App, cmd: ConfigCommand) -> Result<()> {
    let s = &app.settings;
    match cmd {
        ConfigCommand::Path => println!("{}", s.config_file.display()),
        ConfigCommand::Show => {
            let tag_matching = match s.tag_matching {
                ffai_store::TagMatching::Substring => "substring",
                ffai_store::TagMatching::Word => "word",
            };
            println!("provider      = {}", s.provider);
            println!("model         = {}", s.effective_model());
            println!(
                "base_url      = {}",
                s.openai_config().base_url().unwrap_or("(not set)")
            );
            println!("api_key       = {}", s.masked_api_key());
            println!("auto_copy     = {}", s.auto_copy);
            println!("data_dir      = {}", s.data_dir.display());
            println!("max_entries   = {}", s.max_entries);
            println!("tag_matching  = {tag_matching}");
            println!("config_file   = {}", s.config_file.display());
        }
    }
    Ok(())
}

/// Write `content` to `output`, or stdout when none is given.
fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("✓ Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ääääää", 3), "ää…");
    }
}
