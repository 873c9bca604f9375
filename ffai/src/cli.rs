use clap::{Args, Parser, Subcommand};
use ffai_types::ExportFormat;
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "ffai", author, version, about, long_about = None)]
pub struct Cli {
    /// openai, openrouter, groq, ollama or custom
    #[arg(long, global = true)]
    pub provider: Option<String>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Where history, presets and the log file live
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an ffmpeg command from a description
    Gen(GenArgs),
    /// Browse, use and manage prompt presets
    #[command(subcommand)]
    Preset(PresetCommand),
    /// Inspect and manage generation history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Show the effective configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// What to do with a command once it is known.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct DeliveryArgs {
    /// Copy the command to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Run the command after generating it
    #[arg(long)]
    pub run: bool,

    /// Do not ask before running
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct GenArgs {
    /// Task description, e.g. "convert in.mov to mp4"
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[command(flatten)]
    pub delivery: DeliveryArgs,
}

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// List presets
    List {
        #[arg(long)]
        category: Option<String>,
        /// Only commonly used presets
        #[arg(long)]
        common: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a preset and its parameters
    Show { id: String },
    /// List preset categories
    Categories,
    /// Fill in a preset and generate a command from it
    Use {
        id: String,
        /// Parameter value, repeatable
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
        #[command(flatten)]
        delivery: DeliveryArgs,
    },
    /// Create a custom preset
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        /// Template text with {placeholders}
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a custom preset
    Remove { id: String },
    /// Write all presets as JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import custom presets from a JSON file
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Most recent entries
    List {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    Favorites,
    /// Entries run more than once
    Top {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    Search { query: String },
    Tag { tag: String },
    Category { category: String },
    Show { id: String },
    /// Toggle the favorite flag
    Fav { id: String },
    AddTags {
        id: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    SetCategory { id: String, category: String },
    Delete { id: String },
    /// Remove every entry
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove non-favorite entries older than N days
    Prune {
        #[arg(long)]
        days: u32,
    },
    Stats,
    Export {
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Import {
        file: PathBuf,
        #[arg(long, default_value = "json")]
        format: ExportFormat,
    },
    /// Print (and optionally run) a stored command again
    Rerun {
        id: String,
        #[command(flatten)]
        delivery: DeliveryArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    /// Print the config file location
    Path,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
