use super::{App, read_input, truncate, write_output};
use crate::cli::HistoryCommand;
use crate::exec::confirm;
use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use console::style;
use ffai_store::NewEntry;
use ffai_types::{FavoriteToggle, HistoryEntry};
use std::io;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct HistoryRow {
    id: String,
    when: String,
    prompt: String,
    command: String,
    #[tabled(rename = "uses")]
    execution_count: u64,
    #[tabled(rename = "★")]
    favorite: &'static str,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        let command = if entry.is_failure() {
            format!("(failed) {}", entry.error.as_deref().unwrap_or_default())
        } else {
            entry.command.clone()
        };
        HistoryRow {
            id: entry.id.clone(),
            when: format_time(entry.timestamp),
            prompt: truncate(&entry.prompt, 40),
            command: truncate(&command, 60),
            execution_count: entry.execution_count,
            favorite: if entry.is_favorite { "★" } else { "" },
        }
    }
}

fn format_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn print_entries(entries: &[&HistoryEntry], empty: &str) {
    if entries.is_empty() {
        println!("{empty}");
        return;
    }
    let rows: Vec<HistoryRow> = entries.iter().map(|e| HistoryRow::from(*e)).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
}

pub fn run(app: &App, cmd: HistoryCommand) -> Result<()> {
    let mut store = app.history();

    match cmd {
        HistoryCommand::List { limit } => {
            print_entries(&store.get_recent(limit), "No history yet.");
        }
        HistoryCommand::Favorites => {
            print_entries(&store.get_favorites(), "No favorites.");
        }
        HistoryCommand::Top { limit } => {
            print_entries(
                &store.get_most_used(limit),
                "No command has been used more than once.",
            );
        }
        HistoryCommand::Search { query } => {
            print_entries(&store.search(&query), "No matching entries.");
        }
        HistoryCommand::Tag { tag } => {
            print_entries(&store.get_by_tag(&tag), "No entries with that tag.");
        }
        HistoryCommand::Category { category } => {
            print_entries(
                &store.get_by_category(&category),
                "No entries in that category.",
            );
        }
        HistoryCommand::Show { id } => {
            let Some(entry) = store.get(&id) else {
                bail!("history entry '{id}' not found");
            };
            show_entry(entry);
        }
        HistoryCommand::Fav { id } => match store.toggle_favorite(&id)? {
            FavoriteToggle::Toggled(true) => println!("★ Added {id} to favorites"),
            FavoriteToggle::Toggled(false) => println!("Removed {id} from favorites"),
            FavoriteToggle::NotFound => bail!("history entry '{id}' not found"),
        },
        HistoryCommand::AddTags { id, tags } => {
            if !store.add_tags(&id, tags.as_slice())? {
                bail!("history entry '{id}' not found");
            }
            println!("✓ Tagged {id}");
        }
        HistoryCommand::SetCategory { id, category } => {
            if !store.set_category(&id, &category)? {
                bail!("history entry '{id}' not found");
            }
            println!("✓ Set category of {id} to {category}");
        }
        HistoryCommand::Delete { id } => {
            if !store.delete(&id)? {
                bail!("history entry '{id}' not found");
            }
            println!("✓ Deleted {id}");
        }
        HistoryCommand::Clear { yes } => {
            let count = store.len();
            let question = format!("Delete all {count} history entries?");
            if !yes && !confirm(&question, &mut io::stdin().lock(), &mut io::stderr())? {
                println!("Cancelled.");
                return Ok(());
            }
            store.clear()?;
            println!("✓ Cleared {count} entries");
        }
        HistoryCommand::Prune { days } => {
            let removed = store.clear_old_entries(days)?;
            println!("✓ Removed {removed} entries older than {days} days");
        }
        HistoryCommand::Stats => show_stats(&store),
        HistoryCommand::Export { format, output } => {
            write_output(&store.export_history(format)?, output.as_deref())?;
        }
        HistoryCommand::Import { file, format } => {
            let data = read_input(&file)?;
            let summary = store.import_history(&data, format)?;
            println!(
                "✓ Imported {} entries ({} already present)",
                summary.inserted,
                summary.skipped()
            );
        }
        HistoryCommand::Rerun { id, delivery } => {
            let Some(entry) = store.get(&id).cloned() else {
                bail!("history entry '{id}' not found");
            };
            if entry.command.is_empty() {
                bail!(
                    "history entry '{id}' has no command (generation failed: {})",
                    entry.error.as_deref().unwrap_or("unknown error")
                );
            }
            store.add(
                NewEntry::new(&entry.prompt, &entry.command, &entry.provider)
                    .model(entry.model.as_deref())
                    .category(entry.category.as_deref()),
            )?;
            app.deliver(&entry.command, delivery)?;
        }
    }
    Ok(())
}

fn show_entry(entry: &HistoryEntry) {
    let label = |s: &str| style(format!("{s:>10}")).for_stdout().bold();
    println!("{} {}", label("id:"), entry.id);
    println!("{} {}", label("prompt:"), entry.prompt);
    if entry.is_failure() {
        println!(
            "{} {}",
            label("error:"),
            style(entry.error.as_deref().unwrap_or_default()).for_stdout().red()
        );
    } else {
        println!(
            "{} {}",
            label("command:"),
            style(&entry.command).for_stdout().green()
        );
    }
    println!("{} {}", label("provider:"), entry.provider);
    if let Some(model) = &entry.model {
        println!("{} {model}", label("model:"));
    }
    if let Some(category) = &entry.category {
        println!("{} {category}", label("category:"));
    }
    println!("{} {}", label("tags:"), entry.tags.join(", "));
    println!("{} {}", label("uses:"), entry.execution_count);
    println!(
        "{} {}",
        label("favorite:"),
        if entry.is_favorite { "yes" } else { "no" }
    );
    println!("{} {}", label("last used:"), format_time(entry.timestamp));
}

fn show_stats(store: &ffai_store::HistoryStore) {
    let stats = store.get_stats();
    let none = || "-".to_string();
    println!("Total entries:      {}", stats.total);
    println!("Favorites:          {}", stats.favorites);
    println!(
        "Most used provider: {}",
        stats.most_used_provider.unwrap_or_else(none)
    );
    println!(
        "Most used category: {}",
        stats.most_used_category.unwrap_or_else(none)
    );
    println!("Last 24 hours:      {}", stats.last_day);
    println!("Last 7 days:        {}", stats.last_week);
    println!("Last 30 days:       {}", stats.last_month);
}
