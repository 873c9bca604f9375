use super::{App, read_input, truncate, write_output};
use crate::cli::{DeliveryArgs, PresetCommand};
use anyhow::{Result, anyhow, bail};
use console::style;
use ffai_store::presets::validate_parameters;
use ffai_store::{CatalogEntry, TemplateStore};
use ffai_types::{ParamValue, Preset, PresetDraft, PresetParameter};
use std::collections::BTreeMap;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::debug;

#[derive(Tabled)]
struct PresetRow {
    id: String,
    name: String,
    category: String,
    difficulty: String,
    #[tabled(rename = "uses")]
    usage: String,
    #[tabled(rename = "★")]
    common: &'static str,
}

impl From<&CatalogEntry<'_>> for PresetRow {
    fn from(entry: &CatalogEntry<'_>) -> Self {
        let preset = entry.preset();
        PresetRow {
            id: preset.id.clone(),
            name: preset.name.clone(),
            category: preset.category.clone(),
            difficulty: preset.difficulty.to_string(),
            usage: entry
                .usage_count()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            common: if preset.common_use { "★" } else { "" },
        }
    }
}

#[derive(Tabled)]
struct ParameterRow {
    name: String,
    #[tabled(rename = "type")]
    kind: String,
    required: &'static str,
    default: String,
    allowed: String,
    description: String,
}

impl From<&PresetParameter> for ParameterRow {
    fn from(param: &PresetParameter) -> Self {
        let allowed = if !param.options.is_empty() {
            param.options.join(" | ")
        } else if let Some(v) = &param.validation {
            match (v.min, v.max, &v.pattern) {
                (Some(min), Some(max), _) => format!("{min}..={max}"),
                (Some(min), None, _) => format!(">= {min}"),
                (None, Some(max), _) => format!("<= {max}"),
                (None, None, Some(pattern)) => pattern.clone(),
                (None, None, None) => String::new(),
            }
        } else {
            String::new()
        };
        ParameterRow {
            name: param.name.clone(),
            kind: param.kind.to_string(),
            required: if param.required { "yes" } else { "" },
            default: param
                .default
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            allowed,
            description: truncate(&param.description, 50),
        }
    }
}

fn print_presets(entries: &[CatalogEntry<'_>]) {
    if entries.is_empty() {
        println!("No presets found.");
        return;
    }
    let rows: Vec<PresetRow> = entries.iter().map(PresetRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
}

pub fn run(app: &App, cmd: PresetCommand) -> Result<()> {
    let mut store = app.presets();

    match cmd {
        PresetCommand::List {
            category,
            common,
            search,
        } => {
            let mut entries = match (&category, &search) {
                (_, Some(query)) => store.search_presets(query),
                (Some(category), None) => store.get_presets_by_category(category),
                (None, None) => store.get_all_presets(),
            };
            if let (Some(category), Some(_)) = (&category, &search) {
                entries.retain(|e| e.preset().category.eq_ignore_ascii_case(category));
            }
            if common {
                entries.retain(|e| e.preset().common_use);
            }
            print_presets(&entries);
        }
        PresetCommand::Show { id } => {
            let entry = lookup(&store, &id)?;
            show_preset(entry);
        }
        PresetCommand::Categories => {
            for category in store.get_categories() {
                let count = store.get_presets_by_category(&category).len();
                println!("{category} ({count})");
            }
        }
        PresetCommand::Use {
            id,
            params,
            delivery,
        } => use_preset(app, &mut store, &id, &params, delivery)?,
        PresetCommand::Add {
            name,
            category,
            prompt,
            description,
            tags,
        } => {
            let mut draft = PresetDraft::new(&name, &category, &prompt);
            draft.description = description.unwrap_or_default();
            draft.tags = tags;
            let id = store.add_custom_preset(draft)?;
            println!("✓ Added preset {id}");
        }
        PresetCommand::Remove { id } => {
            if store.delete_custom_preset(&id)? {
                println!("✓ Removed preset {id}");
            } else if store.get_preset_by_id(&id).is_some() {
                bail!("'{id}' is a built-in preset and cannot be removed");
            } else {
                bail!("preset '{id}' not found");
            }
        }
        PresetCommand::Export { output } => {
            write_output(&store.export_presets()?, output.as_deref())?;
        }
        PresetCommand::Import { file } => {
            let data = read_input(&file)?;
            let imported = store.import_custom_presets(&data)?;
            println!("✓ Imported {imported} custom presets");
        }
    }
    Ok(())
}

fn lookup<'a>(store: &'a TemplateStore, id: &str) -> Result<CatalogEntry<'a>> {
    store
        .get_preset_by_id(id)
        .ok_or_else(|| anyhow!("preset '{id}' not found"))
}

/// Coerce `NAME=VALUE` pairs against the preset's declared parameters.
fn collect_values(
    preset: &Preset,
    params: &[(String, String)],
) -> Result<BTreeMap<String, ParamValue>> {
    let mut values = BTreeMap::new();
    for (name, raw) in params {
        let Some(param) = preset.parameter(name) else {
            let known: Vec<&str> = preset.parameters.iter().map(|p| p.name.as_str()).collect();
            bail!(
                "preset '{}' has no parameter '{name}' (expected one of: {})",
                preset.id,
                known.join(", ")
            );
        };
        values.insert(name.clone(), param.coerce(raw)?);
    }
    Ok(values)
}

fn use_preset(
    app: &App,
    store: &mut TemplateStore,
    id: &str,
    params: &[(String, String)],
    delivery: DeliveryArgs,
) -> Result<()> {
    let (prompt, category) = {
        let preset = lookup(store, id)?.preset();
        let values = collect_values(preset, params)?;
        let issues = validate_parameters(preset, &values);
        if !issues.is_empty() {
            let details: Vec<String> = issues.iter().map(|i| format!("  - {i}")).collect();
            bail!("invalid parameters for '{id}':\n{}", details.join("\n"));
        }
        (
            store.build_prompt_from_preset(id, &values)?,
            preset.category.clone(),
        )
    };

    eprintln!("{} {prompt}", style("prompt:").for_stderr().dim());
    let generated = app.generate(&prompt, Some(category.as_str()))?;
    store.increment_usage_count(id)?;
    debug!("preset {id} produced {}", generated.id);
    app.deliver(&generated.command, delivery)
}

fn show_preset(entry: CatalogEntry<'_>) {
    let preset = entry.preset();
    let kind = if entry.is_custom() { "custom" } else { "built-in" };
    println!(
        "{} {}",
        style(&preset.name).for_stdout().bold(),
        style(format!("({}, {kind})", preset.id)).for_stdout().dim()
    );
    if !preset.description.is_empty() {
        println!("{}", preset.description);
    }
    println!("category:   {}", preset.category);
    println!("difficulty: {}", preset.difficulty);
    if let Some(uses) = entry.usage_count() {
        println!("uses:       {uses}");
    }
    if !preset.tags.is_empty() {
        println!("tags:       {}", preset.tags.join(", "));
    }
    println!("template:   {}", style(&preset.prompt).for_stdout().cyan());

    if !preset.parameters.is_empty() {
        let rows: Vec<ParameterRow> = preset.parameters.iter().map(ParameterRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{table}");
    }
    for example in &preset.examples {
        println!("example:    {example}");
    }
}
