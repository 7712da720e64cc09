use crate::OutputFormat;
use anyhow::{Context, Result};
use quicklaunch_core::SelectorTable;
use serde_json::Value;
use std::path::Path;

/// Load a selector table from a JSON file, or the built-in table
pub fn load(file: Option<&Path>) -> Result<SelectorTable> {
    let Some(file) = file else {
        return Ok(SelectorTable::default());
    };

    tracing::info!("Loading selector table from {}", file.display());
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let table = SelectorTable::from_json(&json)
        .with_context(|| format!("Invalid selector table in {}", file.display()))?;
    Ok(table)
}

pub fn execute(file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let table = load(file)?;

    match format {
        OutputFormat::Json => println!("{}", table.to_json_pretty()?),
        OutputFormat::Table => output_table(&table)?,
        OutputFormat::Pretty => output_pretty(&table, file)?,
    }

    Ok(())
}

/// `(category, field, value)` rows, sorted by category then field
fn rows(table: &SelectorTable) -> Result<Vec<(String, String, String)>> {
    let value = serde_json::to_value(table)?;
    let mut rows = Vec::new();

    if let Value::Object(categories) = value {
        for (category, fields) in categories {
            let Value::Object(fields) = fields else {
                continue;
            };
            for (field, value) in fields {
                let rendered = match value {
                    Value::String(s) => s,
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(" | "),
                    other => other.to_string(),
                };
                rows.push((category.clone(), field, rendered));
            }
        }
    }

    Ok(rows)
}

fn output_pretty(table: &SelectorTable, file: Option<&Path>) -> Result<()> {
    use console::style;

    let source = file
        .map(|f| f.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    println!(
        "\n{}",
        style(format!("Selector Table v{} ({})", table.version, source))
            .bold()
            .cyan()
    );

    let mut current = String::new();
    for (category, field, value) in rows(table)? {
        if category != current {
            println!("\n{}", style(&category).bold());
            current = category;
        }
        println!("  {:<22} {}", field, style(value).green());
    }

    println!();
    Ok(())
}

fn output_table(table: &SelectorTable) -> Result<()> {
    println!("Category,Field,Value");
    for (category, field, value) in rows(table)? {
        println!("{},{},\"{}\"", category, field, value.replace('"', "\"\""));
    }
    Ok(())
}
