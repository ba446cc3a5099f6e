//! Shared output formatting for CLI commands
//!
//! JSON for scripts, aligned key/value rows for people.

use anyhow::{Context, Result};
use serde::Serialize;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => anyhow::bail!("Unsupported output format: '{}'. Use 'json' or 'table'.", s),
        }
    }
}

/// Print data as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Render `(label, value)` rows with the labels padded to one width
pub fn render_rows(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("{:<width$}  {}", label, value, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print data in the requested format; `rows` is the table rendering
pub fn print_output<T: Serialize>(
    data: &T,
    rows: &[(&str, String)],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Table => {
            println!("{}", render_rows(rows));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_rows_aligns_labels() {
        let rendered = render_rows(&[
            ("mode", "combined".to_string()),
            ("region", "us-west-2".to_string()),
        ]);
        assert_eq!(rendered, "mode    combined\nregion  us-west-2");
    }
}
