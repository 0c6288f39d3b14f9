//! Printing of records and schemas.

use contacts_core::{Record, TableSchema};

use crate::config::DisplayStyle;

const CELL_WIDTH: usize = 40;
const VALUE_WIDTH: usize = 20;

/// Renders records in the requested style, one line per record.
///
/// No records renders as the empty string, in either style.
pub fn render_records(records: &[Record], style: DisplayStyle) -> Result<String, String> {
    match style {
        DisplayStyle::Dict => render_dict(records),
        DisplayStyle::Tabular => Ok(render_tabular(records)),
    }
}

fn render_dict(records: &[Record]) -> Result<String, String> {
    let mut out = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| format!("Failed to serialize record: {e}"))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

fn cell(text: &str) -> String {
    format!("|{:<CELL_WIDTH$}", format!("{text:>VALUE_WIDTH$}"))
}

fn render_tabular(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };

    let mut out = String::new();
    for name in first.columns() {
        out.push_str(&cell(name));
    }
    out.push_str("|\n");

    for record in records {
        for (_, value) in record.iter() {
            let text = value.map(ToString::to_string).unwrap_or_default();
            out.push_str(&cell(&text));
        }
        out.push_str("|\n");
    }
    out
}

/// Renders a table schema as `column: TYPE` lines, identity first.
pub fn render_schema(schema: &TableSchema) -> String {
    let mut out = format!("{}\n", schema.name);
    for column in &schema.columns {
        out.push_str(&format!("  {}: {}\n", column.name, column.declared_type));
    }
    out
}
