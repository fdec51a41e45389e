use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(match serde_json::to_value(value)? {
        Value::Array(items) => render_rows(&items),
        Value::Object(map) => render_record(map),
        scalar => table::render(&["value"], &[vec![cell(&scalar)]], options()),
    })
}

/// One object: a field/value table, fields sorted by name.
fn render_record(map: Map<String, Value>) -> String {
    let rows = map
        .iter()
        .map(|(key, value)| vec![key.clone(), cell(value)])
        .collect::<Vec<_>>();
    table::render(&["field", "value"], &rows, options())
}

/// A list: one row per item, one column per field any item has.
fn render_rows(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }
    if !items.iter().all(Value::is_object) {
        let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
        return table::render(&["value"], &rows, options());
    }

    let mut headers = Vec::<String>::new();
    for key in items.iter().filter_map(Value::as_object).flat_map(Map::keys) {
        if !headers.contains(key) {
            headers.push(key.clone());
        }
    }

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    table::render(&header_refs, &rows, options())
}

/// Collapse a JSON value into one table cell.
///
/// Nested records that appear throughout Stash output get a readable summary:
/// project matches, tag sets, capture states and saga progress.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) if items.is_empty() => String::from("-"),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(items) => format!("{} items", items.len()),
        Value::Object(map) => summarize(map),
    }
}

fn summarize(map: &Map<String, Value>) -> String {
    if let (Some(name), Some(confidence)) = (map.get("name"), map.get("confidence")) {
        return format!("{} ({}%)", cell(name), cell(confidence));
    }
    if let Some(status) = map.get("status").and_then(Value::as_str) {
        return match map.get("project_match") {
            Some(Value::Object(project_match)) => format!("{status}: {}", summarize(project_match)),
            _ => status.to_string(),
        };
    }
    if let Some(time) = map.get("time") {
        let mut parts = vec![cell(time)];
        if let Some(energy) = map.get("energy").and_then(Value::as_str) {
            parts.push(format!("energy {energy}"));
        }
        if let Some(Value::Array(contexts)) = map.get("contexts") {
            parts.extend(contexts.iter().filter_map(Value::as_str).map(String::from));
        }
        return parts.join(" ");
    }
    if let Some(kind) = map
        .get("step")
        .and_then(|step| step.get("kind"))
        .and_then(Value::as_str)
    {
        return kind.to_string();
    }
    serde_json::to_string(map).unwrap_or_else(|_| String::from("<invalid-json>"))
}
