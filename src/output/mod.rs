pub mod report;

use colored::Colorize;

use crate::controller::{DELETED_MESSAGE, SUCCESS_MESSAGE};
use crate::form::{Field, FormState};
use crate::record::{InventoryRecord, COLUMN_TITLES};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Xml,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".xml") {
        return Some(OutputFormat::Xml);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(records: &[InventoryRecord], format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(records).into_bytes(),
        OutputFormat::Json => render_json(records),
        OutputFormat::Xml => render_xml(records),
        OutputFormat::Html => report::render_html(records),
    }
}

/// Column-aligned table, header first, rows in input order.
pub fn render_text(records: &[InventoryRecord]) -> String {
    let rows: Vec<[String; 8]> = records.iter().map(|r| r.display_values()).collect();
    let mut widths: Vec<usize> = COLUMN_TITLES.iter().map(|t| t.len()).collect();
    for row in rows.iter() {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: Vec<&str>| {
        let line = cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    };
    push_row(COLUMN_TITLES.to_vec());
    for row in rows.iter() {
        push_row(row.iter().map(|s| s.as_str()).collect());
    }
    out
}

pub fn render_json(records: &[InventoryRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub(crate) fn escape_markup(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render_xml(records: &[InventoryRecord]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str("<inventory>\n");
    for r in records {
        out.push_str("  <item>\n");
        for (field, value) in Field::ALL.iter().zip(r.display_values()) {
            let key = field.key();
            out.push_str(&format!("    <{key}>{}</{key}>\n", escape_markup(&value)));
        }
        out.push_str("  </item>\n");
    }
    out.push_str("</inventory>\n");
    out.into_bytes()
}

fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<17}: {}", label, value)
}

/// The form as the terminal shows it: one line per field.
pub fn format_form(state: &FormState) -> String {
    let mut out = String::new();
    for field in Field::ALL {
        out.push_str(&format_kv_line(field.key(), state.fields.get(field)));
        out.push('\n');
    }
    out
}

pub fn format_flash(flash: Option<&str>) -> Option<String> {
    let message = flash?;
    let tag = if message == SUCCESS_MESSAGE || message == DELETED_MESSAGE {
        "OK".bold().green()
    } else {
        "ERR".bold().red()
    };
    Some(format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        message.bold()
    ))
}

pub fn print_state(state: &FormState, show_results: bool) {
    print!("{}", format_form(state));
    if show_results {
        if let Some(results) = state.results.as_ref() {
            println!();
            print!("{}", render_text(results));
            println!(":: {} record(s)", results.len());
        }
    }
    if let Some(line) = format_flash(state.flash.as_deref()) {
        println!();
        println!("{line}");
    }
}
