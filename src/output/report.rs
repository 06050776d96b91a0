use super::escape_markup;
use crate::record::{InventoryRecord, COLUMN_TITLES};

/// The results table fragment: one header row, then one `row_<i>` per record
/// in input order. Cell text is escaped.
pub fn render_html_table(records: &[InventoryRecord]) -> String {
    let mut table = String::from(r#"<table class="table table-striped" cellpadding="10">"#);
    table.push_str("<thead><tr>");
    for title in COLUMN_TITLES {
        table.push_str(&format!(r#"<th class="col-md-2">{title}</th>"#));
    }
    table.push_str("</tr></thead><tbody>");
    for (i, record) in records.iter().enumerate() {
        table.push_str(&format!(r#"<tr id="row_{i}">"#));
        for value in record.display_values() {
            table.push_str("<td>");
            table.push_str(&escape_markup(&value));
            table.push_str("</td>");
        }
        table.push_str("</tr>");
    }
    table.push_str("</tbody></table>");
    table
}

pub fn render_html(records: &[InventoryRecord]) -> Vec<u8> {
    let table = render_html_table(records);
    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Inventory Search Results</title>
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@3.4.1/dist/css/bootstrap.min.css" rel="stylesheet"/>
</head>
<body>
  <div class="container">
    <h3>Search Results</h3>
    <p class="text-muted">{count} record(s)</p>
    <div id="search_results">{table}</div>
  </div>
</body>
</html>
"####,
        count = records.len(),
    );
    html.into_bytes()
}
