use serde::{Deserialize, Serialize};

use crate::form::{Field, FormFields};

/// Ordered query parameters with a single encoding rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded`, pairs joined by `&`.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.pairs.iter() {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

pub const DEFAULT_SEARCH_FIELDS: [Field; 4] =
    [Field::Id, Field::Name, Field::Quantity, Field::Condition];

/// Which form fields take part in a search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub fields: Vec<Field>,
    /// Send the quantity text under `name` whenever another filter precedes
    /// it, matching the query older front ends produced.
    pub legacy_name_filter: bool,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            fields: DEFAULT_SEARCH_FIELDS.to_vec(),
            legacy_name_filter: false,
        }
    }
}

impl SearchFilters {
    pub fn is_enabled(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Builds the search query from the non-empty enabled fields, in
    /// canonical field order. An `UNKNOWN` condition counts as empty.
    pub fn build_query(&self, form: &FormFields) -> QueryParams {
        let mut params = QueryParams::new();
        for field in Field::ALL.into_iter().filter(|f| self.is_enabled(*f)) {
            let value = form.get(field).trim();
            if value.is_empty() {
                continue;
            }
            if field == Field::Condition && form.condition_is_unknown() {
                continue;
            }
            if field == Field::Name && self.legacy_name_filter && !params.is_empty() {
                params.push(field.key(), form.get(Field::Quantity).trim());
                continue;
            }
            params.push(field.key(), value);
        }
        params
    }
}

pub fn parse_search_fields_csv(value: &str) -> Result<Vec<Field>, String> {
    let mut out: Vec<Field> = Vec::new();
    for part in value.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let field = Field::parse(item).ok_or_else(|| format!("unknown field '{item}'"))?;
        if !out.contains(&field) {
            out.push(field);
        }
    }
    if out.is_empty() {
        return Err("search field list is empty".to_string());
    }
    Ok(out)
}
