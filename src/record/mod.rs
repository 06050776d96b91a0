use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column titles for the eight record attributes, in canonical order.
pub const COLUMN_TITLES: [&str; 8] = [
    "ID",
    "Name",
    "Quantity",
    "Restock Level",
    "Restock Count",
    "Condition",
    "First Entry Date",
    "Last Restock Date",
];

/// A scalar attribute as the server sent it. Integers are the usual shape,
/// but text and any other JSON value still decode and display as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(i64),
    Text(String),
    Other(Value),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Other(v) => write!(f, "{v}"),
        }
    }
}

/// A calendar date, or the raw text when the server used another layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordDate {
    Date(NaiveDate),
    Text(String),
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDate::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RecordDate::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    New,
    OpenBox,
    Used,
    #[default]
    Unknown,
    Other(String),
}

impl Condition {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "NEW" => Self::New,
            "OPEN_BOX" => Self::OpenBox,
            "USED" => Self::Used,
            "UNKNOWN" | "" => Self::Unknown,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "NEW",
            Self::OpenBox => "OPEN_BOX",
            Self::Used => "USED",
            Self::Unknown => "UNKNOWN",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.as_str().to_string()
    }
}

/// One inventory item as the API returns it.
///
/// Every attribute is optional so that a partial response still decodes, and
/// the scalar attributes accept whatever shape the server chose; callers
/// decide what an absent attribute means.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    #[serde(default)]
    pub id: Option<Scalar>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<Scalar>,
    #[serde(default)]
    pub restock_level: Option<Scalar>,
    #[serde(default)]
    pub restock_count: Option<Scalar>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub first_entry_date: Option<RecordDate>,
    #[serde(default)]
    pub last_restock_date: Option<RecordDate>,
}

fn opt_text<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

impl InventoryRecord {
    /// Attribute values as display text, in the order of [`COLUMN_TITLES`].
    pub fn display_values(&self) -> [String; 8] {
        [
            opt_text(&self.id),
            opt_text(&self.name),
            opt_text(&self.quantity),
            opt_text(&self.restock_level),
            opt_text(&self.restock_count),
            opt_text(&self.condition),
            opt_text(&self.first_entry_date),
            opt_text(&self.last_restock_date),
        ]
    }
}
