use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::InventoryRecord;

pub const DEFAULT_CONDITION: &str = "UNKNOWN";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Name,
    Quantity,
    RestockLevel,
    RestockCount,
    Condition,
    FirstEntryDate,
    LastRestockDate,
}

impl Field {
    /// Canonical order, shared by the payload, the query builder and the table.
    pub const ALL: [Field; 8] = [
        Field::Id,
        Field::Name,
        Field::Quantity,
        Field::RestockLevel,
        Field::RestockCount,
        Field::Condition,
        Field::FirstEntryDate,
        Field::LastRestockDate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Quantity => "quantity",
            Field::RestockLevel => "restock_level",
            Field::RestockCount => "restock_count",
            Field::Condition => "condition",
            Field::FirstEntryDate => "first_entry_date",
            Field::LastRestockDate => "last_restock_date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Field::ALL.into_iter().find(|f| f.key() == normalized)
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::Id | Field::Quantity | Field::RestockLevel | Field::RestockCount
        )
    }

    fn default_text(self) -> &'static str {
        match self {
            Field::Condition => DEFAULT_CONDITION,
            _ => "",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The eight text inputs of the form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormFields {
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub restock_level: String,
    pub restock_count: String,
    pub condition: String,
    pub first_entry_date: String,
    pub last_restock_date: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            quantity: String::new(),
            restock_level: String::new(),
            restock_count: String::new(),
            condition: DEFAULT_CONDITION.to_string(),
            first_entry_date: String::new(),
            last_restock_date: String::new(),
        }
    }
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Id => &self.id,
            Field::Name => &self.name,
            Field::Quantity => &self.quantity,
            Field::RestockLevel => &self.restock_level,
            Field::RestockCount => &self.restock_count,
            Field::Condition => &self.condition,
            Field::FirstEntryDate => &self.first_entry_date,
            Field::LastRestockDate => &self.last_restock_date,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Id => &mut self.id,
            Field::Name => &mut self.name,
            Field::Quantity => &mut self.quantity,
            Field::RestockLevel => &mut self.restock_level,
            Field::RestockCount => &mut self.restock_count,
            Field::Condition => &mut self.condition,
            Field::FirstEntryDate => &mut self.first_entry_date,
            Field::LastRestockDate => &mut self.last_restock_date,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }

    /// Resets a single field to its default text.
    pub fn reset(&mut self, field: Field) {
        self.set(field, field.default_text());
    }

    /// Writes every field from `record`. Absent attributes write the field's
    /// default, so no value from a previous record survives.
    pub fn populate(&mut self, record: &InventoryRecord) {
        let values = record.display_values();
        for (field, value) in Field::ALL.into_iter().zip(values) {
            if value.is_empty() {
                self.reset(field);
            } else {
                self.set(field, value);
            }
        }
    }

    /// Resets every field except the identifier.
    pub fn clear_except_id(&mut self) {
        for field in Field::ALL.into_iter().filter(|f| *f != Field::Id) {
            self.reset(field);
        }
    }

    pub fn condition_is_unknown(&self) -> bool {
        self.condition.trim().eq_ignore_ascii_case(DEFAULT_CONDITION)
    }

    /// Request body for create and update: exactly the eight keys.
    ///
    /// Numeric fields go out as integers when their text parses as one and as
    /// the raw text otherwise; the server owns validation.
    pub fn payload(&self) -> Value {
        let mut out = Map::new();
        for field in Field::ALL {
            let text = self.get(field);
            let value = if field == Field::Condition {
                if self.condition_is_unknown() {
                    Value::Null
                } else {
                    Value::String(text.to_string())
                }
            } else if field.is_numeric() {
                match text.trim().parse::<i64>() {
                    Ok(n) => Value::from(n),
                    Err(_) => Value::String(text.to_string()),
                }
            } else {
                Value::String(text.to_string())
            };
            out.insert(field.key().to_string(), value);
        }
        Value::Object(out)
    }
}

/// Everything the page used to show: inputs, the flash slot and the last
/// search table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    pub fields: FormFields,
    pub flash: Option<String>,
    pub results: Option<Vec<InventoryRecord>>,
}

impl FormState {
    /// Empties the identifier, every field and the flash slot. The results
    /// table stays as it was.
    pub fn clear_all(&mut self) {
        self.fields = FormFields::default();
        self.flash = None;
    }
}

#[derive(Debug, Error)]
pub enum FormFileError {
    #[error("failed to read form file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse form file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write form file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize form state: {source}")]
    Serialize {
        #[source]
        source: serde_yaml::Error,
    },
}

/// Loads the saved form. A missing file is an empty form.
pub fn load_form(path: &Path) -> Result<FormState, FormFileError> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(FormState::default()),
        Ok(contents) => {
            serde_yaml::from_str::<FormState>(&contents).map_err(|e| FormFileError::Parse {
                path: path.display().to_string(),
                source: e,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FormState::default()),
        Err(e) => Err(FormFileError::Read {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

pub fn save_form(path: &Path, state: &FormState) -> Result<(), FormFileError> {
    let contents =
        serde_yaml::to_string(state).map_err(|e| FormFileError::Serialize { source: e })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FormFileError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, contents).map_err(|e| FormFileError::Write {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Scalar;

    fn filled() -> FormFields {
        FormFields {
            id: "42".to_string(),
            name: "bolt".to_string(),
            quantity: "10".to_string(),
            restock_level: "5".to_string(),
            restock_count: "2".to_string(),
            condition: "USED".to_string(),
            first_entry_date: "2023-01-02".to_string(),
            last_restock_date: "2023-03-04".to_string(),
        }
    }

    #[test]
    fn payload_has_exactly_eight_keys() {
        let payload = filled().payload();
        let obj = payload.as_object().unwrap();
        assert_eq!(obj.len(), 8);
        for field in Field::ALL {
            assert!(obj.contains_key(field.key()), "missing {field}");
        }
        assert_eq!(obj["condition"], Value::String("USED".to_string()));
        assert_eq!(obj["quantity"], Value::from(10));
        assert_eq!(obj["first_entry_date"], Value::String("2023-01-02".into()));
    }

    #[test]
    fn payload_sends_unknown_condition_as_null() {
        let mut fields = filled();
        fields.condition = "UNKNOWN".to_string();
        assert_eq!(fields.payload()["condition"], Value::Null);
        fields.condition = "Unknown".to_string();
        assert_eq!(fields.payload()["condition"], Value::Null);
    }

    #[test]
    fn payload_passes_other_conditions_through_unchanged() {
        let mut fields = filled();
        fields.condition = "refurbished".to_string();
        assert_eq!(
            fields.payload()["condition"],
            Value::String("refurbished".to_string())
        );
    }

    #[test]
    fn payload_keeps_non_numeric_text_verbatim() {
        let mut fields = filled();
        fields.quantity = "lots".to_string();
        fields.restock_level = String::new();
        let payload = fields.payload();
        assert_eq!(payload["quantity"], Value::String("lots".to_string()));
        assert_eq!(payload["restock_level"], Value::String(String::new()));
    }

    #[test]
    fn populate_overwrites_every_field() {
        let mut fields = filled();
        let record = InventoryRecord {
            id: Some(Scalar::Number(9)),
            name: Some("washer".to_string()),
            ..Default::default()
        };
        fields.populate(&record);
        assert_eq!(fields.id, "9");
        assert_eq!(fields.name, "washer");
        assert_eq!(fields.quantity, "");
        assert_eq!(fields.condition, DEFAULT_CONDITION);
        assert_eq!(fields.last_restock_date, "");
    }

    #[test]
    fn clear_except_id_keeps_identifier() {
        let mut fields = filled();
        fields.clear_except_id();
        assert_eq!(fields.id, "42");
        assert_eq!(
            fields,
            FormFields {
                id: "42".to_string(),
                ..FormFields::default()
            }
        );
    }

    #[test]
    fn field_parse_accepts_dashes() {
        assert_eq!(Field::parse("restock-level"), Some(Field::RestockLevel));
        assert_eq!(Field::parse("ID"), Some(Field::Id));
        assert_eq!(Field::parse("price"), None);
    }

    #[test]
    fn form_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("form.yml");
        assert_eq!(load_form(&path).unwrap(), FormState::default());

        let state = FormState {
            fields: filled(),
            flash: Some("Success".to_string()),
            results: Some(vec![]),
        };
        save_form(&path, &state).unwrap();
        assert_eq!(load_form(&path).unwrap(), state);
    }
}
