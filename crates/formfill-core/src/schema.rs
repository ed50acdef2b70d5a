//! Form schema model
//!
//! Schemas are produced upstream (schema generation is not our concern) and
//! arrive either flat (`fields`) or grouped (`sections[].fields`). The core
//! only reads them.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Input type of a form field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text
    #[default]
    Text,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Calendar date
    Date,
    /// Numeric value
    Number,
    /// Checkbox / boolean
    Checkbox,
    /// One of a fixed set of options
    Select,
    /// Multi-line text
    Textarea,
    /// Any type string we do not model
    #[serde(other)]
    Other,
}

impl std::fmt::Display for FieldType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::Textarea => "textarea",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A single fillable field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Human-readable label as printed on the form
    #[serde(default)]
    pub label: String,
    /// Machine name (e.g. `last_name`), when the schema provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Input type
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    /// Whether the conversation must collect this field
    #[serde(default)]
    pub required: bool,
    /// Collected answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Field {
    /// Create a field with a label and value
    #[must_use = "field is created but not used"]
    pub fn with_value(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// The collected value, if it has any non-whitespace content
    #[inline]
    #[must_use = "filled value is returned but not used"]
    pub fn filled_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Label for display and logs, falling back to the machine name
    #[inline]
    #[must_use = "display label is returned but not used"]
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            self.name.as_deref().unwrap_or("")
        } else {
            &self.label
        }
    }
}

/// A named group of fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Fields in this section
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A form schema, flat or sectioned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Form title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,
    /// Top-level fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    /// Sectioned fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

impl FormSchema {
    /// Create a flat schema
    #[must_use = "schema is created but not used"]
    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Read a schema from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a schema.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let schema: Self = serde_json::from_reader(BufReader::new(file))?;
        log::debug!(
            "Loaded schema {} with {} fields",
            path.display(),
            schema.field_count()
        );
        Ok(schema)
    }

    /// All fields as one sequence: top-level fields, then each section's
    /// fields in order
    pub fn flatten_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.fields.iter()))
    }

    /// Number of fields across all sections
    #[inline]
    #[must_use = "field count is returned but not used"]
    pub fn field_count(&self) -> usize {
        self.flatten_fields().count()
    }
}
