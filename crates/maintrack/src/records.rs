//! Record types for maintrack.
//!
//! Each collection stores one of these types. Serialized field names match the
//! maintenance web page (`nombre`, `marca`, `equipo`, ...) so backups
//! written by it restore unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// A tracked physical asset.
///
/// Equipment has no stable id; other records refer to it by its position in
/// the equipment list at the moment they are created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Display name, and the checklist key.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Manufacturer.
    #[serde(rename = "marca", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Model designation.
    #[serde(rename = "modelo", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Year of manufacture or installation, free text.
    #[serde(rename = "anio", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Plant area or location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Rated power, free text.
    #[serde(rename = "potencia", default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    /// Equipment type.
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Free-form notes.
    #[serde(rename = "obs", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Equipment {
    /// Create equipment with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the brand.
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Check that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField` if the name is blank.
    pub fn validate(&self) -> Result<()> {
        require("equipment", "name", &self.name)
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.name,
            self.brand.as_deref().unwrap_or_default(),
            self.model.as_deref().unwrap_or_default()
        )
    }
}

/// A scheduled maintenance action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Equipment name copied when the task was created.
    #[serde(rename = "equipo", default)]
    pub equipment: String,
    /// Scheduled date, as entered.
    #[serde(rename = "fecha", default)]
    pub date: String,
    /// What to do.
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// How often, free text ("monthly", "500h", ...).
    #[serde(rename = "frecuencia", default)]
    pub frequency: String,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} ({})",
            self.date, self.equipment, self.description, self.frequency
        )
    }
}

/// A logged maintenance job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Equipment name copied when the order was created.
    #[serde(rename = "equipo", default)]
    pub equipment: String,
    /// Person responsible.
    #[serde(rename = "persona", default)]
    pub person: String,
    /// Date, as entered.
    #[serde(rename = "fecha", default)]
    pub date: String,
    /// Work performed or requested.
    #[serde(rename = "descripcion", default)]
    pub description: String,
}

impl fmt::Display for WorkOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} - {}",
            self.date, self.equipment, self.person, self.description
        )
    }
}

/// Request to schedule a task against the equipment at `equipment_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Index into the current equipment list.
    pub equipment_index: usize,
    /// Scheduled date.
    pub date: String,
    /// What to do.
    pub description: String,
    /// How often.
    pub frequency: String,
}

impl NewTask {
    /// Check that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField` naming the first blank field.
    pub fn validate(&self) -> Result<()> {
        require("task", "date", &self.date)?;
        require("task", "description", &self.description)?;
        require("task", "frequency", &self.frequency)
    }

    /// Build the stored task with the resolved equipment name.
    #[must_use]
    pub fn into_task(self, equipment: String) -> Task {
        Task {
            equipment,
            date: self.date,
            description: self.description,
            frequency: self.frequency,
        }
    }
}

/// Request to log a work order against the equipment at `equipment_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkOrder {
    /// Index into the current equipment list.
    pub equipment_index: usize,
    /// Person responsible.
    pub person: String,
    /// Date.
    pub date: String,
    /// Work performed or requested.
    pub description: String,
}

impl NewWorkOrder {
    /// Check that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingField` naming the first blank field.
    pub fn validate(&self) -> Result<()> {
        require("work order", "person", &self.person)?;
        require("work order", "date", &self.date)?;
        require("work order", "description", &self.description)
    }

    /// Build the stored work order with the resolved equipment name.
    #[must_use]
    pub fn into_work_order(self, equipment: String) -> WorkOrder {
        WorkOrder {
            equipment,
            person: self.person,
            date: self.date,
            description: self.description,
        }
    }
}

/// Checklist steps grouped by exact equipment name.
///
/// Keys are compared byte for byte: `"Chiller A"` and `"chiller a"` are
/// separate buckets.
///
/// Serializes as a JSON object. An empty JSON array also decodes, as an empty
/// mapping: the web page initialises the checklist as `[]` and its named
/// entries are dropped when stringified, so its backups carry `"checklist": []`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Checklists(BTreeMap<String, Vec<String>>);

/// Accepted encodings of [`Checklists`].
#[derive(Deserialize)]
#[serde(untagged)]
enum ChecklistsRepr {
    Map(BTreeMap<String, Vec<String>>),
    List(Vec<IgnoredAny>),
}

impl<'de> Deserialize<'de> for Checklists {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match ChecklistsRepr::deserialize(deserializer)? {
            ChecklistsRepr::Map(map) => Ok(Self(map)),
            ChecklistsRepr::List(items) if items.is_empty() => Ok(Self::default()),
            ChecklistsRepr::List(items) => Err(D::Error::invalid_length(
                items.len(),
                &"a map of equipment names or an empty array",
            )),
        }
    }
}

impl Checklists {
    /// Entries for `name`, empty if there is no bucket.
    #[must_use]
    pub fn entries_for(&self, name: &str) -> &[String] {
        self.0.get(name).map_or(&[], Vec::as_slice)
    }

    /// Append `text` to the bucket for `name`, creating it if needed.
    pub fn push(&mut self, name: &str, text: String) {
        self.0.entry(name.to_string()).or_default().push(text);
    }

    /// Drop the whole bucket for `name`. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name).is_some()
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total entries across all buckets.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

fn require(record: &'static str, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::missing_field(record, field))
    } else {
        Ok(())
    }
}
