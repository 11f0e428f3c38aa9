use crate::domain::{ParameterKey, ParameterRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source label attached to records materialized from default entries.
pub const DEFAULT_SOURCE_ID: &str = "default";

/// A class of equipment whose parameters share one default table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One row of an equipment type's default parameter table, as maintained by
/// the calling application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultParameterEntry {
    pub equipment_type: String,
    pub module: String,
    pub part: String,
    pub item_name: String,
    pub default_value: String,
    #[serde(default)]
    pub min_spec: Option<f64>,
    #[serde(default)]
    pub max_spec: Option<f64>,
    #[serde(default)]
    pub occurrence_count: u32,
    #[serde(default)]
    pub total_files: u32,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub source_files: Vec<String>,
    #[serde(default)]
    pub is_checklist: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DefaultParameterEntry {
    pub fn key(&self) -> ParameterKey {
        ParameterKey::new(
            self.module.clone(),
            self.part.clone(),
            self.item_name.clone(),
        )
    }

    pub fn parameter_name(&self) -> String {
        compose_parameter_name(&self.part, &self.item_name)
    }

    /// Materializes the entry as a reference record for comparison runs.
    pub fn to_record(&self) -> ParameterRecord {
        let mut record =
            ParameterRecord::new(self.key(), self.default_value.clone(), DEFAULT_SOURCE_ID)
                .with_spec(self.min_spec, self.max_spec);
        record.confidence_score = self.confidence_score;
        record.is_checklist = self.is_checklist;
        record
    }
}

/// Kind of mutation proposed against a default parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Add,
    Update,
    Delete,
}

impl ChangeType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// One proposed mutation. The engine only produces these; applying them is
/// the calling application's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub change_type: ChangeType,
    pub equipment_type: String,
    pub parameter_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Diffs an incoming default table against the current one, keyed on the
/// parameter identity. Output is ordered by key.
pub fn diff_entries(
    current: &[DefaultParameterEntry],
    incoming: &[DefaultParameterEntry],
) -> Vec<ChangeRecord> {
    let current_by_key: BTreeMap<ParameterKey, &DefaultParameterEntry> =
        current.iter().map(|entry| (entry.key(), entry)).collect();
    let incoming_by_key: BTreeMap<ParameterKey, &DefaultParameterEntry> =
        incoming.iter().map(|entry| (entry.key(), entry)).collect();

    let now = Utc::now();
    let mut changes = Vec::new();

    for (key, entry) in &incoming_by_key {
        match current_by_key.get(key) {
            None => changes.push(ChangeRecord {
                change_type: ChangeType::Add,
                equipment_type: entry.equipment_type.clone(),
                parameter_name: entry.parameter_name(),
                old_value: None,
                new_value: Some(entry.default_value.clone()),
                changed_at: now,
            }),
            Some(existing) if existing.default_value != entry.default_value => {
                changes.push(ChangeRecord {
                    change_type: ChangeType::Update,
                    equipment_type: entry.equipment_type.clone(),
                    parameter_name: entry.parameter_name(),
                    old_value: Some(existing.default_value.clone()),
                    new_value: Some(entry.default_value.clone()),
                    changed_at: now,
                });
            }
            Some(_) => {}
        }
    }

    for (key, entry) in &current_by_key {
        if !incoming_by_key.contains_key(key) {
            changes.push(ChangeRecord {
                change_type: ChangeType::Delete,
                equipment_type: entry.equipment_type.clone(),
                parameter_name: entry.parameter_name(),
                old_value: Some(entry.default_value.clone()),
                new_value: None,
                changed_at: now,
            });
        }
    }

    changes
}

/// `{part}_{item_name}` when a part exists, bare `{item_name}` otherwise.
pub fn compose_parameter_name(part: &str, item_name: &str) -> String {
    let part = part.trim();
    if part.is_empty() {
        item_name.trim().to_string()
    } else {
        format!("{}_{}", part, item_name.trim())
    }
}

/// Inverse of [`compose_parameter_name`], splitting on the first underscore.
pub fn split_parameter_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('_') {
        Some((part, item)) if !part.is_empty() => (Some(part), item),
        _ => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(item: &str, value: &str) -> DefaultParameterEntry {
        let now = Utc::now();
        DefaultParameterEntry {
            equipment_type: "pump".to_string(),
            module: "M1".to_string(),
            part: "PSU".to_string(),
            item_name: item.to_string(),
            default_value: value.to_string(),
            min_spec: None,
            max_spec: None,
            occurrence_count: 3,
            total_files: 4,
            confidence_score: Some(0.75),
            source_files: vec!["unit-a.csv".to_string()],
            is_checklist: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn compose_and_split_round_trip() {
        let name = compose_parameter_name("PSU", "Voltage");
        assert_eq!(name, "PSU_Voltage");
        assert_eq!(split_parameter_name(&name), (Some("PSU"), "Voltage"));
        assert_eq!(split_parameter_name("Voltage"), (None, "Voltage"));
        assert_eq!(compose_parameter_name("", "Voltage"), "Voltage");
    }

    #[test]
    fn entry_materializes_as_a_reference_record() {
        let mut entry = entry("Voltage", "5.0");
        entry.min_spec = Some(4.5);
        entry.max_spec = Some(5.5);
        entry.is_checklist = true;

        let record = entry.to_record();
        assert_eq!(record.source_id, DEFAULT_SOURCE_ID);
        assert_eq!(record.raw_value, "5.0");
        assert_eq!(record.min_spec, Some(4.5));
        assert_eq!(record.confidence_score, Some(0.75));
        assert!(record.is_checklist);
    }

    #[test]
    fn diff_reports_adds_updates_and_deletes() {
        let current = vec![entry("Voltage", "5.0"), entry("Current", "1.5")];
        let incoming = vec![entry("Voltage", "5.2"), entry("Ripple", "0.1")];

        let changes = diff_entries(&current, &incoming);
        assert_eq!(changes.len(), 3);

        let update = changes
            .iter()
            .find(|change| change.change_type == ChangeType::Update)
            .expect("update present");
        assert_eq!(update.parameter_name, "PSU_Voltage");
        assert_eq!(update.old_value.as_deref(), Some("5.0"));
        assert_eq!(update.new_value.as_deref(), Some("5.2"));

        assert!(changes
            .iter()
            .any(|change| change.change_type == ChangeType::Add
                && change.parameter_name == "PSU_Ripple"));
        assert!(changes
            .iter()
            .any(|change| change.change_type == ChangeType::Delete
                && change.parameter_name == "PSU_Current"));
    }

    #[test]
    fn unchanged_entries_produce_no_change_records() {
        let current = vec![entry("Voltage", "5.0")];
        let incoming = vec![entry("Voltage", "5.0")];
        assert!(diff_entries(&current, &incoming).is_empty());
    }
}
