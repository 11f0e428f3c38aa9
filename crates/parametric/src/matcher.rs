use crate::domain::{ParameterKey, ParameterRecord};
use crate::error::EngineError;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Labeled record collections staged for alignment. Labels must be unique;
/// registering the same label twice is a caller contract violation and fails
/// eagerly.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    sources: Vec<(String, Vec<ParameterRecord>)>,
    reference: Option<(String, Vec<ParameterRecord>)>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(
        &mut self,
        label: impl Into<String>,
        records: Vec<ParameterRecord>,
    ) -> Result<(), EngineError> {
        let label = label.into();
        if self.contains_label(&label) {
            return Err(EngineError::DuplicateSource { label });
        }
        self.sources.push((label, records));
        Ok(())
    }

    pub fn set_reference(
        &mut self,
        label: impl Into<String>,
        records: Vec<ParameterRecord>,
    ) -> Result<(), EngineError> {
        let label = label.into();
        if self.contains_label(&label) {
            return Err(EngineError::DuplicateSource { label });
        }
        self.reference = Some((label, records));
        Ok(())
    }

    fn contains_label(&self, label: &str) -> bool {
        self.sources.iter().any(|(existing, _)| existing == label)
            || self
                .reference
                .as_ref()
                .is_some_and(|(existing, _)| existing == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.sources.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParameterRecord])> {
        self.sources
            .iter()
            .map(|(label, records)| (label.as_str(), records.as_slice()))
    }

    pub fn reference(&self) -> Option<(&str, &[ParameterRecord])> {
        self.reference
            .as_ref()
            .map(|(label, records)| (label.as_str(), records.as_slice()))
    }

    /// Aligns every source (and the reference, when present) on the union of
    /// parameter keys. Absent parameters stay visible as empty slots. Within
    /// one source the first occurrence of a key wins; duplicates are left to
    /// the consistency validation rule to report.
    pub fn align(&self) -> MatchTable {
        let mut indexes: Vec<HashMap<&ParameterKey, &ParameterRecord>> = Vec::new();
        for (_, records) in &self.sources {
            let mut index = HashMap::new();
            for record in records {
                index.entry(&record.key).or_insert(record);
            }
            indexes.push(index);
        }

        let mut reference_index: HashMap<&ParameterKey, &ParameterRecord> = HashMap::new();
        if let Some((_, records)) = &self.reference {
            for record in records {
                reference_index.entry(&record.key).or_insert(record);
            }
        }

        let mut keys: BTreeSet<&ParameterKey> = BTreeSet::new();
        for index in &indexes {
            keys.extend(index.keys());
        }
        keys.extend(reference_index.keys());

        let mut rows = BTreeMap::new();
        for key in keys {
            let slots = indexes
                .iter()
                .map(|index| index.get(key).map(|record| (*record).clone()))
                .collect();
            let reference = reference_index.get(key).map(|record| (*record).clone());
            rows.insert(key.clone(), AlignedRow { slots, reference });
        }

        MatchTable {
            sources: self.sources.iter().map(|(label, _)| label.clone()).collect(),
            rows,
        }
    }
}

/// Per-key view across every source, in source registration order.
#[derive(Debug, Clone)]
pub struct AlignedRow {
    pub slots: Vec<Option<ParameterRecord>>,
    pub reference: Option<ParameterRecord>,
}

/// Alignment of all sources on the union of their keys. Rows iterate in key
/// order, which keeps downstream output deterministic.
#[derive(Debug, Clone)]
pub struct MatchTable {
    pub sources: Vec<String>,
    pub rows: BTreeMap<ParameterKey, AlignedRow>,
}

impl MatchTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(module: &str, item: &str, value: &str, source: &str) -> ParameterRecord {
        ParameterRecord::new(ParameterKey::new(module, "", item), value, source)
    }

    #[test]
    fn aligns_on_the_union_of_keys() {
        let mut set = SourceSet::new();
        set.add_source(
            "unit-a",
            vec![
                record("M1", "Voltage", "5.0", "unit-a"),
                record("M1", "Current", "1.2", "unit-a"),
            ],
        )
        .expect("unique label");
        set.add_source("unit-b", vec![record("M1", "Voltage", "5.1", "unit-b")])
            .expect("unique label");

        let table = set.align();
        assert_eq!(table.len(), 2);

        let current = table
            .rows
            .get(&ParameterKey::new("M1", "", "Current"))
            .expect("current row");
        assert!(current.slots[0].is_some());
        assert!(current.slots[1].is_none());
    }

    #[test]
    fn first_occurrence_wins_for_duplicate_keys() {
        let mut set = SourceSet::new();
        set.add_source(
            "unit-a",
            vec![
                record("M1", "Voltage", "5.0", "unit-a"),
                record("M1", "Voltage", "9.9", "unit-a"),
            ],
        )
        .expect("unique label");

        let table = set.align();
        let row = table
            .rows
            .get(&ParameterKey::new("M1", "", "Voltage"))
            .expect("voltage row");
        let kept = row.slots[0].as_ref().expect("slot filled");
        assert_eq!(kept.raw_value, "5.0");
    }

    #[test]
    fn rejects_duplicate_source_labels() {
        let mut set = SourceSet::new();
        set.add_source("unit-a", Vec::new()).expect("unique label");
        let err = set.add_source("unit-a", Vec::new()).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSource { label } if label == "unit-a"));
    }

    #[test]
    fn reference_label_shares_the_namespace() {
        let mut set = SourceSet::new();
        set.add_source("golden", Vec::new()).expect("unique label");
        let err = set.set_reference("golden", Vec::new()).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSource { .. }));
    }
}
