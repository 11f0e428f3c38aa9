use crate::domain::{ParameterKey, ParameterRecord};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read parameter rows: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads exported parameter rows from CSV. Structural problems (broken
/// headers, ragged rows) fail the whole read; malformed numeric cells degrade
/// to empty fields and are left to the validation rules to call out.
pub fn parse_records<R: Read>(
    reader: R,
    source_id: &str,
) -> Result<Vec<ParameterRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<ParameterRow>() {
        let row = row?;
        records.push(row.into_record(source_id));
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ParameterRow {
    #[serde(rename = "Module")]
    module: String,
    #[serde(rename = "Part", default, deserialize_with = "empty_string_as_none")]
    part: Option<String>,
    #[serde(rename = "Item_Name")]
    item_name: String,
    #[serde(rename = "Value", default, deserialize_with = "empty_string_as_none")]
    value: Option<String>,
    #[serde(
        rename = "Min_Spec",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    min_spec: Option<String>,
    #[serde(
        rename = "Max_Spec",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    max_spec: Option<String>,
    #[serde(
        rename = "Confidence",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    confidence: Option<String>,
    #[serde(
        rename = "Checklist",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    checklist: Option<String>,
}

impl ParameterRow {
    fn into_record(self, source_id: &str) -> ParameterRecord {
        let key = ParameterKey::new(
            self.module,
            self.part.unwrap_or_default(),
            self.item_name,
        );
        let mut record =
            ParameterRecord::new(key, self.value.unwrap_or_default(), source_id).with_spec(
                self.min_spec.as_deref().and_then(parse_bound),
                self.max_spec.as_deref().and_then(parse_bound),
            );
        record.confidence_score = self.confidence.as_deref().and_then(parse_bound);
        record.is_checklist = self
            .checklist
            .as_deref()
            .map(is_truthy)
            .unwrap_or(false);
        record
    }
}

fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
