use serde::{Deserialize, Serialize};

/// Identity of one equipment parameter. Matching is exact and case-sensitive
/// on all three components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterKey {
    pub module: String,
    pub part: String,
    pub item_name: String,
}

impl ParameterKey {
    pub fn new(
        module: impl Into<String>,
        part: impl Into<String>,
        item_name: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            part: part.into(),
            item_name: item_name.into(),
        }
    }

    /// Composed display name, `{part}_{item_name}` when a part is present.
    pub fn parameter_name(&self) -> String {
        crate::catalog::compose_parameter_name(&self.part, &self.item_name)
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.module, self.parameter_name())
    }
}

/// One observed parameter reading from a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub key: ParameterKey,
    pub raw_value: String,
    pub source_id: String,
    #[serde(default)]
    pub min_spec: Option<f64>,
    #[serde(default)]
    pub max_spec: Option<f64>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub is_checklist: bool,
}

impl ParameterRecord {
    pub fn new(
        key: ParameterKey,
        raw_value: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            key,
            raw_value: raw_value.into(),
            source_id: source_id.into(),
            min_spec: None,
            max_spec: None,
            confidence_score: None,
            is_checklist: false,
        }
    }

    pub fn with_spec(mut self, min_spec: Option<f64>, max_spec: Option<f64>) -> Self {
        self.min_spec = min_spec;
        self.max_spec = max_spec;
        self
    }

    pub fn with_confidence(mut self, confidence_score: f64) -> Self {
        self.confidence_score = Some(confidence_score);
        self
    }

    pub fn checklist(mut self) -> Self {
        self.is_checklist = true;
        self
    }
}
