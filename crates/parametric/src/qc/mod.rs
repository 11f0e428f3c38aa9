pub mod report;
pub mod rules;
pub mod scoring;

#[cfg(test)]
mod tests;

pub use rules::{QCEngine, ValidationConfig, ValidationRule};
pub use scoring::{Grade, QCScoringSystem, ScoringConfig};

use crate::domain::ParameterKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How much a finding matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QCSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QCSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub const fn ordered() -> [QCSeverity; 4] {
        [Self::Low, Self::Medium, Self::High, Self::Critical]
    }
}

/// Which quality dimension a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QCCategory {
    Performance,
    Consistency,
    Completeness,
    Accuracy,
    Naming,
}

impl QCCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Performance => "Performance",
            Self::Consistency => "Consistency",
            Self::Completeness => "Completeness",
            Self::Accuracy => "Accuracy",
            Self::Naming => "Naming",
        }
    }

    pub const fn ordered() -> [QCCategory; 5] {
        [
            Self::Performance,
            Self::Consistency,
            Self::Completeness,
            Self::Accuracy,
            Self::Naming,
        ]
    }
}

/// Points at the record a finding is about. Run-level findings (for example a
/// failing rule) carry no item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRef {
    pub key: ParameterKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl ItemRef {
    pub fn new(key: ParameterKey, source_id: Option<String>) -> Self {
        Self { key, source_id }
    }

    pub fn label(&self) -> String {
        match &self.source_id {
            Some(source) => format!("{} [{}]", self.key.label(), source),
            None => self.key.label(),
        }
    }
}

/// One quality finding. Every issue names a concrete next step in
/// `recommended_action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QCIssue {
    pub category: QCCategory,
    pub severity: QCSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemRef>,
    pub recommended_action: String,
    pub score_impact: f64,
    pub raised_at: DateTime<Utc>,
}

impl QCIssue {
    pub fn new(
        category: QCCategory,
        severity: QCSeverity,
        message: impl Into<String>,
        item: Option<ItemRef>,
        recommended_action: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            item,
            recommended_action: recommended_action.into(),
            score_impact: 0.0,
            raised_at: Utc::now(),
        }
    }
}

/// Outcome of one validation pass. Holds the findings and run metadata only;
/// every score is recomputed from these fields on demand, so a result can
/// never disagree with its own issue list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QCResult {
    pub total_items: usize,
    pub issues: Vec<QCIssue>,
    pub sources: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl QCResult {
    pub fn new(total_items: usize, sources: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            total_items,
            issues: Vec::new(),
            sources,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn add_issue(&mut self, issue: QCIssue) {
        self.issues.push(issue);
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn count_by_severity(&self, severity: QCSeverity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    pub fn count_by_category(&self, category: QCCategory) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.category == category)
            .count()
    }
}
