use crate::domain::{ParameterKey, ParameterRecord};
use crate::matcher::SourceSet;
use crate::normalize::Normalizer;
use crate::qc::rules::{QCEngine, ValidationConfig};
use crate::qc::scoring::{QCScoringSystem, ScoringConfig};
use crate::qc::{QCCategory, QCIssue, QCResult, QCSeverity};

pub(super) fn record(item: &str, value: &str) -> ParameterRecord {
    ParameterRecord::new(ParameterKey::new("M1", "PSU", item), value, "unit-a")
}

pub(super) fn source_set(records: Vec<ParameterRecord>) -> SourceSet {
    let mut set = SourceSet::new();
    set.add_source("unit-a", records).expect("unique label");
    set
}

pub(super) fn qc_engine() -> QCEngine {
    QCEngine::new(
        ValidationConfig::default(),
        ScoringConfig::default(),
        Normalizer::default(),
    )
    .expect("default configuration is valid")
}

pub(super) fn scoring_system() -> QCScoringSystem {
    QCScoringSystem::new(ScoringConfig::default()).expect("default configuration is valid")
}

pub(super) fn issue(category: QCCategory, severity: QCSeverity) -> QCIssue {
    QCIssue::new(
        category,
        severity,
        "synthetic finding",
        None,
        "Resolve the synthetic finding",
    )
}

pub(super) fn result_with(issues: Vec<QCIssue>) -> QCResult {
    let mut result = QCResult::new(10, vec!["unit-a".to_string()]);
    for issue in issues {
        result.add_issue(issue);
    }
    result
}
