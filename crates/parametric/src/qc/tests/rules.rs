use super::common::*;
use crate::domain::{ParameterKey, ParameterRecord};
use crate::matcher::SourceSet;
use crate::normalize::Normalizer;
use crate::qc::rules::{QCEngine, RuleError, ValidationConfig, ValidationRule};
use crate::qc::scoring::ScoringConfig;
use crate::qc::{QCCategory, QCIssue, QCSeverity};

#[test]
fn flags_absent_values_as_completeness_findings() {
    let engine = qc_engine();
    let set = source_set(vec![record("Voltage", "-"), record("Current", "1.5")]);

    let result = engine.run(&set);

    let missing: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.category == QCCategory::Completeness)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].severity, QCSeverity::Medium);
    assert!(missing[0].message.contains("Voltage"));
}

#[test]
fn flags_incomplete_identity_as_high_severity() {
    let engine = qc_engine();
    let set = source_set(vec![ParameterRecord::new(
        ParameterKey::new("", "PSU", "Voltage"),
        "5.0",
        "unit-a",
    )]);

    let result = engine.run(&set);

    assert!(result.issues.iter().any(|issue| {
        issue.category == QCCategory::Completeness
            && issue.severity == QCSeverity::High
            && issue.message.contains("identity")
    }));
}

#[test]
fn an_empty_part_is_an_identity_finding_too() {
    let engine = qc_engine();
    let set = source_set(vec![ParameterRecord::new(
        ParameterKey::new("M1", " ", "Voltage"),
        "5.0",
        "unit-a",
    )]);

    let result = engine.run(&set);

    assert!(result.issues.iter().any(|issue| {
        issue.category == QCCategory::Completeness
            && issue.severity == QCSeverity::High
            && issue.message.contains("identity")
    }));
}

#[test]
fn flags_every_row_of_a_duplicated_key() {
    let engine = qc_engine();
    let set = source_set(vec![
        record("Voltage", "5.0"),
        record("Voltage", "5.1"),
        record("Current", "1.5"),
    ]);

    let result = engine.run(&set);

    let duplicates: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.category == QCCategory::Consistency)
        .collect();
    assert_eq!(duplicates.len(), 2);
    assert!(duplicates.iter().all(|issue| {
        issue.severity == QCSeverity::High && issue.message.contains("2 times")
    }));
}

#[test]
fn duplicate_findings_scale_with_the_number_of_copies() {
    let engine = qc_engine();
    let set = source_set(vec![
        record("Voltage", "5.0"),
        record("Voltage", "5.1"),
        record("Voltage", "5.2"),
    ]);

    let result = engine.run(&set);

    let duplicates: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.category == QCCategory::Consistency)
        .collect();
    assert_eq!(duplicates.len(), 3);
    assert!(duplicates
        .iter()
        .all(|issue| issue.message.contains("3 times")));
}

#[test]
fn flags_naming_convention_violations() {
    let engine = qc_engine();
    let long_name = "X".repeat(51);
    let set = source_set(vec![
        record("9starts_with_digit", "1"),
        record("has space", "2"),
        record(&long_name, "3"),
        record("Valid_Name-1.2", "4"),
    ]);

    let result = engine.run(&set);

    let naming: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.category == QCCategory::Naming)
        .collect();
    assert_eq!(naming.len(), 3);
    assert!(naming.iter().all(|issue| issue.severity == QCSeverity::Low));
}

#[test]
fn name_length_counts_characters_not_bytes() {
    let engine = qc_engine();
    // 26 characters, 78 bytes: breaks the ASCII pattern but not the limit.
    let hangul_name = "전압".repeat(13);
    let set = source_set(vec![record(&hangul_name, "5.0")]);

    let result = engine.run(&set);

    let naming: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.category == QCCategory::Naming)
        .collect();
    assert_eq!(naming.len(), 1);
    assert!(!naming[0].message.contains("longer than"));
}

#[test]
fn flags_values_outside_their_own_specification() {
    let engine = qc_engine();
    let set = source_set(vec![
        record("Voltage", "120").with_spec(Some(90.0), Some(110.0)),
        record("Current", "2.0").with_spec(Some(1.0), Some(3.0)),
        record("Ripple", "noisy").with_spec(Some(0.0), Some(0.5)),
    ]);

    let result = engine.run(&set);

    let accuracy: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.category == QCCategory::Accuracy)
        .collect();
    assert_eq!(accuracy.len(), 2);
    assert!(accuracy
        .iter()
        .any(|issue| issue.message.contains("outside the specification range")));
    assert!(accuracy
        .iter()
        .any(|issue| issue.message.contains("is not a number")));
}

#[test]
fn flags_checklist_items_without_full_bounds() {
    let engine = qc_engine();
    let set = source_set(vec![
        record("Voltage", "5.0")
            .with_spec(Some(4.5), None)
            .checklist(),
        record("Current", "1.5")
            .with_spec(Some(1.0), Some(3.0))
            .checklist(),
    ]);

    let result = engine.run(&set);

    let spec_issues: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.message.contains("missing specification bounds"))
        .collect();
    assert_eq!(spec_issues.len(), 1);
    assert_eq!(spec_issues[0].severity, QCSeverity::High);
}

#[test]
fn flags_low_confidence_checklist_items() {
    let engine = qc_engine();
    let set = source_set(vec![
        record("Voltage", "5.0")
            .with_spec(Some(4.5), Some(5.5))
            .with_confidence(0.6)
            .checklist(),
        record("Current", "1.5")
            .with_spec(Some(1.0), Some(3.0))
            .with_confidence(0.95)
            .checklist(),
        // Low confidence on a non-checklist record is not a finding.
        record("Ripple", "0.1").with_confidence(0.2),
    ]);

    let result = engine.run(&set);

    let confidence: Vec<_> = result
        .issues
        .iter()
        .filter(|issue| issue.category == QCCategory::Performance)
        .collect();
    assert_eq!(confidence.len(), 1);
    assert_eq!(confidence[0].severity, QCSeverity::High);
    assert!(confidence[0].message.contains("0.60"));
}

#[test]
fn clean_sources_produce_no_findings() {
    let engine = qc_engine();
    let set = source_set(vec![
        record("Voltage", "5.0").with_spec(Some(4.5), Some(5.5)),
        record("Current", "1.5"),
    ]);

    let result = engine.run(&set);

    assert_eq!(result.total_items, 2);
    assert!(result.issues.is_empty());
}

#[test]
fn every_finding_carries_an_action_and_an_impact() {
    let engine = qc_engine();
    let set = source_set(vec![
        record("Voltage", "-"),
        record("Voltage", "5.1"),
        record("9bad", "x").with_spec(Some(0.0), Some(1.0)),
    ]);

    let result = engine.run(&set);

    assert!(!result.issues.is_empty());
    for issue in &result.issues {
        assert!(!issue.recommended_action.is_empty());
        assert!(issue.score_impact > 0.0);
    }
}

struct FailingRule;

impl ValidationRule for FailingRule {
    fn name(&self) -> &'static str {
        "always-fails"
    }

    fn check(
        &self,
        _set: &SourceSet,
        _normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        Err(RuleError {
            detail: "lookup table unavailable".to_string(),
        })
    }
}

struct CountingRule;

impl ValidationRule for CountingRule {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn check(
        &self,
        set: &SourceSet,
        _normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        Ok(set
            .iter()
            .flat_map(|(_, records)| records.iter())
            .map(|record| {
                QCIssue::new(
                    QCCategory::Naming,
                    QCSeverity::Low,
                    format!("saw {}", record.key.parameter_name()),
                    None,
                    "No action needed",
                )
            })
            .collect())
    }
}

#[test]
fn a_failing_rule_becomes_a_finding_without_stopping_the_pass() {
    let engine = QCEngine::with_rules(
        vec![Box::new(FailingRule), Box::new(CountingRule)],
        ScoringConfig::default(),
        Normalizer::default(),
    )
    .expect("valid configuration");
    let set = source_set(vec![record("Voltage", "5.0")]);

    let result = engine.run(&set);

    let failure = result
        .issues
        .iter()
        .find(|issue| issue.message.contains("always-fails"))
        .expect("rule failure reported");
    assert_eq!(failure.category, QCCategory::Accuracy);
    assert_eq!(failure.severity, QCSeverity::Medium);

    // The rule after the failing one still ran.
    assert!(result.issues.iter().any(|issue| issue.message == "saw PSU_Voltage"));
}

#[test]
fn rejects_an_invalid_naming_pattern_eagerly() {
    let config = ValidationConfig {
        naming_pattern: "([unclosed".to_string(),
        ..ValidationConfig::default()
    };
    let result = QCEngine::new(config, ScoringConfig::default(), Normalizer::default());
    assert!(matches!(
        result,
        Err(crate::error::EngineError::InvalidPattern { .. })
    ));
}
