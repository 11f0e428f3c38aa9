use super::scoring::ScoringConfig;
use super::{ItemRef, QCCategory, QCIssue, QCResult, QCSeverity};
use crate::error::EngineError;
use crate::matcher::SourceSet;
use crate::normalize::{NormalizedValue, Normalizer};
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Tunables for the validation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    pub naming_pattern: String,
    pub max_name_length: usize,
    pub confidence_threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            naming_pattern: "^[A-Za-z][A-Za-z0-9_.-]*$".to_string(),
            max_name_length: 50,
            confidence_threshold: 0.8,
        }
    }
}

#[derive(Debug, Error)]
#[error("{detail}")]
pub struct RuleError {
    pub detail: String,
}

/// One independent validation check. Rules only observe; they never mutate
/// the staged sources.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, set: &SourceSet, normalizer: &Normalizer)
        -> Result<Vec<QCIssue>, RuleError>;
}

/// Runs every rule over a source set and collects the findings. A rule that
/// fails outright is reported as a finding itself rather than aborting the
/// pass.
pub struct QCEngine {
    rules: Vec<Box<dyn ValidationRule>>,
    scoring: ScoringConfig,
    normalizer: Normalizer,
}

impl QCEngine {
    pub fn new(
        validation: ValidationConfig,
        scoring: ScoringConfig,
        normalizer: Normalizer,
    ) -> Result<Self, EngineError> {
        scoring.validate()?;
        let rules = default_rules(&validation)?;
        Ok(Self {
            rules,
            scoring,
            normalizer,
        })
    }

    pub fn with_rules(
        rules: Vec<Box<dyn ValidationRule>>,
        scoring: ScoringConfig,
        normalizer: Normalizer,
    ) -> Result<Self, EngineError> {
        scoring.validate()?;
        Ok(Self {
            rules,
            scoring,
            normalizer,
        })
    }

    pub fn run(&self, set: &SourceSet) -> QCResult {
        let total_items = set.iter().map(|(_, records)| records.len()).sum();
        let sources = set.labels().iter().map(|label| label.to_string()).collect();
        let mut result = QCResult::new(total_items, sources);

        for rule in &self.rules {
            match rule.check(set, &self.normalizer) {
                Ok(issues) => {
                    for mut issue in issues {
                        issue.score_impact =
                            self.scoring.issue_impact(issue.category, issue.severity);
                        result.add_issue(issue);
                    }
                }
                Err(error) => {
                    warn!(rule = rule.name(), %error, "validation rule failed");
                    let mut issue = QCIssue::new(
                        QCCategory::Accuracy,
                        QCSeverity::Medium,
                        format!("validation rule '{}' failed: {}", rule.name(), error),
                        None,
                        "Review the rule configuration and the input data",
                    );
                    issue.score_impact =
                        self.scoring.issue_impact(issue.category, issue.severity);
                    result.add_issue(issue);
                }
            }
        }

        result.finished_at = chrono::Utc::now();
        result
    }
}

fn default_rules(
    config: &ValidationConfig,
) -> Result<Vec<Box<dyn ValidationRule>>, EngineError> {
    Ok(vec![
        Box::new(MissingValueRule),
        Box::new(DuplicateKeyRule),
        Box::new(NamingRule::new(config)?),
        Box::new(RangeRule),
        Box::new(ChecklistSpecRule),
        Box::new(ConfidenceRule {
            threshold: config.confidence_threshold,
        }),
    ])
}

/// Flags records without a usable value or with an incomplete identity.
pub struct MissingValueRule;

impl ValidationRule for MissingValueRule {
    fn name(&self) -> &'static str {
        "missing-value"
    }

    fn check(
        &self,
        set: &SourceSet,
        normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        let mut issues = Vec::new();
        for (label, records) in set.iter() {
            for record in records {
                let item = ItemRef::new(record.key.clone(), Some(label.to_string()));

                if record.key.module.trim().is_empty()
                    || record.key.part.trim().is_empty()
                    || record.key.item_name.trim().is_empty()
                {
                    issues.push(QCIssue::new(
                        QCCategory::Completeness,
                        QCSeverity::High,
                        "parameter identity is incomplete",
                        Some(item.clone()),
                        "Fill in the module, part and item name columns",
                    ));
                }

                if normalizer.normalize(&record.raw_value).is_absent() {
                    issues.push(QCIssue::new(
                        QCCategory::Completeness,
                        QCSeverity::Medium,
                        format!("no value recorded for {}", record.key.parameter_name()),
                        Some(item),
                        "Record a value or mark the parameter not applicable",
                    ));
                }
            }
        }
        Ok(issues)
    }
}

/// Flags parameter keys appearing more than once within a single source.
/// Matching keeps the first occurrence; this rule makes the shadowed rows
/// visible.
pub struct DuplicateKeyRule;

impl ValidationRule for DuplicateKeyRule {
    fn name(&self) -> &'static str {
        "duplicate-key"
    }

    fn check(
        &self,
        set: &SourceSet,
        _normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        let mut issues = Vec::new();
        for (label, records) in set.iter() {
            let mut counts = HashMap::new();
            for record in records {
                *counts.entry(&record.key).or_insert(0usize) += 1;
            }

            let mut duplicated: Vec<_> = counts
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .collect();
            duplicated.sort_by(|a, b| a.0.cmp(b.0));

            // One finding per duplicate row, so the deduction scales with
            // how many copies exist.
            for (key, count) in duplicated {
                for _ in 0..count {
                    issues.push(QCIssue::new(
                        QCCategory::Consistency,
                        QCSeverity::High,
                        format!(
                            "{} appears {} times in '{}'",
                            key.parameter_name(),
                            count,
                            label
                        ),
                        Some(ItemRef::new(key.clone(), Some(label.to_string()))),
                        "Remove or rename the duplicate rows so each parameter appears once",
                    ));
                }
            }
        }
        Ok(issues)
    }
}

/// Checks item names against the configured pattern and length limit.
pub struct NamingRule {
    pattern: Regex,
    max_length: usize,
}

impl NamingRule {
    pub fn new(config: &ValidationConfig) -> Result<Self, EngineError> {
        let pattern =
            Regex::new(&config.naming_pattern).map_err(|source| EngineError::InvalidPattern {
                pattern: config.naming_pattern.clone(),
                source,
            })?;
        Ok(Self {
            pattern,
            max_length: config.max_name_length,
        })
    }
}

impl ValidationRule for NamingRule {
    fn name(&self) -> &'static str {
        "naming-convention"
    }

    fn check(
        &self,
        set: &SourceSet,
        _normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        let mut issues = Vec::new();
        for (label, records) in set.iter() {
            for record in records {
                let name = &record.key.item_name;
                let item = ItemRef::new(record.key.clone(), Some(label.to_string()));

                if !self.pattern.is_match(name) {
                    issues.push(QCIssue::new(
                        QCCategory::Naming,
                        QCSeverity::Low,
                        format!("'{}' does not follow the naming convention", name),
                        Some(item.clone()),
                        "Rename to start with a letter, using only letters, digits, '_', '.' and '-'",
                    ));
                }
                if name.chars().count() > self.max_length {
                    issues.push(QCIssue::new(
                        QCCategory::Naming,
                        QCSeverity::Low,
                        format!("'{}' is longer than {} characters", name, self.max_length),
                        Some(item),
                        "Shorten the item name",
                    ));
                }
            }
        }
        Ok(issues)
    }
}

/// Validates recorded values against their own specification bounds.
pub struct RangeRule;

impl ValidationRule for RangeRule {
    fn name(&self) -> &'static str {
        "value-range"
    }

    fn check(
        &self,
        set: &SourceSet,
        normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        let mut issues = Vec::new();
        for (label, records) in set.iter() {
            for record in records {
                if record.min_spec.is_none() && record.max_spec.is_none() {
                    continue;
                }
                let item = ItemRef::new(record.key.clone(), Some(label.to_string()));

                match normalizer.normalize(&record.raw_value) {
                    NormalizedValue::Numeric(value) => {
                        let below = record.min_spec.is_some_and(|min| value < min);
                        let above = record.max_spec.is_some_and(|max| value > max);
                        if below || above {
                            issues.push(QCIssue::new(
                                QCCategory::Accuracy,
                                QCSeverity::Medium,
                                format!(
                                    "{} is outside the specification range",
                                    record.key.parameter_name()
                                ),
                                Some(item),
                                "Re-measure or correct the recorded value",
                            ));
                        }
                    }
                    NormalizedValue::Text(text) => {
                        issues.push(QCIssue::new(
                            QCCategory::Accuracy,
                            QCSeverity::Medium,
                            format!("'{}' is not a number but a specification range exists", text),
                            Some(item),
                            "Correct the value to a number within the specification range",
                        ));
                    }
                    NormalizedValue::Absent => {}
                }
            }
        }
        Ok(issues)
    }
}

/// Checklist parameters must carry a full specification range.
pub struct ChecklistSpecRule;

impl ValidationRule for ChecklistSpecRule {
    fn name(&self) -> &'static str {
        "checklist-spec"
    }

    fn check(
        &self,
        set: &SourceSet,
        _normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        let mut issues = Vec::new();
        for (label, records) in set.iter() {
            for record in records {
                if record.is_checklist
                    && (record.min_spec.is_none() || record.max_spec.is_none())
                {
                    issues.push(QCIssue::new(
                        QCCategory::Completeness,
                        QCSeverity::High,
                        format!(
                            "checklist parameter {} is missing specification bounds",
                            record.key.parameter_name()
                        ),
                        Some(ItemRef::new(record.key.clone(), Some(label.to_string()))),
                        "Add min and max specification values for this checklist item",
                    ));
                }
            }
        }
        Ok(issues)
    }
}

/// Checklist parameters whose recorded confidence falls under the threshold.
pub struct ConfidenceRule {
    pub threshold: f64,
}

impl ValidationRule for ConfidenceRule {
    fn name(&self) -> &'static str {
        "checklist-confidence"
    }

    fn check(
        &self,
        set: &SourceSet,
        _normalizer: &Normalizer,
    ) -> Result<Vec<QCIssue>, RuleError> {
        let mut issues = Vec::new();
        for (label, records) in set.iter() {
            for record in records {
                if !record.is_checklist {
                    continue;
                }
                if let Some(confidence) = record.confidence_score {
                    if confidence < self.threshold {
                        issues.push(QCIssue::new(
                            QCCategory::Performance,
                            QCSeverity::High,
                            format!(
                                "confidence {:.2} for {} is below the {:.2} threshold",
                                confidence,
                                record.key.parameter_name(),
                                self.threshold
                            ),
                            Some(ItemRef::new(record.key.clone(), Some(label.to_string()))),
                            "Re-verify this parameter against additional source files",
                        ));
                    }
                }
            }
        }
        Ok(issues)
    }
}
