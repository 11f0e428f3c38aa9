use super::{QCCategory, QCIssue, QCResult, QCSeverity};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Per-severity weights, in deduction points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

/// Per-category values, reused for importance weights and deduction caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryValues {
    pub performance: f64,
    pub consistency: f64,
    pub completeness: f64,
    pub accuracy: f64,
    pub naming: f64,
}

impl CategoryValues {
    fn get(&self, category: QCCategory) -> f64 {
        match category {
            QCCategory::Performance => self.performance,
            QCCategory::Consistency => self.consistency,
            QCCategory::Completeness => self.completeness,
            QCCategory::Accuracy => self.accuracy,
            QCCategory::Naming => self.naming,
        }
    }
}

/// Weights, caps, and effort estimates driving the score. Validated eagerly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub severity_weights: SeverityWeights,
    pub category_weights: CategoryValues,
    pub max_deductions: CategoryValues,
    pub effort_scores: SeverityWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            severity_weights: SeverityWeights {
                low: 1.0,
                medium: 2.0,
                high: 5.0,
                critical: 10.0,
            },
            category_weights: CategoryValues {
                performance: 1.5,
                consistency: 0.8,
                completeness: 1.0,
                accuracy: 1.2,
                naming: 0.5,
            },
            max_deductions: CategoryValues {
                performance: 30.0,
                consistency: 15.0,
                completeness: 20.0,
                accuracy: 25.0,
                naming: 10.0,
            },
            effort_scores: SeverityWeights {
                low: 1.0,
                medium: 2.0,
                high: 4.0,
                critical: 8.0,
            },
        }
    }
}

impl ScoringConfig {
    pub fn severity_weight(&self, severity: QCSeverity) -> f64 {
        match severity {
            QCSeverity::Low => self.severity_weights.low,
            QCSeverity::Medium => self.severity_weights.medium,
            QCSeverity::High => self.severity_weights.high,
            QCSeverity::Critical => self.severity_weights.critical,
        }
    }

    pub fn category_weight(&self, category: QCCategory) -> f64 {
        self.category_weights.get(category)
    }

    pub fn max_deduction(&self, category: QCCategory) -> f64 {
        self.max_deductions.get(category)
    }

    pub fn effort(&self, severity: QCSeverity) -> f64 {
        match severity {
            QCSeverity::Low => self.effort_scores.low,
            QCSeverity::Medium => self.effort_scores.medium,
            QCSeverity::High => self.effort_scores.high,
            QCSeverity::Critical => self.effort_scores.critical,
        }
    }

    /// Deduction one issue contributes to its category.
    pub fn issue_impact(&self, category: QCCategory, severity: QCSeverity) -> f64 {
        self.severity_weight(severity) * self.category_weight(category)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for severity in QCSeverity::ordered() {
            let weight = self.severity_weight(severity);
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::InvalidWeight {
                    name: "severity weight",
                    value: weight,
                });
            }
            let effort = self.effort(severity);
            if !effort.is_finite() || effort <= 0.0 {
                return Err(EngineError::InvalidWeight {
                    name: "effort score",
                    value: effort,
                });
            }
        }
        for category in QCCategory::ordered() {
            let weight = self.category_weight(category);
            if !weight.is_finite() || weight <= 0.0 {
                return Err(EngineError::InvalidWeight {
                    name: "category weight",
                    value: weight,
                });
            }
            let cap = self.max_deduction(category);
            if !cap.is_finite() || !(0.0..=100.0).contains(&cap) {
                return Err(EngineError::InvalidWeight {
                    name: "max deduction",
                    value: cap,
                });
            }
        }
        Ok(())
    }
}

/// Letter grade for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::APlus
        } else if score >= 90.0 {
            Self::A
        } else if score >= 85.0 {
            Self::BPlus
        } else if score >= 80.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else {
            Self::F
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

/// Score for one category with the deduction that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScoreEntry {
    pub category: QCCategory,
    pub category_label: &'static str,
    pub score: f64,
    pub deduction: f64,
    pub issue_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityCountEntry {
    pub severity: QCSeverity,
    pub severity_label: &'static str,
    pub count: usize,
}

/// One remediation option: resolve every issue of a severity, ranked by
/// points gained per unit of effort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementOpportunity {
    pub severity: QCSeverity,
    pub severity_label: &'static str,
    pub issue_count: usize,
    pub score_gain: f64,
    pub effort: f64,
    pub efficiency: f64,
    pub recommendation: String,
}

/// Derived scorecard. Computed from a [`QCResult`] on demand and never stored
/// back onto it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QCScorecard {
    pub overall_score: f64,
    pub grade: Grade,
    pub grade_label: &'static str,
    pub category_scores: Vec<CategoryScoreEntry>,
    pub severity_breakdown: Vec<SeverityCountEntry>,
    pub improvements: Vec<ImprovementOpportunity>,
}

/// Turns validation findings into scores, grades, and remediation rankings.
pub struct QCScoringSystem {
    config: ScoringConfig,
}

impl QCScoringSystem {
    pub fn new(config: ScoringConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Per-category score: 100 minus the capped sum of weighted deductions,
    /// floored at zero.
    pub fn category_scores(&self, result: &QCResult) -> BTreeMap<QCCategory, f64> {
        self.category_scores_for(&result.issues)
    }

    fn category_scores_for(&self, issues: &[QCIssue]) -> BTreeMap<QCCategory, f64> {
        let mut scores = BTreeMap::new();
        for category in QCCategory::ordered() {
            let deduction = self.category_deduction(issues, category);
            let capped = deduction.min(self.config.max_deduction(category));
            scores.insert(category, (100.0 - capped).max(0.0));
        }
        scores
    }

    fn category_deduction(&self, issues: &[QCIssue], category: QCCategory) -> f64 {
        issues
            .iter()
            .filter(|issue| issue.category == category)
            .map(|issue| self.config.issue_impact(category, issue.severity))
            .sum()
    }

    /// Weighted average of the category scores, clamped to [0, 100].
    pub fn overall_score(&self, result: &QCResult) -> f64 {
        self.overall_for(&result.issues)
    }

    fn overall_for(&self, issues: &[QCIssue]) -> f64 {
        let scores = self.category_scores_for(issues);
        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for (category, score) in &scores {
            let weight = self.config.category_weight(*category);
            weighted += score * weight;
            weight_sum += weight;
        }
        (weighted / weight_sum).clamp(0.0, 100.0)
    }

    /// Ranks what fixing each severity class end-to-end would buy, highest
    /// points-per-effort first.
    pub fn improvement_potential(&self, result: &QCResult) -> Vec<ImprovementOpportunity> {
        let current = self.overall_for(&result.issues);
        let mut opportunities = Vec::new();

        for severity in QCSeverity::ordered() {
            let issue_count = result.count_by_severity(severity);
            if issue_count == 0 {
                continue;
            }

            let remaining: Vec<QCIssue> = result
                .issues
                .iter()
                .filter(|issue| issue.severity != severity)
                .cloned()
                .collect();
            // Efficiency is gain over the severity's effort score alone; the
            // issue count scales the gain already, not the denominator.
            let score_gain = self.overall_for(&remaining) - current;
            let effort = self.config.effort(severity);
            let efficiency = score_gain / effort;

            opportunities.push(ImprovementOpportunity {
                severity,
                severity_label: severity.label(),
                issue_count,
                score_gain,
                effort,
                efficiency,
                recommendation: format!(
                    "Resolve {} {} issue(s) to gain {:.1} points",
                    issue_count,
                    severity.label(),
                    score_gain
                ),
            });
        }

        opportunities.sort_by(|a, b| {
            b.efficiency
                .partial_cmp(&a.efficiency)
                .unwrap_or(Ordering::Equal)
        });
        opportunities
    }

    pub fn scorecard(&self, result: &QCResult) -> QCScorecard {
        let scores = self.category_scores(result);
        let overall_score = self.overall_score(result);
        let grade = Grade::from_score(overall_score);

        let category_scores = QCCategory::ordered()
            .into_iter()
            .map(|category| {
                let deduction = self
                    .category_deduction(&result.issues, category)
                    .min(self.config.max_deduction(category));
                CategoryScoreEntry {
                    category,
                    category_label: category.label(),
                    score: scores[&category],
                    deduction,
                    issue_count: result.count_by_category(category),
                }
            })
            .collect();

        let severity_breakdown = QCSeverity::ordered()
            .into_iter()
            .map(|severity| SeverityCountEntry {
                severity,
                severity_label: severity.label(),
                count: result.count_by_severity(severity),
            })
            .collect();

        QCScorecard {
            overall_score,
            grade,
            grade_label: grade.label(),
            category_scores,
            severity_breakdown,
            improvements: self.improvement_potential(result),
        }
    }
}
