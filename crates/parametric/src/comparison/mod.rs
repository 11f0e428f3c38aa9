pub mod statistics;


use crate::domain::{ParameterKey, ParameterRecord};
use crate::error::EngineError;
use crate::matcher::SourceSet;
use crate::normalize::{canonical_numeric, NormalizedValue, Normalizer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use statistics::ValueStatistics;

/// Tunables for a comparison pass. Validated once, before any value is
/// examined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Allowed spread between readings, as a percentage.
    pub tolerance_pct: f64,
    /// Minimum |r| for a correlation pair to be reported.
    pub correlation_threshold: f64,
    /// Whether empty strings count as recorded-absent, like the "-" sentinel.
    pub treat_empty_as_absent: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            tolerance_pct: 5.0,
            correlation_threshold: 0.7,
            treat_empty_as_absent: true,
        }
    }
}

impl ComparisonConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.tolerance_pct.is_finite() || self.tolerance_pct < 0.0 {
            return Err(EngineError::InvalidTolerance {
                value: self.tolerance_pct,
            });
        }
        if !self.correlation_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.correlation_threshold)
        {
            return Err(EngineError::InvalidThreshold {
                value: self.correlation_threshold,
            });
        }
        Ok(())
    }
}

/// How a comparison pass interprets the staged sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    FileToFile,
    FileToReference,
    Statistical,
    Correlation,
}

impl ComparisonMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FileToFile => "file-to-file",
            Self::FileToReference => "file-to-reference",
            Self::Statistical => "statistical",
            Self::Correlation => "correlation",
        }
    }
}

/// Classification of a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Match,
    NumericDifference,
    BelowSpec,
    AboveSpec,
    TextDifference,
    Missing,
    WithinTolerance,
    NeedsAttention,
    Error,
}

impl OutcomeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Match => "Match",
            Self::NumericDifference => "Numeric Difference",
            Self::BelowSpec => "Below Spec",
            Self::AboveSpec => "Above Spec",
            Self::TextDifference => "Text Difference",
            Self::Missing => "Missing",
            Self::WithinTolerance => "Within Tolerance",
            Self::NeedsAttention => "Needs Attention",
            Self::Error => "Error",
        }
    }
}

/// Which side of a pairwise comparison had no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSide {
    Candidate,
    Reference,
}

/// Result of comparing one parameter, with enough context to explain the
/// classification without re-running it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    pub kind: OutcomeKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_percentage"
    )]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_side: Option<MissingSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ValueStatistics>,
}

impl ComparisonOutcome {
    fn of(kind: OutcomeKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            delta: None,
            percentage: None,
            missing_side: None,
            stats: None,
        }
    }
}

// An unbounded percentage (reference was zero) would serialize to null as a
// bare f64, so it is rendered as the string "inf" instead.
fn serialize_percentage<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(pct) if pct.is_finite() => serializer.serialize_f64(*pct),
        Some(_) => serializer.serialize_str("inf"),
        None => serializer.serialize_none(),
    }
}

/// Specification range attached to a comparison, usually from the reference
/// record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpecBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SpecBounds {
    pub fn from_record(record: &ParameterRecord) -> Self {
        Self {
            min: record.min_spec,
            max: record.max_spec,
        }
    }

    fn is_malformed(&self) -> bool {
        if self.min.is_some_and(|min| !min.is_finite())
            || self.max.is_some_and(|max| !max.is_finite())
        {
            return true;
        }
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

/// One classified parameter within a comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterComparison {
    pub key: ParameterKey,
    pub parameter_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub outcome: ComparisonOutcome,
}

/// A reported parameter pair whose readings move together across sources.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationFinding {
    pub left: String,
    pub right: String,
    pub coefficient: f64,
    pub sample_size: usize,
    pub strength: String,
}

/// Aggregate view over the outcomes of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub matches: usize,
    pub mean_difference_pct: f64,
    pub std_difference_pct: f64,
    pub within_tolerance_pct: f64,
}

/// Full output of one comparison pass. Immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRun {
    pub mode: ComparisonMode,
    pub sources: Vec<String>,
    pub results: Vec<ParameterComparison>,
    pub summary: ComparisonSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub correlations: Vec<CorrelationFinding>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Stateless comparator applying one validated configuration.
#[derive(Debug)]
pub struct ComparisonEngine {
    config: ComparisonConfig,
    normalizer: Normalizer,
}

impl ComparisonEngine {
    pub fn new(config: ComparisonConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let normalizer = Normalizer::new(config.treat_empty_as_absent);
        Ok(Self { config, normalizer })
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Compares a candidate record against a reference record. Either side
    /// may be missing from its source; that classifies, it never errors.
    pub fn compare_records(
        &self,
        candidate: Option<&ParameterRecord>,
        reference: Option<&ParameterRecord>,
    ) -> ComparisonOutcome {
        let candidate_value = match candidate {
            Some(record) => self.normalizer.normalize(&record.raw_value),
            None => NormalizedValue::Absent,
        };
        let reference_value = match reference {
            Some(record) => self.normalizer.normalize(&record.raw_value),
            None => NormalizedValue::Absent,
        };

        // Specification bounds live on the reference side of the sheet;
        // candidates carry them only when no reference exists.
        let bounds = reference
            .map(SpecBounds::from_record)
            .or_else(|| candidate.map(SpecBounds::from_record))
            .unwrap_or_default();

        self.compare_values(&candidate_value, &reference_value, bounds)
    }

    pub fn compare_values(
        &self,
        candidate: &NormalizedValue,
        reference: &NormalizedValue,
        bounds: SpecBounds,
    ) -> ComparisonOutcome {
        match (candidate.is_absent(), reference.is_absent()) {
            (true, true) => {
                return ComparisonOutcome::of(OutcomeKind::Match, "absent on both sides")
            }
            (true, false) => {
                let mut outcome =
                    ComparisonOutcome::of(OutcomeKind::Missing, "value missing from candidate");
                outcome.missing_side = Some(MissingSide::Candidate);
                return outcome;
            }
            (false, true) => {
                let mut outcome =
                    ComparisonOutcome::of(OutcomeKind::Missing, "value missing from reference");
                outcome.missing_side = Some(MissingSide::Reference);
                return outcome;
            }
            (false, false) => {}
        }

        if candidate.canonical() == reference.canonical() {
            return ComparisonOutcome::of(OutcomeKind::Match, "values agree");
        }

        // A broken range only matters past the equality check; agreeing
        // values still match.
        if bounds.is_malformed() {
            return ComparisonOutcome::of(
                OutcomeKind::Error,
                format!(
                    "invalid specification range [{:?}, {:?}]",
                    bounds.min, bounds.max
                ),
            );
        }

        if let Some(value) = candidate.as_numeric() {
            // Range classification only applies when a full range exists; a
            // half-open bound leaves the pair to the numeric path.
            if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
                if value < min {
                    return ComparisonOutcome::of(
                        OutcomeKind::BelowSpec,
                        format!(
                            "{} below specification minimum {}",
                            canonical_numeric(value),
                            canonical_numeric(min)
                        ),
                    );
                }
                if value > max {
                    return ComparisonOutcome::of(
                        OutcomeKind::AboveSpec,
                        format!(
                            "{} above specification maximum {}",
                            canonical_numeric(value),
                            canonical_numeric(max)
                        ),
                    );
                }
            }

            if let Some(reference_value) = reference.as_numeric() {
                return numeric_difference(value, reference_value);
            }
        }

        ComparisonOutcome::of(
            OutcomeKind::TextDifference,
            format!(
                "'{}' differs from '{}'",
                candidate.canonical(),
                reference.canonical()
            ),
        )
    }

    /// Classifies one parameter across many readings. With two or more
    /// numeric readings the spread decides the outcome; otherwise this falls
    /// back to canonical equality.
    pub fn compare_many(&self, values: &[NormalizedValue]) -> ComparisonOutcome {
        let present: Vec<&NormalizedValue> =
            values.iter().filter(|value| !value.is_absent()).collect();
        if present.is_empty() {
            return ComparisonOutcome::of(OutcomeKind::Missing, "no recorded values");
        }

        let numerics: Vec<f64> = present
            .iter()
            .filter_map(|value| value.as_numeric())
            .collect();

        if numerics.len() >= 2 {
            let stats = match statistics::describe(&numerics) {
                Some(stats) => stats,
                None => {
                    return ComparisonOutcome::of(OutcomeKind::Missing, "no recorded values")
                }
            };

            if stats.std_dev == 0.0 {
                let mut outcome =
                    ComparisonOutcome::of(OutcomeKind::Match, "all readings identical");
                outcome.stats = Some(stats);
                return outcome;
            }

            let spread = stats.spread_percentage();
            let (kind, description) = if spread <= self.config.tolerance_pct {
                (
                    OutcomeKind::WithinTolerance,
                    format!(
                        "spread {:.2}% within tolerance {:.2}%",
                        spread, self.config.tolerance_pct
                    ),
                )
            } else {
                (
                    OutcomeKind::NeedsAttention,
                    format!(
                        "spread {:.2}% exceeds tolerance {:.2}%",
                        spread, self.config.tolerance_pct
                    ),
                )
            };

            let mut outcome = ComparisonOutcome::of(kind, description);
            outcome.percentage = Some(spread);
            outcome.stats = Some(stats);
            return outcome;
        }

        let first = present[0].canonical();
        if present.iter().all(|value| value.canonical() == first) {
            return ComparisonOutcome::of(OutcomeKind::Match, "all readings identical");
        }

        ComparisonOutcome::of(OutcomeKind::TextDifference, "readings disagree")
    }

    /// Runs a full pass in the requested mode over the staged sources.
    pub fn run(&self, mode: ComparisonMode, set: &SourceSet) -> Result<ComparisonRun, EngineError> {
        self.check_mode(mode, set)?;
        let started_at = Utc::now();
        let table = set.align();

        let mut results = Vec::new();
        let mut correlations = Vec::new();

        match mode {
            ComparisonMode::FileToFile => {
                // First registered source acts as the baseline.
                for (key, row) in &table.rows {
                    let baseline = row.slots[0].as_ref();
                    for (slot, label) in row.slots.iter().zip(&table.sources).skip(1) {
                        let outcome = self.compare_records(slot.as_ref(), baseline);
                        results.push(ParameterComparison {
                            key: key.clone(),
                            parameter_name: key.parameter_name(),
                            source: Some(label.clone()),
                            outcome,
                        });
                    }
                }
            }
            ComparisonMode::FileToReference => {
                for (key, row) in &table.rows {
                    for (slot, label) in row.slots.iter().zip(&table.sources) {
                        let outcome = self.compare_records(slot.as_ref(), row.reference.as_ref());
                        results.push(ParameterComparison {
                            key: key.clone(),
                            parameter_name: key.parameter_name(),
                            source: Some(label.clone()),
                            outcome,
                        });
                    }
                }
            }
            ComparisonMode::Statistical => {
                for (key, row) in &table.rows {
                    let values: Vec<NormalizedValue> = row
                        .slots
                        .iter()
                        .map(|slot| match slot {
                            Some(record) => self.normalizer.normalize(&record.raw_value),
                            None => NormalizedValue::Absent,
                        })
                        .collect();
                    let outcome = self.compare_many(&values);
                    results.push(ParameterComparison {
                        key: key.clone(),
                        parameter_name: key.parameter_name(),
                        source: None,
                        outcome,
                    });
                }
            }
            ComparisonMode::Correlation => {
                correlations = self.correlate(set);
            }
        }

        let summary = aggregate(
            &results,
            self.config.tolerance_pct,
        );

        Ok(ComparisonRun {
            mode,
            sources: table.sources,
            results,
            summary,
            correlations,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn check_mode(&self, mode: ComparisonMode, set: &SourceSet) -> Result<(), EngineError> {
        match mode {
            ComparisonMode::FileToFile
            | ComparisonMode::Statistical
            | ComparisonMode::Correlation => {
                if set.len() < 2 {
                    return Err(EngineError::UnsatisfiedMode {
                        mode: mode.label(),
                        requirement: "at least two sources",
                    });
                }
            }
            ComparisonMode::FileToReference => {
                if set.is_empty() {
                    return Err(EngineError::UnsatisfiedMode {
                        mode: mode.label(),
                        requirement: "at least one source",
                    });
                }
                if !set.has_reference() {
                    return Err(EngineError::UnsatisfiedMode {
                        mode: mode.label(),
                        requirement: "a reference collection",
                    });
                }
            }
        }
        Ok(())
    }

    /// Pairwise parameter correlation. Each parameter's readings across the
    /// sources form one series; a parameter takes part only when every source
    /// holds a numeric reading for it.
    fn correlate(&self, set: &SourceSet) -> Vec<CorrelationFinding> {
        let table = set.align();
        let mut series: Vec<(String, Vec<f64>)> = Vec::new();

        for (key, row) in &table.rows {
            let values: Vec<f64> = row
                .slots
                .iter()
                .filter_map(|slot| {
                    slot.as_ref()
                        .and_then(|record| self.normalizer.normalize(&record.raw_value).as_numeric())
                })
                .collect();
            if values.len() == row.slots.len() {
                series.push((key.label(), values));
            }
        }

        let mut findings = Vec::new();
        for left in 0..series.len() {
            for right in (left + 1)..series.len() {
                let (left_name, xs) = &series[left];
                let (right_name, ys) = &series[right];
                if let Some(coefficient) = statistics::pearson(xs, ys) {
                    if coefficient.abs() >= self.config.correlation_threshold {
                        let strength = if coefficient > 0.0 {
                            "strong positive correlation"
                        } else {
                            "strong negative correlation"
                        };
                        findings.push(CorrelationFinding {
                            left: left_name.clone(),
                            right: right_name.clone(),
                            coefficient,
                            sample_size: xs.len(),
                            strength: strength.to_string(),
                        });
                    }
                }
            }
        }

        findings
    }
}

fn numeric_difference(candidate: f64, reference: f64) -> ComparisonOutcome {
    let delta = (candidate - reference).abs();
    let percentage = if reference == 0.0 {
        if delta == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        delta / reference.abs() * 100.0
    };

    let description = if percentage.is_finite() {
        format!(
            "differs from {} by {} ({:.2}%)",
            canonical_numeric(reference),
            canonical_numeric(delta),
            percentage
        )
    } else {
        format!(
            "differs from zero reference by {}",
            canonical_numeric(delta)
        )
    };

    let mut outcome = ComparisonOutcome::of(OutcomeKind::NumericDifference, description);
    outcome.delta = Some(delta);
    outcome.percentage = Some(percentage);
    outcome
}

/// Rolls individual outcomes up into one summary. A numeric difference counts
/// as in-tolerance when its percentage stays within the configured bound.
pub fn aggregate(results: &[ParameterComparison], tolerance_pct: f64) -> ComparisonSummary {
    let total = results.len();
    let mut matches = 0;
    let mut in_tolerance = 0;
    let mut percentages = Vec::new();

    for result in results {
        let outcome = &result.outcome;
        match outcome.kind {
            OutcomeKind::Match => {
                matches += 1;
                in_tolerance += 1;
            }
            OutcomeKind::WithinTolerance => in_tolerance += 1,
            OutcomeKind::NumericDifference => {
                if outcome
                    .percentage
                    .is_some_and(|pct| pct.is_finite() && pct <= tolerance_pct)
                {
                    in_tolerance += 1;
                }
            }
            _ => {}
        }
        if let Some(pct) = outcome.percentage.filter(|pct| pct.is_finite()) {
            percentages.push(pct);
        }
    }

    let mean_difference_pct = statistics::mean(&percentages);
    let std_difference_pct = statistics::population_std(&percentages, mean_difference_pct);
    let within_tolerance_pct = if total == 0 {
        0.0
    } else {
        in_tolerance as f64 / total as f64 * 100.0
    };

    ComparisonSummary {
        total,
        matches,
        mean_difference_pct,
        std_difference_pct,
        within_tolerance_pct,
    }
}
