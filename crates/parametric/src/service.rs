use crate::comparison::{ComparisonEngine, ComparisonMode, ComparisonRun};
use crate::config::EngineSettings;
use crate::error::EngineError;
use crate::matcher::SourceSet;
use crate::qc::report::{build_run_view, QCRunView};
use crate::qc::rules::QCEngine;
use crate::qc::scoring::QCScoringSystem;
use crate::qc::QCResult;
use tracing::info;

/// Stateless facade running a full comparison or validation pass over staged
/// sources. Construction validates every tunable; runs never mutate the
/// service or the sources.
pub struct AnalysisService {
    comparison: ComparisonEngine,
    qc: QCEngine,
    scoring: QCScoringSystem,
}

impl AnalysisService {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let comparison = ComparisonEngine::new(settings.comparison)?;
        let normalizer = comparison.normalizer().clone();
        let qc = QCEngine::new(settings.validation, settings.scoring.clone(), normalizer)?;
        let scoring = QCScoringSystem::new(settings.scoring)?;
        Ok(Self {
            comparison,
            qc,
            scoring,
        })
    }

    pub fn run_comparison(
        &self,
        mode: ComparisonMode,
        set: &SourceSet,
    ) -> Result<ComparisonRun, EngineError> {
        let run = self.comparison.run(mode, set)?;
        info!(
            mode = mode.label(),
            sources = run.sources.len(),
            parameters = run.results.len(),
            matches = run.summary.matches,
            "comparison run complete"
        );
        Ok(run)
    }

    pub fn validate(&self, set: &SourceSet) -> QCResult {
        let result = self.qc.run(set);
        info!(
            total_items = result.total_items,
            issues = result.issue_count(),
            "validation run complete"
        );
        result
    }

    pub fn run_qc(&self, set: &SourceSet) -> QCRunView {
        let result = self.validate(set);
        build_run_view(&result, &self.scoring)
    }

    pub fn scoring(&self) -> &QCScoringSystem {
        &self.scoring
    }
}
