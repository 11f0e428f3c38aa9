use super::scoring::{QCScorecard, QCScoringSystem};
use super::{QCCategory, QCIssue, QCResult, QCSeverity};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct IssueView {
    pub category: QCCategory,
    pub category_label: &'static str,
    pub severity: QCSeverity,
    pub severity_label: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub recommended_action: String,
    pub score_impact: f64,
    pub raised_at: DateTime<Utc>,
}

impl IssueView {
    fn from_issue(issue: &QCIssue) -> Self {
        Self {
            category: issue.category,
            category_label: issue.category.label(),
            severity: issue.severity,
            severity_label: issue.severity.label(),
            message: issue.message.clone(),
            item: issue.item.as_ref().map(|item| item.key.label()),
            source_id: issue
                .item
                .as_ref()
                .and_then(|item| item.source_id.clone()),
            recommended_action: issue.recommended_action.clone(),
            score_impact: issue.score_impact,
            raised_at: issue.raised_at,
        }
    }
}

/// Everything a consumer needs to present one validation run: metadata, the
/// findings, and the derived scorecard.
#[derive(Debug, Clone, Serialize)]
pub struct QCRunView {
    pub total_items: usize,
    pub issue_count: usize,
    pub sources: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scorecard: QCScorecard,
    pub issues: Vec<IssueView>,
}

pub fn build_run_view(result: &QCResult, scoring: &QCScoringSystem) -> QCRunView {
    QCRunView {
        total_items: result.total_items,
        issue_count: result.issue_count(),
        sources: result.sources.clone(),
        started_at: result.started_at,
        finished_at: result.finished_at,
        scorecard: scoring.scorecard(result),
        issues: result.issues.iter().map(IssueView::from_issue).collect(),
    }
}
