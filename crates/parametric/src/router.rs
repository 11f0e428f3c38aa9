use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::comparison::ComparisonMode;
use crate::domain::{ParameterKey, ParameterRecord};
use crate::ingest;
use crate::matcher::SourceSet;
use crate::service::AnalysisService;

/// Router builder exposing the comparison and QC endpoints.
pub fn analysis_router(service: Arc<AnalysisService>) -> Router {
    Router::new()
        .route("/api/v1/comparisons", post(comparisons_handler))
        .route("/api/v1/qc-runs", post(qc_runs_handler))
        .with_state(service)
}

/// One record in a request body. The source label becomes the record's
/// source id.
#[derive(Debug, Deserialize)]
pub struct RecordInput {
    pub module: String,
    #[serde(default)]
    pub part: String,
    pub item_name: String,
    pub value: String,
    #[serde(default)]
    pub min_spec: Option<f64>,
    #[serde(default)]
    pub max_spec: Option<f64>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub is_checklist: bool,
}

impl RecordInput {
    fn into_record(self, source_id: &str) -> ParameterRecord {
        let mut record = ParameterRecord::new(
            ParameterKey::new(self.module, self.part, self.item_name),
            self.value,
            source_id,
        )
        .with_spec(self.min_spec, self.max_spec);
        record.confidence_score = self.confidence_score;
        record.is_checklist = self.is_checklist;
        record
    }
}

/// One labeled source: either inline records or an exported CSV payload.
#[derive(Debug, Deserialize)]
pub struct SourceInput {
    pub label: String,
    #[serde(default)]
    pub records: Vec<RecordInput>,
    #[serde(default)]
    pub csv: Option<String>,
}

impl SourceInput {
    fn into_records(self) -> Result<(String, Vec<ParameterRecord>), Response> {
        let SourceInput {
            label,
            records,
            csv,
        } = self;

        let records = if let Some(csv) = csv {
            let reader = Cursor::new(csv.into_bytes());
            match ingest::parse_records(reader, &label) {
                Ok(parsed) => parsed,
                Err(error) => {
                    let payload = json!({ "error": error.to_string(), "source": label });
                    return Err(
                        (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
                    );
                }
            }
        } else {
            records
                .into_iter()
                .map(|record| record.into_record(&label))
                .collect()
        };

        Ok((label, records))
    }
}

#[derive(Debug, Deserialize)]
pub struct ComparisonRequest {
    pub mode: ComparisonMode,
    pub sources: Vec<SourceInput>,
    #[serde(default)]
    pub reference: Option<SourceInput>,
}

#[derive(Debug, Deserialize)]
pub struct QCRequest {
    pub sources: Vec<SourceInput>,
}

fn build_source_set(
    sources: Vec<SourceInput>,
    reference: Option<SourceInput>,
) -> Result<SourceSet, Response> {
    let mut set = SourceSet::new();

    for source in sources {
        let (label, records) = source.into_records()?;
        if let Err(error) = set.add_source(label, records) {
            let payload = json!({ "error": error.to_string() });
            return Err((StatusCode::BAD_REQUEST, axum::Json(payload)).into_response());
        }
    }

    if let Some(reference) = reference {
        let (label, records) = reference.into_records()?;
        if let Err(error) = set.set_reference(label, records) {
            let payload = json!({ "error": error.to_string() });
            return Err((StatusCode::BAD_REQUEST, axum::Json(payload)).into_response());
        }
    }

    Ok(set)
}

pub(crate) async fn comparisons_handler(
    State(service): State<Arc<AnalysisService>>,
    axum::Json(request): axum::Json<ComparisonRequest>,
) -> Response {
    let set = match build_source_set(request.sources, request.reference) {
        Ok(set) => set,
        Err(response) => return response,
    };

    match service.run_comparison(request.mode, &set) {
        Ok(run) => (StatusCode::OK, axum::Json(run)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn qc_runs_handler(
    State(service): State<Arc<AnalysisService>>,
    axum::Json(request): axum::Json<QCRequest>,
) -> Response {
    let set = match build_source_set(request.sources, None) {
        Ok(set) => set,
        Err(response) => return response,
    };

    let view = service.run_qc(&set);
    (StatusCode::OK, axum::Json(view)).into_response()
}
