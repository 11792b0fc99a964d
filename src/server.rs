use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::encoder::{CategoryEncoder, CategoryKind, DAYS, MONTHS};
use crate::error::PipelineError;
use crate::features::{InputDomain, INPUT_DOMAINS};
use crate::pipeline::PredictionPipeline;
use crate::types::{EncodedRecord, FeatureSchema, RawInput, FEATURE_COLUMNS};

// ---------- Request/Response types ----------

#[derive(Serialize, Debug)]
pub struct PredictResponse {
    pub area_ha: f64,
    /// e.g. "12.34 ha"
    pub display: String,
    /// Encoded record as fed to the scaler.
    pub input: EncodedRecord,
    /// Labels the category codes in `input` stand for.
    pub labels: CategoryLabels,
}

#[derive(Serialize, Debug)]
pub struct CategoryLabels {
    pub month: &'static str,
    pub day: &'static str,
}

impl CategoryLabels {
    fn of(encoded: &EncodedRecord) -> Result<Self, PipelineError> {
        Ok(Self {
            month: CategoryEncoder::decode(CategoryKind::Month, encoded.month)?,
            day: CategoryEncoder::decode(CategoryKind::Day, encoded.day)?,
        })
    }
}

#[derive(Serialize)]
pub struct SchemaResponse {
    #[serde(flatten)]
    pub schema: FeatureSchema,
    pub months: &'static [&'static str],
    pub days: &'static [&'static str],
    pub domains: &'static [InputDomain],
}

type ApiError = (StatusCode, Json<Value>);

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
    pub log_features: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/schema", get(schema))
        .route("/health", get(health))
        .with_state(state)
}

fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::UnknownCategory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::ArtifactUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::SchemaMismatch { .. } | PipelineError::Inference(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(err: PipelineError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "prediction failed");
    } else {
        tracing::info!(error = %err, "rejected request");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

// Debug signal so we can confirm what the model actually receives
fn log_feature_summary(encoded: &EncodedRecord) {
    let row = encoded.to_row();
    let nz = row.iter().filter(|x| **x != 0.0).count();
    let mean = row.iter().sum::<f64>() / row.len() as f64;
    let std = (row.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / row.len() as f64).sqrt();
    let sample: Vec<String> = FEATURE_COLUMNS
        .iter()
        .zip(row.iter())
        .map(|(name, v)| format!("{name}={v:.3}"))
        .collect();
    tracing::info!(
        "recv in_dim={} nonzero={} mean={:.3} std={:.3} row=[{}]",
        row.len(),
        nz,
        mean,
        std,
        sample.join(", ")
    );
}

// ---------- Handlers ----------

pub async fn predict(
    State(state): State<AppState>,
    Json(raw): Json<RawInput>,
) -> Result<Json<PredictResponse>, ApiError> {
    let trace = state.pipeline.predict_traced(&raw).map_err(api_error)?;
    if state.log_features {
        log_feature_summary(&trace.encoded);
    }
    let labels = CategoryLabels::of(&trace.encoded).map_err(api_error)?;
    Ok(Json(PredictResponse {
        area_ha: trace.result.area_ha,
        display: trace.result.display(),
        input: trace.encoded,
        labels,
    }))
}

pub async fn schema(State(state): State<AppState>) -> Json<SchemaResponse> {
    Json(SchemaResponse {
        schema: *state.pipeline.schema(),
        months: &MONTHS,
        days: &DAYS,
        domains: &INPUT_DOMAINS,
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
