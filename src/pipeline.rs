use serde::Serialize;

use crate::artifacts::LoadedArtifacts;
use crate::error::{PipelineError, Result};
use crate::features::FeatureVectorBuilder;
use crate::response::ResponseTransformer;
use crate::types::{
    EncodedRecord, FeatureSchema, PredictionResult, RawInput, ScaledRecord, N_FEATURES, N_SCALED,
};

/// Every intermediate value of one prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionTrace {
    pub encoded: EncodedRecord,
    pub scaled: ScaledRecord,
    pub log_prediction: f64,
    pub result: PredictionResult,
}

/// encode -> scale -> predict -> expm1, over artifacts loaded once at startup.
#[derive(Clone)]
pub struct PredictionPipeline {
    artifacts: LoadedArtifacts,
    schema: FeatureSchema,
}

impl PredictionPipeline {
    /// Checks the artifacts' declared shape against the feature schema.
    pub fn new(artifacts: LoadedArtifacts) -> Result<Self> {
        let schema = FeatureSchema::current();

        let scaler = &artifacts.scaler;
        if scaler.n_features() != N_SCALED {
            return Err(PipelineError::width("scaler", N_SCALED, scaler.n_features()));
        }
        if let Some(names) = scaler.feature_names() {
            schema.check_scaled("scaler", names)?;
        }

        let predictor = &artifacts.predictor;
        if predictor.n_features() != N_FEATURES {
            return Err(PipelineError::width("model", N_FEATURES, predictor.n_features()));
        }
        if let Some(names) = predictor.feature_names() {
            schema.check_features("model", names)?;
        }

        Ok(Self { artifacts, schema })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn predict(&self, raw: &RawInput) -> Result<PredictionResult> {
        self.predict_traced(raw).map(|t| t.result)
    }

    pub fn predict_traced(&self, raw: &RawInput) -> Result<PredictionTrace> {
        let outside = FeatureVectorBuilder::out_of_domain(raw);
        if !outside.is_empty() {
            tracing::warn!(?outside, "inputs outside training range; extrapolating");
        }

        let encoded = FeatureVectorBuilder::build(raw)?;

        let numeric = encoded.numeric_columns();
        let scaled_cols = self.artifacts.scaler.transform(&numeric)?;
        let scaled = ScaledRecord::from_encoded(&encoded, &scaled_cols)?;

        let log_prediction = self.artifacts.predictor.predict(scaled.as_row())?;
        if !log_prediction.is_finite() {
            return Err(PipelineError::Inference(format!(
                "model returned non-finite value {log_prediction}"
            )));
        }

        let result = ResponseTransformer::to_result(log_prediction);
        tracing::debug!(log_prediction, area_ha = result.area_ha, "prediction");

        Ok(PredictionTrace {
            encoded,
            scaled,
            log_prediction,
            result,
        })
    }
}
