use crate::types::PredictionResult;

/// Undoes the `log1p` applied to the burned-area target before fitting.
pub struct ResponseTransformer;

impl ResponseTransformer {
    pub fn inverse(log_value: f64) -> f64 {
        log_value.exp_m1()
    }

    /// Tiny negative areas (log output just below zero) are reported as 0.
    pub fn to_result(log_value: f64) -> PredictionResult {
        PredictionResult {
            area_ha: Self::inverse(log_value).max(0.0),
        }
    }
}
