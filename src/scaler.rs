//! Fitted numeric scaler, consumed read-only.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{PipelineError, Result};

/// Column-wise transform fitted on the numeric training columns.
pub trait Scaler: Send + Sync {
    /// Number of columns the scaler was fit on.
    fn n_features(&self) -> usize;

    /// Fit-time column names, if the artifact recorded them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn transform(&self, columns: &[f64]) -> Result<Vec<f64>>;
}

/// On-disk scaler parameters (`scaler.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    /// `(x - mean) / scale`
    Standard {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// `x * scale + min`
    MinMax {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl FittedScaler {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|e| PipelineError::unavailable(path, e))?;
        let scaler: FittedScaler =
            serde_json::from_str(&txt).map_err(|e| PipelineError::unavailable(path, e))?;
        scaler
            .validate()
            .map_err(|e| PipelineError::unavailable(path, e))?;
        Ok(scaler)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let (offset, scale, names) = self.parts();
        if offset.len() != scale.len() {
            return Err(format!(
                "parameter length mismatch: {} offsets, {} scales",
                offset.len(),
                scale.len()
            ));
        }
        if let Some(names) = names {
            if names.len() != scale.len() {
                return Err(format!(
                    "{} feature names for {} columns",
                    names.len(),
                    scale.len()
                ));
            }
        }
        if offset.iter().chain(scale).any(|v| !v.is_finite()) {
            return Err("non-finite scaler parameter".to_string());
        }
        Ok(())
    }

    fn parts(&self) -> (&[f64], &[f64], Option<&[String]>) {
        match self {
            FittedScaler::Standard { feature_names, mean, scale } => {
                (mean.as_slice(), scale.as_slice(), feature_names.as_deref())
            }
            FittedScaler::MinMax { feature_names, min, scale } => {
                (min.as_slice(), scale.as_slice(), feature_names.as_deref())
            }
        }
    }
}

impl Scaler for FittedScaler {
    fn n_features(&self) -> usize {
        self.parts().1.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.parts().2
    }

    fn transform(&self, columns: &[f64]) -> Result<Vec<f64>> {
        if columns.len() != self.n_features() {
            return Err(PipelineError::width("scaler", self.n_features(), columns.len()));
        }
        let out = match self {
            FittedScaler::Standard { mean, scale, .. } => columns
                .iter()
                .zip(mean.iter().zip(scale))
                // zero variance at fit time: scale treated as 1
                .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
                .collect(),
            FittedScaler::MinMax { min, scale, .. } => columns
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
        };
        Ok(out)
    }
}
