//! Startup loading of the scaler and model artifacts.

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::{PipelineError, Result};
use crate::model::{Predictor, TreeEnsemble};
use crate::scaler::{FittedScaler, Scaler};
use crate::types::{FeatureSchema, N_FEATURES};

/// Sidecar describing the column order the artifacts were fit with.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactMeta {
    pub feat_list: Vec<String>,
    pub in_dim: Option<usize>,
    #[serde(default)]
    pub scaled_cols: Option<Vec<String>>,
    #[serde(default)]
    pub schema_version: Option<u32>,
}

impl ArtifactMeta {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|e| PipelineError::unavailable(path, e))?;
        serde_json::from_str(&txt).map_err(|e| PipelineError::unavailable(path, e))
    }

    /// Check the recorded layout against the compiled-in schema.
    pub fn validate(&self, schema: &FeatureSchema) -> Result<()> {
        if let Some(v) = self.schema_version {
            if v != schema.version {
                return Err(PipelineError::SchemaMismatch {
                    artifact: "meta",
                    expected: format!("schema version {}", schema.version),
                    got: format!("schema version {v}"),
                });
            }
        }
        schema.check_features("meta", &self.feat_list)?;
        let in_dim = self.in_dim.unwrap_or(self.feat_list.len());
        if in_dim != N_FEATURES {
            return Err(PipelineError::width("meta", N_FEATURES, in_dim));
        }
        if let Some(cols) = &self.scaled_cols {
            schema.check_scaled("meta", cols)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub meta: Option<PathBuf>,
}

/// The two fitted artifacts, immutable once loaded.
#[derive(Clone)]
pub struct LoadedArtifacts {
    pub scaler: Arc<dyn Scaler>,
    pub predictor: Arc<dyn Predictor>,
}

impl LoadedArtifacts {
    pub fn new(scaler: impl Scaler + 'static, predictor: impl Predictor + 'static) -> Self {
        Self {
            scaler: Arc::new(scaler),
            predictor: Arc::new(predictor),
        }
    }

    /// Load everything named in `paths`. Any failure is fatal for the caller:
    /// there is no partial state to predict with.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let schema = FeatureSchema::current();

        let meta = match &paths.meta {
            Some(p) => {
                let meta = ArtifactMeta::load(p)?;
                meta.validate(&schema)?;
                Some(meta)
            }
            None => None,
        };

        let scaler = FittedScaler::load(&paths.scaler)?;
        tracing::info!(path = %paths.scaler.display(), "loaded scaler");

        let predictor = load_predictor(&paths.model, meta.as_ref())?;
        tracing::info!(path = %paths.model.display(), "loaded model");

        Ok(Self {
            scaler: Arc::new(scaler),
            predictor,
        })
    }
}

fn load_predictor(path: &Path, meta: Option<&ArtifactMeta>) -> Result<Arc<dyn Predictor>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "json" => Ok(Arc::new(TreeEnsemble::load(path)?)),
        "pt" | "ts" => load_torchscript(path, meta),
        other => Err(PipelineError::unavailable(
            path,
            format!("unsupported model format {other:?}"),
        )),
    }
}

#[cfg(feature = "torch")]
fn load_torchscript(path: &Path, meta: Option<&ArtifactMeta>) -> Result<Arc<dyn Predictor>> {
    let meta = meta.ok_or_else(|| {
        PipelineError::unavailable(path, "TorchScript models need a meta file with feat_list")
    })?;
    let model = crate::model::TorchPredictor::load(path, meta.feat_list.clone())?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "torch"))]
fn load_torchscript(path: &Path, _meta: Option<&ArtifactMeta>) -> Result<Arc<dyn Predictor>> {
    Err(PipelineError::unavailable(
        path,
        "built without the `torch` feature",
    ))
}
