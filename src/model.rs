//! Regression model artifacts.
//!
//! Two on-disk shapes are supported:
//!
//! - a tree ensemble exported as parallel node arrays in JSON (random forest
//!   or boosted trees), evaluated natively;
//! - a TorchScript module (feature `torch`), evaluated through libtorch.
//!
//! Both return the target on the log scale it was fit on.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{PipelineError, Result};

pub trait Predictor: Send + Sync {
    /// Width of the row the model expects.
    fn n_features(&self) -> usize;

    /// Fit-time column names, if the artifact recorded them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict one row; returns the raw (log-scale) output.
    fn predict(&self, row: &[f64]) -> Result<f64>;
}

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Random forest: average of trees.
    #[default]
    Mean,
    /// Boosting: sum of trees.
    Sum,
}

/// One regression tree in node-array form. Node 0 is the root; a node with
/// `children_left == -1` is a leaf. Splits send `x[feature] <= threshold` left,
/// with `x` rounded to f32 first: exported trees were grown on f32 inputs and
/// their thresholds sit between f32 values.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeArrays {
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl TreeArrays {
    fn n_nodes(&self) -> usize {
        self.value.len()
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_left.len() != n
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
        {
            return Err(format!("node arrays disagree on length (expected {n})"));
        }
        for i in 0..n {
            let (l, r) = (self.children_left[i], self.children_right[i]);
            if l == -1 {
                continue;
            }
            // children must point forward, which also rules out cycles
            for child in [l, r] {
                if child <= i as i32 || child as usize >= n {
                    return Err(format!("node {i} has invalid child {child}"));
                }
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {i} splits on feature {f}, model has {n_features}"));
            }
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == -1 {
                return self.value[node];
            }
            let fvalue = row[self.feature[node] as usize] as f32;
            node = if f64::from(fvalue) <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// Tree-ensemble regressor loaded from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub n_features: usize,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<TreeArrays>,
}

impl TreeEnsemble {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|e| PipelineError::unavailable(path, e))?;
        let model: TreeEnsemble =
            serde_json::from_str(&txt).map_err(|e| PipelineError::unavailable(path, e))?;
        model
            .validate()
            .map_err(|e| PipelineError::unavailable(path, e))?;
        tracing::debug!(
            trees = model.trees.len(),
            aggregation = ?model.aggregation,
            "loaded tree ensemble"
        );
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(format!(
                    "{} feature names for n_features={}",
                    names.len(),
                    self.n_features
                ));
            }
        }
        for (i, t) in self.trees.iter().enumerate() {
            t.validate(self.n_features).map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Predictor for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(PipelineError::width("model", self.n_features, row.len()));
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        let out = match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => total,
        };
        Ok(self.base_score + out)
    }
}

#[cfg(feature = "torch")]
pub use torch::TorchPredictor;

#[cfg(feature = "torch")]
mod torch {
    use std::path::Path;
    use tch::{kind::Kind, CModule, Device, Tensor};

    use super::Predictor;
    use crate::error::{PipelineError, Result};

    /// TorchScript regressor taking a `[1, in_dim]` float tensor.
    pub struct TorchPredictor {
        model: CModule,
        device: Device,
        in_dim: usize,
        feature_names: Vec<String>,
    }

    impl TorchPredictor {
        pub fn load(path: impl AsRef<Path>, feature_names: Vec<String>) -> Result<Self> {
            let path = path.as_ref();
            let device = Device::Cpu;
            let model = CModule::load_on_device(path, device)
                .map_err(|e| PipelineError::unavailable(path, e))?;
            let in_dim = feature_names.len();

            // Probe output shape with a dummy forward: expect a single value
            let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
            let out = model
                .forward_ts(&[dummy])
                .map_err(|e| PipelineError::unavailable(path, e))?;
            if out.numel() != 1 {
                return Err(PipelineError::unavailable(
                    path,
                    format!("unexpected model output size: {:?}", out.size()),
                ));
            }

            Ok(Self {
                model,
                device,
                in_dim,
                feature_names,
            })
        }
    }

    impl Predictor for TorchPredictor {
        fn n_features(&self) -> usize {
            self.in_dim
        }

        fn feature_names(&self) -> Option<&[String]> {
            Some(&self.feature_names)
        }

        fn predict(&self, row: &[f64]) -> Result<f64> {
            if row.len() != self.in_dim {
                return Err(PipelineError::width("model", self.in_dim, row.len()));
            }
            let x: Vec<f32> = row.iter().map(|v| *v as f32).collect();
            let input = Tensor::from_slice(&x)
                .reshape([1, self.in_dim as i64])
                .to_device(self.device);
            let out = self
                .model
                .forward_ts(&[input])
                .map_err(|e| PipelineError::Inference(e.to_string()))?;
            let v = out
                .reshape([-1])
                .f_double_value(&[0])
                .map_err(|e| PipelineError::Inference(e.to_string()))?;
            Ok(v)
        }
    }
}
