use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};

use crate::artifacts::ArtifactPaths;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub meta_path: Option<PathBuf>,
    pub port: u16,
    /// Log a summary of every encoded record (env `LOG_PRED=1`).
    pub log_features: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("artifacts/rf_model.json"),
            scaler_path: PathBuf::from("artifacts/scaler.json"),
            meta_path: None,
            port: 8080,
            log_features: false,
        }
    }
}

impl ServiceConfig {
    /// Read the optional JSON file named by `FIRE_CONFIG`, then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path))
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = match var("FIRE_CONFIG") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Some(p) = var("MODEL_PATH") {
            cfg.model_path = p.into();
        }
        if let Some(p) = var("SCALER_PATH") {
            cfg.scaler_path = p.into();
        }
        if let Some(p) = var("META_PATH") {
            cfg.meta_path = Some(p.into());
        }
        if let Some(p) = var("PORT") {
            cfg.port = p.parse().with_context(|| format!("PORT={p:?} is not a port"))?;
        }
        if let Some(v) = var("LOG_PRED") {
            cfg.log_features = v == "1";
        }
        Ok(cfg)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            scaler: self.scaler_path.clone(),
            meta: self.meta_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn environment_overrides() {
        let cfg = ServiceConfig::from_lookup(lookup(&[
            ("MODEL_PATH", "/srv/model.pt"),
            ("META_PATH", "/srv/meta.json"),
            ("PORT", "9000"),
            ("LOG_PRED", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.model_path, PathBuf::from("/srv/model.pt"));
        assert_eq!(cfg.meta_path, Some(PathBuf::from("/srv/meta.json")));
        assert_eq!(cfg.scaler_path, PathBuf::from("artifacts/scaler.json"));
        assert_eq!(cfg.port, 9000);
        assert!(cfg.log_features);
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(ServiceConfig::from_lookup(lookup(&[("FIRE_CONFIG", "/nonexistent.json")])).is_err());
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let cfg: ServiceConfig = serde_json::from_str(r#"{"port": 3000}"#).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.model_path, PathBuf::from("artifacts/rf_model.json"));
    }
}
