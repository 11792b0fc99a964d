//! Burned-area prediction for forest fires.
//!
//! Raw weather and spatial inputs are encoded, scaled and fed to a fitted
//! regressor; its log-scale output is mapped back to hectares.

pub mod artifacts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod response;
pub mod scaler;
pub mod server;
pub mod types;

pub use artifacts::{ArtifactPaths, LoadedArtifacts};
pub use encoder::{CategoryEncoder, CategoryKind};
pub use error::PipelineError;
pub use features::FeatureVectorBuilder;
pub use pipeline::{PredictionPipeline, PredictionTrace};
pub use response::ResponseTransformer;
pub use types::{EncodedRecord, PredictionResult, RawInput, ScaledRecord};
