use anyhow::Context;
use std::sync::Arc;

use fire_area_predictor::{
    config::ServiceConfig,
    server::{self, AppState},
    LoadedArtifacts, PredictionPipeline, RawInput,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = ServiceConfig::load()?;
    tracing::info!(?cfg, "starting");

    // No artifacts, no service: refuse to bind rather than serve errors.
    let artifacts = LoadedArtifacts::load(&cfg.artifact_paths())
        .context("failed to load model artifacts; train and export the model first")?;
    let pipeline = PredictionPipeline::new(artifacts)
        .context("artifacts do not match the feature schema")?;
    tracing::info!(
        "loaded artifacts; features[{}]: {:?}",
        pipeline.schema().features.len(),
        pipeline.schema().features
    );

    // Warmup on the form defaults
    let warm = pipeline
        .predict(&RawInput::default())
        .context("warmup prediction failed")?;
    tracing::info!("warmup ok: {}", warm.display());

    let state = AppState {
        pipeline: Arc::new(pipeline),
        log_features: cfg.log_features,
    };
    let app = server::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
