/// Rail control-center backend: fleet snapshot, recommendation workflow, simulated metrics
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod repo;
mod routes;
mod services;
mod utils;

use crate::clients::{ModelClient, PredictorClient};
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::repo::TrainStore;
use crate::routes::build_router;
use crate::services::{default_provider, LifecycleManager, MetricsService, PredictionService};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");
    match &config.model.url {
        Some(url) => info!("Recommendation model endpoint: {}", url),
        None => info!("No recommendation model configured, synthetic recommendations only"),
    }

    // Train Record Store
    let store = TrainStore::seeded();
    info!("Train store seeded with {} trains", store.snapshot().len());

    // Initialize clients
    let model_client = ModelClient::new(
        config.model.url.clone(),
        config.model.api_key.clone(),
        config.model.timeout,
    )?;
    let predictor_client =
        PredictorClient::new(config.predictor_url.clone(), config.predictor_timeout)?;

    // Initialize services
    let lifecycle = Arc::new(LifecycleManager::new(
        default_provider(model_client, config.synthetic_seed),
        store.clone(),
    ));
    let metrics = Arc::new(MetricsService::new(config.metrics.live, config.synthetic_seed));
    let prediction = Arc::new(PredictionService::new(predictor_client));

    // Initialize application state
    let state = AppState {
        store,
        lifecycle,
        metrics: metrics.clone(),
        prediction,
    };

    // Start background tasks
    start_metrics_ticker(metrics, config.metrics.tick_seconds);

    // Build router
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("rail-control listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Perturb the display metrics on a fixed interval while live mode is on
fn start_metrics_ticker(metrics: Arc<MetricsService>, interval: u64) {
    tokio::spawn(async move {
        info!("Starting metrics ticker (interval: {}s)", interval);
        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if metrics.tick() {
                let current = metrics.current();
                tracing::debug!(
                    "Metrics tick: on-time {:.1}%, average delay {:.1} min",
                    current.trains_on_time,
                    current.average_delay
                );
            }
        }
    });
}
