use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use threatwire_common::{Config, ThreatwireError};
use threatwire_ingest::{Ingestor, RansomwareLiveClient, Summarizer};
use threatwire_store::RecordStore;

mod feed;
mod rest;

pub struct AppState {
    pub store: RecordStore,
    pub ingestor: Arc<Ingestor>,
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("threatwire=info".parse()?))
        .init();

    info!("Threatwire starting...");

    let config = Config::from_env();
    config.log_redacted();

    let store = RecordStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let provider = Arc::new(RansomwareLiveClient::new(
        &config.provider_api_base,
        Duration::from_secs(config.provider_timeout_secs),
    ));
    let summarizer = Summarizer::from_config(&config);
    let ingestor = Arc::new(Ingestor::new(
        store.clone(),
        provider,
        summarizer,
        config.window_days,
        config.target_countries.clone(),
        config.target_activity.clone(),
    ));

    // Initial ingest before the timer loop begins; a failure here is logged,
    // not fatal — the service still serves whatever is already stored.
    match ingestor.run_cycle().await {
        Ok(report) => info!(
            victims_saved = report.victims.saved,
            attacks_saved = report.attacks.saved,
            "Initial ingest complete"
        ),
        Err(e) => error!(error = %e, "Initial ingest failed"),
    }

    spawn_ingest_interval(Arc::clone(&ingestor), config.update_interval_hours);

    let state = Arc::new(AppState {
        store,
        ingestor,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/", get(rest::index))
        .route("/rss", get(rest::rss_feed))
        .route("/api/news", get(rest::api_news))
        .route("/api/update", post(rest::api_update))
        .route("/api/status", get(rest::api_status))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr = format!("{}:{}", config.host, config.port);
    info!(addr = %addr, "Threatwire listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Timer loop: one cycle per interval. The first tick fires immediately and
/// is skipped because the startup run already happened. A busy signal means
/// a manual trigger is mid-run; the scheduled cycle just skips.
fn spawn_ingest_interval(ingestor: Arc<Ingestor>, interval_hours: u64) {
    let period = Duration::from_secs(interval_hours.max(1) * 3600);
    info!(interval_hours = interval_hours.max(1), "Starting ingest interval loop");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            match ingestor.run_cycle().await {
                Ok(report) => info!(
                    victims_saved = report.victims.saved,
                    attacks_saved = report.attacks.saved,
                    elapsed_ms = report.elapsed_ms,
                    "Scheduled ingest complete"
                ),
                Err(ThreatwireError::CycleInProgress) => {
                    info!("Scheduled ingest skipped, a run is already in flight")
                }
                Err(e) => error!(error = %e, "Scheduled ingest failed"),
            }
        }
    });
}
