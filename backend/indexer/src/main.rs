//! Crowdfund event indexer.
//!
//! Follows the escrow contract through Soroban `getEvents`, stores every
//! event in SQLite and keeps a per-campaign read model, since the contract
//! itself cannot enumerate campaigns. A small Axum API serves both.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod indexer;
mod projection;
mod rpc;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::IndexerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

    let shutdown = CancellationToken::new();

    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        config: config.clone(),
        client,
    });
    let indexer_task = tokio::spawn(indexer::run(indexer_state, shutdown.clone()));

    let app = router(Arc::new(api::ApiState { pool }));

    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on http://{addr}");

    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                on_signal.cancel();
            }
            Err(e) => warn!("cannot listen for ctrl-c: {e}"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    shutdown.cancel();
    indexer_task.await?;
    Ok(())
}

fn router(state: Arc<api::ApiState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/events", get(api::get_all_events))
        .route("/campaigns", get(api::list_campaigns))
        .route("/campaigns/:id", get(api::get_campaign))
        .route("/campaigns/:id/events", get(api::get_campaign_events))
        .route("/donors/:address/events", get(api::get_donor_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
