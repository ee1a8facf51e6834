//! Background task that follows the crowdfund contract's event stream and
//! writes decoded events (and the campaign read model) to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where the next poll starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    ledger: u32,
    cursor: Option<String>,
}

/// Poll until `shutdown` is cancelled. Failed polls are logged and retried
/// on the next tick from the same position.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "indexer starting");

    let mut position = match resume_position(&state.pool, state.config.start_ledger).await {
        Ok(position) => position,
        Err(e) => {
            error!("could not read indexer cursor: {e}");
            Position {
                ledger: state.config.start_ledger,
                cursor: None,
            }
        }
    };
    info!(ledger = position.ledger, "resuming");

    let interval = Duration::from_secs(state.config.poll_interval_secs);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(&state, &position) => match polled {
                Ok(next) => position = next,
                Err(e) => error!("indexer poll failed: {e}"),
            },
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!(ledger = position.ledger, "indexer stopped");
}

async fn resume_position(pool: &SqlitePool, start_ledger: u32) -> Result<Position> {
    let saved = db::get_last_ledger(pool).await?;
    let cursor = db::get_cursor_string(pool).await?;
    let ledger = u32::try_from(saved)
        .ok()
        .filter(|l| *l > 0)
        .unwrap_or(start_ledger);
    Ok(Position { ledger, cursor })
}

async fn poll_once(state: &IndexerState, position: &Position) -> Result<Position> {
    let config = &state.config;
    let page = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        position.ledger,
        position.cursor.as_deref(),
        config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(fetched = page.events.len(), inserted, "stored crowdfund events");
    }

    let next = next_position(position, page.cursor, page.latest_ledger);
    db::save_cursor(&state.pool, i64::from(next.ledger), next.cursor.as_deref()).await?;
    Ok(next)
}

/// The ledger never moves backwards; an empty page keeps the old cursor.
fn next_position(current: &Position, cursor: Option<String>, latest_ledger: Option<u64>) -> Position {
    let ledger = latest_ledger
        .and_then(|l| u32::try_from(l).ok())
        .map_or(current.ledger, |l| l.max(current.ledger));
    Position {
        ledger,
        cursor: cursor.or_else(|| current.cursor.clone()),
    }
}
