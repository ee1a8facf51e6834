//! Database layer: migrations, queries, cursor management and the campaign
//! read model.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use crate::errors::Result;
use crate::events::{CampaignRecord, CrowdfundEvent, EventKind, EventRecord};
use crate::projection::{self, Projection};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Make sure the file is created if it doesn't exist yet.
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger (and optionally a pagination cursor string).
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events and fold the new ones into the campaign
/// read model, all in one transaction.
///
/// Events whose `event_id` is already stored are ignored, which makes
/// re-polling the same ledger range harmless.
pub async fn insert_events(pool: &SqlitePool, events: &[CrowdfundEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, campaign_id, actor, amount, raised, end_time,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ev.event_id)
        .bind(&ev.event_type)
        .bind(&ev.campaign_id)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.raised)
        .bind(ev.end_time)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            continue;
        }
        count += rows_affected as usize;
        project_event(&mut tx, ev).await?;
    }

    tx.commit().await?;
    Ok(count)
}

async fn project_event(tx: &mut Transaction<'_, Sqlite>, ev: &CrowdfundEvent) -> Result<()> {
    let Some(campaign_id) = ev.campaign_id.as_deref() else {
        return Ok(());
    };

    let current = sqlx::query_as::<_, CampaignRecord>(
        r#"
        SELECT campaign_id, creator, goal, raised, end_time, status, updated_ledger
        FROM   campaigns
        WHERE  campaign_id = ?1
        "#,
    )
    .bind(campaign_id)
    .fetch_optional(&mut **tx)
    .await?;

    // A malformed payload is stored as a raw event but must not stall the
    // poller, so it is skipped for the read model.
    let row = match projection::apply(current.as_ref(), ev) {
        Ok(Projection::Upsert(row)) => row,
        Ok(Projection::Ignore) => return Ok(()),
        Err(e) => {
            warn!("Skipping {} for campaign {campaign_id}: {e}", ev.event_type);
            return Ok(());
        }
    };

    sqlx::query(
        r#"
        INSERT INTO campaigns
            (campaign_id, creator, goal, raised, end_time, status, updated_ledger)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(campaign_id) DO UPDATE SET
            creator        = excluded.creator,
            goal           = excluded.goal,
            raised         = excluded.raised,
            end_time       = excluded.end_time,
            status         = excluded.status,
            updated_ledger = excluded.updated_ledger
        "#,
    )
    .bind(&row.campaign_id)
    .bind(&row.creator)
    .bind(&row.goal)
    .bind(&row.raised)
    .bind(row.end_time)
    .bind(&row.status)
    .bind(row.updated_ledger)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str = "id, event_id, event_type, campaign_id, actor, amount, raised, \
                             end_time, ledger, timestamp, contract_id, tx_hash, created_at";

/// Fetch all events for a given campaign, ordered by ledger ascending.
pub async fn get_events_for_campaign(
    pool: &SqlitePool,
    campaign_id: &str,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE campaign_id = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch every donation and refund made by `donor`, across all campaigns.
pub async fn get_events_for_donor(pool: &SqlitePool, donor: &str) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events \
         WHERE actor = ?1 AND event_type IN (?2, ?3) \
         ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(donor)
        .bind(EventKind::DonationMade.as_str())
        .bind(EventKind::DonationRefunded.as_str())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Campaign reads
// ─────────────────────────────────────────────────────────

pub async fn list_campaigns(pool: &SqlitePool) -> Result<Vec<CampaignRecord>> {
    let rows = sqlx::query_as::<_, CampaignRecord>(
        r#"
        SELECT campaign_id, creator, goal, raised, end_time, status, updated_ledger
        FROM   campaigns
        ORDER  BY end_time ASC, campaign_id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_campaign(pool: &SqlitePool, campaign_id: &str) -> Result<Option<CampaignRecord>> {
    let row = sqlx::query_as::<_, CampaignRecord>(
        r#"
        SELECT campaign_id, creator, goal, raised, end_time, status, updated_ledger
        FROM   campaigns
        WHERE  campaign_id = ?1
        "#,
    )
    .bind(campaign_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Migrated in-memory pool for tests. One connection, since every in-memory
/// connection is its own database.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");
    pool
}
