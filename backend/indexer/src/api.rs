//! Axum REST API over the indexed events and the campaign read model.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{CampaignPhase, CampaignRecord, EventRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

type Shared = State<Arc<ApiState>>;

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct CampaignEventsResponse {
    pub campaign_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct DonorEventsResponse {
    pub donor: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

/// A campaign row plus its phase at request time.
#[derive(Serialize)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: CampaignRecord,
    pub phase: CampaignPhase,
}

#[derive(Serialize)]
pub struct CampaignsResponse {
    pub count: usize,
    pub campaigns: Vec<CampaignView>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ─────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(IndexerError),
}

impl From<IndexerError> for ApiError {
    fn from(e: IndexerError) -> Self {
        match e {
            IndexerError::InvalidCampaignId(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(e) => {
                error!("request failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Campaign ids are 32 bytes of hex; stored ids are lowercase.
fn parse_campaign_id(raw: &str) -> Result<String, IndexerError> {
    match hex::decode(raw) {
        Ok(bytes) if bytes.len() == 32 => Ok(hex::encode(bytes)),
        _ => Err(IndexerError::InvalidCampaignId(raw.to_string())),
    }
}

fn view(campaign: CampaignRecord, now: i64) -> CampaignView {
    let phase = campaign.phase(now);
    CampaignView { campaign, phase }
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
pub async fn get_all_events(State(state): Shared) -> Result<Json<EventsResponse>, ApiError> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(EventsResponse {
        count: events.len(),
        events,
    }))
}

/// `GET /campaigns`
///
/// Every campaign seen by the indexer, closed ones included.
pub async fn list_campaigns(State(state): Shared) -> Result<Json<CampaignsResponse>, ApiError> {
    let now = unix_now();
    let campaigns: Vec<CampaignView> = db::list_campaigns(&state.pool)
        .await?
        .into_iter()
        .map(|c| view(c, now))
        .collect();
    Ok(Json(CampaignsResponse {
        count: campaigns.len(),
        campaigns,
    }))
}

/// `GET /campaigns/:id`
pub async fn get_campaign(
    State(state): Shared,
    Path(raw_id): Path<String>,
) -> Result<Json<CampaignView>, ApiError> {
    let campaign_id = parse_campaign_id(&raw_id)?;
    let campaign = db::get_campaign(&state.pool, &campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("campaign {campaign_id} not found")))?;
    Ok(Json(view(campaign, unix_now())))
}

/// `GET /campaigns/:id/events`
pub async fn get_campaign_events(
    State(state): Shared,
    Path(raw_id): Path<String>,
) -> Result<Json<CampaignEventsResponse>, ApiError> {
    let campaign_id = parse_campaign_id(&raw_id)?;
    let events = db::get_events_for_campaign(&state.pool, &campaign_id).await?;
    Ok(Json(CampaignEventsResponse {
        campaign_id,
        count: events.len(),
        events,
    }))
}

/// `GET /donors/:address/events`
///
/// Donations and refunds made by one address, across campaigns.
pub async fn get_donor_events(
    State(state): Shared,
    Path(donor): Path<String>,
) -> Result<Json<DonorEventsResponse>, ApiError> {
    let events = db::get_events_for_donor(&state.pool, &donor).await?;
    Ok(Json(DonorEventsResponse {
        donor,
        count: events.len(),
        events,
    }))
}
