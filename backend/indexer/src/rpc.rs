//! Soroban RPC client: polls `getEvents` and decodes crowdfund contract events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{CrowdfundEvent, EventKind};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

/// One entry of `getEvents` as returned with `"xdrFormat": "json"`: topics and
/// data arrive as the JSON rendering of their `ScVal`s instead of base64 XDR.
#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    #[serde(rename = "topicJson", default)]
    pub topic: Vec<Value>,
    #[serde(rename = "valueJson", default)]
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    /// Opaque cursor to resume after the last event of this page.
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// JSON-RPC codes that will not succeed on retry (invalid request, unknown method).
const HARD_RPC_ERRORS: [i64; 2] = [-32600, -32601];

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of crowdfund contract events.
///
/// Starts at `start_ledger` (inclusive) unless a `cursor` from a previous
/// page is given, in which case the cursor wins. Network errors, HTTP 429 and
/// soft RPC errors are retried with exponential back-off; only hard RPC errors
/// and undecodable bodies are returned to the caller.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventPage> {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let resp = match client.post(rpc_url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("getEvents request failed, retrying in {backoff}s: {e}");
                backoff = sleep_and_grow(backoff).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("RPC rate limit hit, retrying in {backoff}s");
            backoff = sleep_and_grow(backoff).await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if HARD_RPC_ERRORS.contains(&err.code) {
                return Err(IndexerError::EventParse(format!(
                    "getEvents rejected ({}): {}",
                    err.code, err.message
                )));
            }
            warn!(code = err.code, "getEvents error, retrying in {backoff}s: {}", err.message);
            backoff = sleep_and_grow(backoff).await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::EventParse("getEvents returned no result".to_string()))?;

        debug!(
            count = result.events.len(),
            latest_ledger = ?result.latest_ledger,
            "fetched event page"
        );

        return Ok(EventPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

async fn sleep_and_grow(backoff: u64) -> u64 {
    tokio::time::sleep(Duration::from_secs(backoff)).await;
    (backoff * 2).min(MAX_BACKOFF_SECS)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [{ "type": "contract", "contractIds": [contract_id] }],
        "pagination": { "limit": limit },
        "xdrFormat": "json",
    });

    match cursor {
        Some(cur) => params["pagination"]["cursor"] = json!(cur),
        None => params["startLedger"] = json!(start_ledger),
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a page of raw RPC events into [`CrowdfundEvent`] structs.
///
/// Events emitted by invocations that later failed were rolled back on
/// chain and are dropped, as are events without an RPC id, since the id is
/// what makes re-polling idempotent.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<CrowdfundEvent> {
    raw.iter()
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

/// Fields pulled out of an event's data payload.
#[derive(Debug, Default)]
struct Payload {
    actor: Option<String>,
    amount: Option<String>,
    raised: Option<String>,
    end_time: Option<i64>,
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<CrowdfundEvent> {
    if raw.in_successful_contract_call == Some(false) {
        debug!(id = ?raw.id, "skipping event from a failed invocation");
        return None;
    }
    let Some(event_id) = raw.id.clone() else {
        warn!(ledger = ?raw.ledger, "skipping event without an id");
        return None;
    };

    let kind = EventKind::from_topic(raw.topic.first().and_then(sc_symbol)?);
    let campaign_id = raw.topic.get(1).and_then(sc_bytes32);
    let payload = decode_data(&raw.value, kind);

    Some(CrowdfundEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        campaign_id,
        actor: payload.actor,
        amount: payload.amount,
        raised: payload.raised,
        end_time: payload.end_time,
        ledger: raw.ledger.unwrap_or(0) as i64,
        timestamp: raw
            .ledger_closed_at
            .as_deref()
            .and_then(parse_iso_to_unix)
            .unwrap_or(0),
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Every crowdfund payload is a `#[contracttype]` struct, which the RPC
/// renders as an `ScVal` map keyed by field-name symbols.
fn decode_data(value: &Value, kind: EventKind) -> Payload {
    let address = |name: &str| struct_field(value, name).and_then(sc_address);
    let units = |name: &str| {
        struct_field(value, name)
            .and_then(sc_u64)
            .map(|n| n.to_string())
    };

    match kind {
        EventKind::CampaignCreated => Payload {
            actor: address("creator"),
            amount: units("goal"),
            end_time: struct_field(value, "end_time").and_then(sc_i64),
            ..Payload::default()
        },
        EventKind::DonationMade | EventKind::DonationRefunded => Payload {
            actor: address("donor"),
            amount: units("amount"),
            raised: units("raised"),
            ..Payload::default()
        },
        EventKind::FundsWithdrawn => Payload {
            actor: address("creator"),
            amount: units("amount"),
            ..Payload::default()
        },
        EventKind::CampaignClosed => Payload {
            actor: address("creator"),
            ..Payload::default()
        },
        EventKind::Unknown => Payload::default(),
    }
}

// ── ScVal JSON accessors ─────────────────────────────────────────────

fn struct_field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value
        .get("map")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("key").and_then(sc_symbol) == Some(name))?
        .get("val")
}

fn sc_symbol(value: &Value) -> Option<&str> {
    value.get("symbol")?.as_str()
}

fn sc_address(value: &Value) -> Option<String> {
    value.get("address")?.as_str().map(String::from)
}

/// A 32-byte `bytes` value as lowercase hex.
fn sc_bytes32(value: &Value) -> Option<String> {
    let bytes = hex::decode(value.get("bytes")?.as_str()?).ok()?;
    (bytes.len() == 32).then(|| hex::encode(bytes))
}

fn sc_u64(value: &Value) -> Option<u64> {
    sc_integer(value.get("u64")?)
}

fn sc_i64(value: &Value) -> Option<i64> {
    sc_integer(value.get("i64")?)
}

/// 64-bit integers are rendered as decimal strings; plain numbers are
/// accepted too.
fn sc_integer<T: std::str::FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
