//! Canonical event types emitted by the crowdfund escrow contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/crowdfund_escrow/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the crowdfund contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A campaign was opened (`created` topic).
    CampaignCreated,
    /// A donor moved funds into escrow (`donated` topic).
    DonationMade,
    /// The creator took the pool of a funded campaign (`withdrawn` topic).
    FundsWithdrawn,
    /// A donor took their contribution back (`refunded` topic).
    DonationRefunded,
    /// An empty, unfunded campaign was deleted (`closed` topic).
    CampaignClosed,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::CampaignCreated,
            "donated" => Self::DonationMade,
            "withdrawn" => Self::FundsWithdrawn,
            "refunded" => Self::DonationRefunded,
            "closed" => Self::CampaignClosed,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CampaignCreated => "campaign_created",
            Self::DonationMade => "donation_made",
            Self::FundsWithdrawn => "funds_withdrawn",
            Self::DonationRefunded => "donation_refunded",
            Self::CampaignClosed => "campaign_closed",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`].
    pub fn from_stored(s: &str) -> Self {
        match s {
            "campaign_created" => Self::CampaignCreated,
            "donation_made" => Self::DonationMade,
            "funds_withdrawn" => Self::FundsWithdrawn,
            "donation_refunded" => Self::DonationRefunded,
            "campaign_closed" => Self::CampaignClosed,
            _ => Self::Unknown,
        }
    }
}

/// A fully decoded crowdfund event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdfundEvent {
    /// RPC event id; unique per event and used to make inserts idempotent.
    pub event_id: String,
    pub event_type: String,
    /// Hex-encoded 32-byte campaign id.
    pub campaign_id: Option<String>,
    /// Creator or donor, depending on the event.
    pub actor: Option<String>,
    /// Goal for `campaign_created`, moved amount otherwise.
    pub amount: Option<String>,
    /// Campaign total after a donation or refund.
    pub raised: Option<String>,
    pub end_time: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

impl CrowdfundEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_stored(&self.event_type)
    }
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub campaign_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub raised: Option<String>,
    pub end_time: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Settlement status of an indexed campaign. Time-dependent phases are
/// computed on read by [`CampaignRecord::phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStatus {
    Active,
    Withdrawn,
    Closed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Withdrawn => "withdrawn",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "withdrawn" => Some(Self::Withdrawn),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Lifecycle phase as seen by clients, mirroring the contract's `phase` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignPhase {
    Open,
    EndedUnfunded,
    EndedFunded,
    Disbursed,
    Closed,
}

/// Read model of one campaign, rebuilt from its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignRecord {
    pub campaign_id: String,
    pub creator: Option<String>,
    /// Decimal u64.
    pub goal: String,
    /// Decimal u64.
    pub raised: String,
    pub end_time: i64,
    pub status: String,
    pub updated_ledger: i64,
}

impl CampaignRecord {
    pub fn goal_units(&self) -> u64 {
        self.goal.parse().unwrap_or(0)
    }

    pub fn raised_units(&self) -> u64 {
        self.raised.parse().unwrap_or(0)
    }

    pub fn phase(&self, now: i64) -> CampaignPhase {
        match CampaignStatus::parse(&self.status) {
            Some(CampaignStatus::Closed) => CampaignPhase::Closed,
            Some(CampaignStatus::Withdrawn) => CampaignPhase::Disbursed,
            _ if now < self.end_time => CampaignPhase::Open,
            _ if self.raised_units() >= self.goal_units() => CampaignPhase::EndedFunded,
            _ => CampaignPhase::EndedUnfunded,
        }
    }
}
