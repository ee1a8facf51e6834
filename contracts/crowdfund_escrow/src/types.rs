//! # Types
//!
//! Records held by the crowdfunding ledger.
//!
//! ## Config / State split
//!
//! A [`Campaign`] is stored as two ledger entries:
//!
//! - [`CampaignConfig`]: written once by `create_campaign`; never mutated.
//! - [`CampaignState`]: rewritten by `donate`, `refund` and `withdraw`.
//!
//! The public API returns the reconstructed [`Campaign`].
//!
//! ## Phases
//!
//! [`CampaignPhase`] is derived from the stored record and the current time,
//! never stored:
//!
//! ```text
//! Open ──► EndedUnfunded ──► (closed: record removed)
//!   └────► EndedFunded ───► Disbursed
//! ```
//!
//! While `Open`, a refund can pull a funded campaign back under its goal, so
//! which `Ended*` phase a campaign lands in is only settled at `end_time`.

use soroban_sdk::{contracttype, Address, BytesN, String};

/// Maximum title length in bytes. The title is part of the campaign id.
pub const MAX_TITLE_LEN: u32 = 64;

/// Maximum description length in bytes.
pub const MAX_DESCRIPTION_LEN: u32 = 200;

/// Lifecycle phase of a campaign at a given instant.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CampaignPhase {
    /// Before `end_time`; donations and refunds accepted.
    Open,
    /// Past `end_time` below goal; donors may refund, creator may close once empty.
    EndedUnfunded,
    /// Past `end_time` at or above goal; only `withdraw` is possible.
    EndedFunded,
    /// Funds released to the creator. Terminal.
    Disbursed,
}

/// Immutable campaign fields, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignConfig {
    pub id: BytesN<32>,
    pub creator: Address,
    pub title: String,
    pub description: String,
    pub goal: u64,
    pub end_time: i64,
}

/// Mutable campaign fields.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignState {
    /// Net escrowed funds: donations minus refunds, reset to 0 on withdraw.
    pub raised: u64,
    /// Set once the pool has been paid out to the creator.
    pub withdrawn: bool,
}

/// Full representation of a fundraising campaign.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Campaign {
    /// Derived from `(creator, title)`; see [`crate::address::campaign_id`].
    pub id: BytesN<32>,
    /// Account that opened the campaign and receives the pool on success.
    pub creator: Address,
    pub title: String,
    pub description: String,
    /// Target amount in escrow-token units. Always > 0.
    pub goal: u64,
    /// Net escrowed amount.
    pub raised: u64,
    /// Unix timestamp (seconds) at which donations close.
    pub end_time: i64,
    /// `true` after a successful `withdraw`.
    pub withdrawn: bool,
}

impl Campaign {
    pub fn from_parts(config: CampaignConfig, state: CampaignState) -> Self {
        Campaign {
            id: config.id,
            creator: config.creator,
            title: config.title,
            description: config.description,
            goal: config.goal,
            raised: state.raised,
            end_time: config.end_time,
            withdrawn: state.withdrawn,
        }
    }

    pub fn has_ended(&self, now: i64) -> bool {
        now >= self.end_time
    }

    pub fn goal_reached(&self) -> bool {
        self.raised >= self.goal
    }

    pub fn phase(&self, now: i64) -> CampaignPhase {
        if self.withdrawn {
            CampaignPhase::Disbursed
        } else if !self.has_ended(now) {
            CampaignPhase::Open
        } else if self.goal_reached() {
            CampaignPhase::EndedFunded
        } else {
            CampaignPhase::EndedUnfunded
        }
    }
}

/// A donor's cumulative, not-yet-refunded contribution to one campaign.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Donation {
    /// Derived from `(campaign, donor)`; see [`crate::address::donation_id`].
    pub id: BytesN<32>,
    pub campaign: BytesN<32>,
    pub donor: Address,
    pub amount: u64,
}
