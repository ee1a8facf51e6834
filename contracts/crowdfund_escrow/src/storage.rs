//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the ledger. No
//! validation happens here; every rule lives in the contract entry points.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key           | Type      | Description                  |
//! |---------------|-----------|------------------------------|
//! | `EscrowToken` | `Address` | Token contract holding escrow |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                | Type             | Description                      |
//! |--------------------|------------------|----------------------------------|
//! | `CampConfig(id)`   | `CampaignConfig` | Immutable campaign configuration |
//! | `CampState(id)`    | `CampaignState`  | Raised total and payout flag     |
//! | `Donation(id)`     | `Donation`       | Per-donor cumulative amount      |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Every donate rewrites the campaign; keeping the title and description out
//! of that write leaves only ~10 bytes of `CampaignState` on the hot path.

use soroban_sdk::{contracttype, Address, BytesN, Env};

use crate::types::{Campaign, CampaignConfig, CampaignState, Donation};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Escrow asset (Instance).
    EscrowToken,
    /// Immutable campaign configuration keyed by campaign id (Persistent).
    CampConfig(BytesN<32>),
    /// Mutable campaign state keyed by campaign id (Persistent).
    CampState(BytesN<32>),
    /// Donation keyed by donation id (Persistent).
    Donation(BytesN<32>),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn set_escrow_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::EscrowToken, token);
    bump_instance(env);
}

/// Retrieve the escrow token.
/// Panics if the constructor never ran.
pub fn get_escrow_token(env: &Env) -> Address {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::EscrowToken)
        .expect("escrow token not set")
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

pub fn has_campaign(env: &Env, id: &BytesN<32>) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::CampConfig(id.clone()))
}

/// Write both entries of a new campaign.
pub fn save_campaign(env: &Env, campaign: &Campaign) {
    let config_key = DataKey::CampConfig(campaign.id.clone());
    let state_key = DataKey::CampState(campaign.id.clone());

    let config = CampaignConfig {
        id: campaign.id.clone(),
        creator: campaign.creator.clone(),
        title: campaign.title.clone(),
        description: campaign.description.clone(),
        goal: campaign.goal,
        end_time: campaign.end_time,
    };

    let state = CampaignState {
        raised: campaign.raised,
        withdrawn: campaign.withdrawn,
    };

    env.storage().persistent().set(&config_key, &config);
    env.storage().persistent().set(&state_key, &state);
    bump_persistent(env, &config_key);
    bump_persistent(env, &state_key);
}

/// Load the full `Campaign` by combining config and state.
pub fn load_campaign(env: &Env, id: &BytesN<32>) -> Option<Campaign> {
    let config = load_campaign_config(env, id)?;
    let state = load_campaign_state(env, id)?;
    Some(Campaign::from_parts(config, state))
}

pub fn load_campaign_config(env: &Env, id: &BytesN<32>) -> Option<CampaignConfig> {
    let key = DataKey::CampConfig(id.clone());
    let config: Option<CampaignConfig> = env.storage().persistent().get(&key);
    if config.is_some() {
        bump_persistent(env, &key);
    }
    config
}

pub fn load_campaign_state(env: &Env, id: &BytesN<32>) -> Option<CampaignState> {
    let key = DataKey::CampState(id.clone());
    let state: Option<CampaignState> = env.storage().persistent().get(&key);
    if state.is_some() {
        bump_persistent(env, &key);
    }
    state
}

/// Save only the mutable campaign state (donate, refund, withdraw).
pub fn save_campaign_state(env: &Env, id: &BytesN<32>, state: &CampaignState) {
    let key = DataKey::CampState(id.clone());
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

pub fn remove_campaign(env: &Env, id: &BytesN<32>) {
    env.storage()
        .persistent()
        .remove(&DataKey::CampConfig(id.clone()));
    env.storage()
        .persistent()
        .remove(&DataKey::CampState(id.clone()));
}

pub fn load_donation(env: &Env, id: &BytesN<32>) -> Option<Donation> {
    let key = DataKey::Donation(id.clone());
    let donation: Option<Donation> = env.storage().persistent().get(&key);
    if donation.is_some() {
        bump_persistent(env, &key);
    }
    donation
}

/// Create or overwrite a donation record.
pub fn save_donation(env: &Env, donation: &Donation) {
    let key = DataKey::Donation(donation.id.clone());
    env.storage().persistent().set(&key, donation);
    bump_persistent(env, &key);
}

pub fn remove_donation(env: &Env, id: &BytesN<32>) {
    env.storage()
        .persistent()
        .remove(&DataKey::Donation(id.clone()));
}
