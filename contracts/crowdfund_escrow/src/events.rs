//! Events published by the contract.
//!
//! Every event uses the topic tuple `(symbol, campaign_id)` so an indexer can
//! filter by campaign without decoding the payload.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignCreated {
    pub creator: Address,
    pub goal: u64,
    pub end_time: i64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonationMade {
    pub donor: Address,
    pub amount: u64,
    /// Campaign total after this donation.
    pub raised: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsWithdrawn {
    pub creator: Address,
    pub amount: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonationRefunded {
    pub donor: Address,
    pub amount: u64,
    /// Campaign total after this refund.
    pub raised: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignClosed {
    pub creator: Address,
}

pub fn emit_campaign_created(env: &Env, campaign_id: &BytesN<32>, data: CampaignCreated) {
    env.events()
        .publish((symbol_short!("created"), campaign_id.clone()), data);
}

pub fn emit_donation_made(env: &Env, campaign_id: &BytesN<32>, data: DonationMade) {
    env.events()
        .publish((symbol_short!("donated"), campaign_id.clone()), data);
}

pub fn emit_funds_withdrawn(env: &Env, campaign_id: &BytesN<32>, data: FundsWithdrawn) {
    env.events()
        .publish((symbol_short!("withdrawn"), campaign_id.clone()), data);
}

pub fn emit_donation_refunded(env: &Env, campaign_id: &BytesN<32>, data: DonationRefunded) {
    env.events()
        .publish((symbol_short!("refunded"), campaign_id.clone()), data);
}

pub fn emit_campaign_closed(env: &Env, campaign_id: &BytesN<32>, data: CampaignClosed) {
    env.events()
        .publish((symbol_short!("closed"), campaign_id.clone()), data);
}
