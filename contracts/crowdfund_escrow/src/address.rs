//! # Address derivation
//!
//! Campaign and Donation records live at identifiers computed from their
//! public identifying fields, so any party can locate a record without an
//! index:
//!
//! ```text
//! campaign_id = sha256("space_mission" ‖ xdr(creator) ‖ xdr(title))
//! donation_id = sha256("donation"      ‖ campaign_id  ‖ xdr(donor))
//! ```
//!
//! The same derivation makes the pairs unique: a creator cannot open two
//! campaigns under one title, and a donor holds at most one live Donation per
//! campaign.

use soroban_sdk::{xdr::ToXdr, Address, Bytes, BytesN, Env, String};

const CAMPAIGN_NAMESPACE: &[u8] = b"space_mission";
const DONATION_NAMESPACE: &[u8] = b"donation";

pub fn campaign_id(env: &Env, creator: &Address, title: &String) -> BytesN<32> {
    let mut preimage = Bytes::from_slice(env, CAMPAIGN_NAMESPACE);
    preimage.append(&creator.clone().to_xdr(env));
    preimage.append(&title.clone().to_xdr(env));
    env.crypto().sha256(&preimage).to_bytes()
}

pub fn donation_id(env: &Env, campaign: &BytesN<32>, donor: &Address) -> BytesN<32> {
    let mut preimage = Bytes::from_slice(env, DONATION_NAMESPACE);
    let campaign_bytes: Bytes = campaign.clone().into();
    preimage.append(&campaign_bytes);
    preimage.append(&donor.clone().to_xdr(env));
    env.crypto().sha256(&preimage).to_bytes()
}
