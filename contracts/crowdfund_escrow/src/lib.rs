//! # Crowdfund Escrow Contract
//!
//! Creators open time-boxed campaigns with a goal; donors' funds are held by
//! this contract until the campaign settles. A funded campaign pays out to its
//! creator after `end_time`; an unfunded one lets every donor take their
//! contribution back.
//!
//! | Phase        | Entry Point(s)                                   |
//! |--------------|--------------------------------------------------|
//! | Deployment   | `__constructor` (binds the escrow token)         |
//! | Creation     | [`CrowdfundEscrow::create_campaign`]             |
//! | Funding      | [`CrowdfundEscrow::donate`]                      |
//! | Settlement   | [`CrowdfundEscrow::withdraw`], [`CrowdfundEscrow::refund`] |
//! | Cleanup      | [`CrowdfundEscrow::close_campaign`]              |
//! | Queries      | `get_campaign`, `get_donation`, `phase`, `campaign_id`, `donation_id`, `token` |
//!
//! ## Architecture
//!
//! Record identifiers come from [`address`]. Storage access is delegated to
//! [`storage`]. This file holds the entry points: every precondition is
//! checked before the first token transfer or ledger write. A failed check
//! returns an [`Error`], and a failed token transfer traps the host; either
//! way nothing the invocation did is kept.
//!
//! Authorization is two-step: the caller must sign (`require_auth`), and the
//! caller must be the party the record names (`creator` or `donor`).

#![no_std]

#[cfg(test)]
extern crate std;

use soroban_sdk::{
    contract, contracterror, contractimpl, token, Address, BytesN, Env, String,
};

pub mod address;
pub mod events;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_auth;
#[cfg(test)]
mod test_conservation;
#[cfg(test)]
mod test_events;

use events::{CampaignClosed, CampaignCreated, DonationMade, DonationRefunded, FundsWithdrawn};
pub use types::{
    Campaign, CampaignPhase, CampaignState, Donation, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    TitleTooLong        = 1,
    DescriptionTooLong  = 2,
    InvalidGoal         = 3,
    ZeroAmount          = 4,
    LowBalance          = 5,
    NotCreator          = 6,
    GoalNotReached      = 7,
    InvalidEndTime      = 8,
    CampaignEnded       = 9,
    CampaignNotEnded    = 10,
    CampaignSucceeded   = 11,
    NotDonor            = 12,
    NoDonation          = 13,
    CannotCloseCampaign = 14,
    AlreadyExists       = 15,
    CampaignNotFound    = 16,
    /// Escrow totals would leave the u64 range.
    AmountOverflow      = 17,
}

#[contract]
pub struct CrowdfundEscrow;

#[contractimpl]
impl CrowdfundEscrow {
    /// Bind the token contract that holds every campaign's escrow.
    pub fn __constructor(env: Env, token: Address) {
        storage::set_escrow_token(&env, &token);
    }

    // ─────────────────────────────────────────────────────────
    // State-changing entry points
    // ─────────────────────────────────────────────────────────

    /// Open a campaign at `campaign_id(creator, title)` with nothing raised.
    pub fn create_campaign(
        env: Env,
        creator: Address,
        title: String,
        description: String,
        goal: u64,
        end_time: i64,
    ) -> Result<Campaign, Error> {
        creator.require_auth();
        let now = now(&env);

        if title.len() > MAX_TITLE_LEN {
            return Err(Error::TitleTooLong);
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(Error::DescriptionTooLong);
        }
        if goal == 0 {
            return Err(Error::InvalidGoal);
        }
        if end_time <= now {
            return Err(Error::InvalidEndTime);
        }

        let id = address::campaign_id(&env, &creator, &title);
        if storage::has_campaign(&env, &id) {
            return Err(Error::AlreadyExists);
        }

        let campaign = Campaign {
            id: id.clone(),
            creator: creator.clone(),
            title,
            description,
            goal,
            raised: 0,
            end_time,
            withdrawn: false,
        };
        storage::save_campaign(&env, &campaign);

        events::emit_campaign_created(
            &env,
            &id,
            CampaignCreated {
                creator,
                goal,
                end_time,
            },
        );
        Ok(campaign)
    }

    /// Move `amount` from `donor` into escrow for an open campaign.
    ///
    /// Repeat donations from the same donor accumulate on a single record.
    pub fn donate(
        env: Env,
        donor: Address,
        campaign_id: BytesN<32>,
        amount: u64,
    ) -> Result<Donation, Error> {
        donor.require_auth();

        if amount == 0 {
            return Err(Error::ZeroAmount);
        }

        let now = now(&env);
        let campaign = require_campaign(&env, &campaign_id)?;
        if campaign.has_ended(now) {
            return Err(Error::CampaignEnded);
        }

        let token_client = token::Client::new(&env, &storage::get_escrow_token(&env));
        let units = i128::from(amount);
        if token_client.balance(&donor) < units {
            return Err(Error::LowBalance);
        }

        let raised = campaign
            .raised
            .checked_add(amount)
            .ok_or(Error::AmountOverflow)?;
        let donation_id = address::donation_id(&env, &campaign_id, &donor);
        let donation = match storage::load_donation(&env, &donation_id) {
            Some(mut existing) => {
                existing.amount = existing
                    .amount
                    .checked_add(amount)
                    .ok_or(Error::AmountOverflow)?;
                existing
            }
            None => Donation {
                id: donation_id,
                campaign: campaign_id.clone(),
                donor: donor.clone(),
                amount,
            },
        };

        token_client.transfer(&donor, &env.current_contract_address(), &units);

        storage::save_campaign_state(
            &env,
            &campaign_id,
            &CampaignState {
                raised,
                withdrawn: campaign.withdrawn,
            },
        );
        storage::save_donation(&env, &donation);

        events::emit_donation_made(
            &env,
            &campaign_id,
            DonationMade {
                donor,
                amount,
                raised,
            },
        );
        Ok(donation)
    }

    /// Pay the whole pool of an ended, funded campaign to its creator.
    ///
    /// The campaign record stays behind with `raised = 0` and
    /// `withdrawn = true`.
    pub fn withdraw(env: Env, creator: Address, campaign_id: BytesN<32>) -> Result<Campaign, Error> {
        creator.require_auth();
        let now = now(&env);
        let mut campaign = require_campaign(&env, &campaign_id)?;

        if campaign.creator != creator {
            return Err(Error::NotCreator);
        }
        if !campaign.goal_reached() {
            return Err(Error::GoalNotReached);
        }
        if !campaign.has_ended(now) {
            return Err(Error::CampaignNotEnded);
        }

        let amount = campaign.raised;
        let token_client = token::Client::new(&env, &storage::get_escrow_token(&env));
        token_client.transfer(
            &env.current_contract_address(),
            &creator,
            &i128::from(amount),
        );

        campaign.raised = 0;
        campaign.withdrawn = true;
        storage::save_campaign_state(
            &env,
            &campaign_id,
            &CampaignState {
                raised: campaign.raised,
                withdrawn: campaign.withdrawn,
            },
        );

        events::emit_funds_withdrawn(&env, &campaign_id, FundsWithdrawn { creator, amount });
        Ok(campaign)
    }

    /// Return a donor's full contribution and delete their donation record.
    ///
    /// Blocked only once the campaign has both ended and reached its goal (or
    /// already paid out). A campaign that hits its goal early can still be
    /// refunded against until `end_time`.
    ///
    /// Returns the refunded amount.
    pub fn refund(
        env: Env,
        donor: Address,
        campaign_id: BytesN<32>,
        donation_id: BytesN<32>,
    ) -> Result<u64, Error> {
        donor.require_auth();
        let now = now(&env);
        let campaign = require_campaign(&env, &campaign_id)?;

        let donation = storage::load_donation(&env, &donation_id)
            .filter(|donation| donation.campaign == campaign_id)
            .ok_or(Error::NoDonation)?;
        if donation.donor != donor {
            return Err(Error::NotDonor);
        }
        if campaign.withdrawn || (campaign.has_ended(now) && campaign.goal_reached()) {
            return Err(Error::CampaignSucceeded);
        }

        let raised = campaign
            .raised
            .checked_sub(donation.amount)
            .ok_or(Error::AmountOverflow)?;

        let token_client = token::Client::new(&env, &storage::get_escrow_token(&env));
        token_client.transfer(
            &env.current_contract_address(),
            &donor,
            &i128::from(donation.amount),
        );

        storage::save_campaign_state(
            &env,
            &campaign_id,
            &CampaignState {
                raised,
                withdrawn: false,
            },
        );
        storage::remove_donation(&env, &donation_id);

        events::emit_donation_refunded(
            &env,
            &campaign_id,
            DonationRefunded {
                donor,
                amount: donation.amount,
                raised,
            },
        );
        Ok(donation.amount)
    }

    /// Delete an empty campaign that never paid out.
    pub fn close_campaign(env: Env, creator: Address, campaign_id: BytesN<32>) -> Result<(), Error> {
        creator.require_auth();
        let campaign = require_campaign(&env, &campaign_id)?;

        if campaign.creator != creator {
            return Err(Error::NotCreator);
        }
        if campaign.raised != 0 || campaign.goal_reached() || campaign.withdrawn {
            return Err(Error::CannotCloseCampaign);
        }

        storage::remove_campaign(&env, &campaign_id);
        events::emit_campaign_closed(&env, &campaign_id, CampaignClosed { creator });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_campaign(env: Env, campaign_id: BytesN<32>) -> Result<Campaign, Error> {
        require_campaign(&env, &campaign_id)
    }

    pub fn get_donation(env: Env, donation_id: BytesN<32>) -> Result<Donation, Error> {
        storage::load_donation(&env, &donation_id).ok_or(Error::NoDonation)
    }

    /// Current lifecycle phase of a campaign.
    pub fn phase(env: Env, campaign_id: BytesN<32>) -> Result<CampaignPhase, Error> {
        Ok(require_campaign(&env, &campaign_id)?.phase(now(&env)))
    }

    pub fn campaign_id(env: Env, creator: Address, title: String) -> BytesN<32> {
        address::campaign_id(&env, &creator, &title)
    }

    pub fn donation_id(env: Env, campaign_id: BytesN<32>, donor: Address) -> BytesN<32> {
        address::donation_id(&env, &campaign_id, &donor)
    }

    /// The escrow token bound at deployment.
    pub fn token(env: Env) -> Address {
        storage::get_escrow_token(&env)
    }
}

/// Ledger close time, read once per invocation.
fn now(env: &Env) -> i64 {
    i64::try_from(env.ledger().timestamp()).unwrap_or(i64::MAX)
}

fn require_campaign(env: &Env, campaign_id: &BytesN<32>) -> Result<Campaign, Error> {
    storage::load_campaign(env, campaign_id).ok_or(Error::CampaignNotFound)
}
