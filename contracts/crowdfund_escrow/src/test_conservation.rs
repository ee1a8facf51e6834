//! Generated operation sequences checking the accounting invariants after
//! every step, whether the step succeeded or was rejected. Failing sequences
//! are shrunk by proptest to a minimal reproduction.

extern crate std;

use std::vec::Vec;

use proptest::prelude::*;
use soroban_sdk::{Address, BytesN};

use crate::invariants::{
    assert_all_campaign_invariants, assert_campaign_immutable_fields, assert_donation_positive,
    assert_escrow_covers_campaigns, assert_raised_matches_donations,
    assert_valid_phase_transition,
};
use crate::test::{Fixture, DURATION, GOAL};
use crate::{Campaign, CampaignPhase, Donation};

const DONORS: usize = 4;
const CAMPAIGNS: usize = 2;
const STARTING_BALANCE: i128 = 500;

/// One caller action against the two campaigns of a [`World`].
#[derive(Clone, Debug)]
enum Op {
    Donate { campaign: usize, donor: usize, amount: u64 },
    Refund { campaign: usize, donor: usize },
    Withdraw { campaign: usize },
    Close { campaign: usize },
    /// Move the ledger clock forward by this many seconds.
    Advance(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (0..CAMPAIGNS, 0..DONORS, 0u64..80)
            .prop_map(|(campaign, donor, amount)| Op::Donate { campaign, donor, amount }),
        1 => (0..CAMPAIGNS, 0..DONORS).prop_map(|(campaign, donor)| Op::Refund { campaign, donor }),
        1 => (0..CAMPAIGNS).prop_map(|campaign| Op::Withdraw { campaign }),
        1 => (0..CAMPAIGNS).prop_map(|campaign| Op::Close { campaign }),
        1 => (0..DURATION / 2).prop_map(Op::Advance),
    ]
}

struct World {
    f: Fixture,
    creator: Address,
    donors: Vec<Address>,
    originals: Vec<Campaign>,
    phases: Vec<Option<CampaignPhase>>,
}

impl World {
    fn new() -> Self {
        let f = Fixture::new();
        let creator = f.account(0);
        let donors = (0..DONORS).map(|_| f.account(STARTING_BALANCE)).collect();
        let originals = std::vec![
            f.open_campaign(&creator, "Mars", GOAL),
            f.open_campaign(&creator, "Venus", GOAL * 3),
        ];
        let phases = std::vec![Some(CampaignPhase::Open); originals.len()];
        World {
            f,
            creator,
            donors,
            originals,
            phases,
        }
    }

    fn live_campaign(&self, id: &BytesN<32>) -> Option<Campaign> {
        match self.f.client.try_get_campaign(id) {
            Ok(Ok(campaign)) => Some(campaign),
            _ => None,
        }
    }

    fn live_donations(&self, campaign_id: &BytesN<32>) -> Vec<Donation> {
        self.donors
            .iter()
            .filter_map(|donor| {
                let id = self.f.client.donation_id(campaign_id, donor);
                match self.f.client.try_get_donation(&id) {
                    Ok(Ok(donation)) => Some(donation),
                    _ => None,
                }
            })
            .collect()
    }

    fn apply(&self, op: &Op) {
        let client = &self.f.client;

        // Outcomes are ignored; rejected calls must leave no trace, which the
        // invariant check after each step confirms.
        match *op {
            Op::Donate { campaign, donor, amount } => {
                let _ = client.try_donate(&self.donors[donor], &self.originals[campaign].id, &amount);
            }
            Op::Refund { campaign, donor } => {
                let campaign_id = &self.originals[campaign].id;
                let donor = &self.donors[donor];
                let donation_id = client.donation_id(campaign_id, donor);
                let _ = client.try_refund(donor, campaign_id, &donation_id);
            }
            Op::Withdraw { campaign } => {
                let _ = client.try_withdraw(&self.creator, &self.originals[campaign].id);
            }
            Op::Close { campaign } => {
                let _ = client.try_close_campaign(&self.creator, &self.originals[campaign].id);
            }
            Op::Advance(seconds) => self.f.set_time(self.f.now() + seconds),
        }
    }

    fn check(&mut self) {
        let mut live = Vec::new();

        for (index, original) in self.originals.iter().enumerate() {
            let donations = self.live_donations(&original.id);
            for donation in &donations {
                assert_donation_positive(donation);
            }

            match self.live_campaign(&original.id) {
                Some(campaign) => {
                    assert_all_campaign_invariants(&campaign);
                    assert_campaign_immutable_fields(original, &campaign);
                    assert_raised_matches_donations(&campaign, &donations);

                    let phase = campaign.phase(self.f.now());
                    if let Some(previous) = self.phases[index] {
                        assert_valid_phase_transition(previous, phase);
                    }
                    self.phases[index] = Some(phase);
                    live.push(campaign);
                }
                None => {
                    // Closed: only legal for an empty, never-disbursed campaign.
                    assert!(donations.is_empty());
                    assert!(matches!(
                        self.phases[index],
                        Some(CampaignPhase::Open) | Some(CampaignPhase::EndedUnfunded) | None
                    ));
                    self.phases[index] = None;
                }
            }
        }

        assert_escrow_covers_campaigns(self.f.escrow_balance(), &live);

        // Tokens are only ever moved, never created or lost.
        let held: i128 = self
            .donors
            .iter()
            .map(|donor| self.f.token.balance(donor))
            .sum();
        let paid_out = self.f.token.balance(&self.creator);
        assert_eq!(
            held + self.f.escrow_balance() + paid_out,
            STARTING_BALANCE * DONORS as i128
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_conservation_holds_after_every_step(ops in prop::collection::vec(op(), 1..120)) {
        let mut world = World::new();
        world.check();
        for op in &ops {
            world.apply(op);
            world.check();
        }
    }
}
