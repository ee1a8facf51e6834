#![allow(dead_code)]

extern crate std;

use crate::types::{Campaign, CampaignPhase, Donation};

/// INV-1: Campaign goal must always be positive.
pub fn assert_goal_positive(campaign: &Campaign) {
    assert!(
        campaign.goal > 0,
        "INV-1 violated: campaign has non-positive goal ({})",
        campaign.goal
    );
}

/// INV-2: A disbursed campaign holds nothing in escrow.
pub fn assert_disbursed_is_empty(campaign: &Campaign) {
    if campaign.withdrawn {
        assert_eq!(
            campaign.raised, 0,
            "INV-2 violated: withdrawn campaign still reports {} raised",
            campaign.raised
        );
    }
}

/// INV-3: Conservation. Until the pool is paid out, `raised` equals the sum
/// of the live donation records for the campaign.
pub fn assert_raised_matches_donations(campaign: &Campaign, donations: &[Donation]) {
    if campaign.withdrawn {
        return;
    }
    let total: u64 = donations
        .iter()
        .filter(|d| d.campaign == campaign.id)
        .map(|d| d.amount)
        .sum();
    assert_eq!(
        campaign.raised, total,
        "INV-3 violated: raised {} != sum of live donations {}",
        campaign.raised, total
    );
}

/// INV-4: A live donation record always carries a positive amount.
pub fn assert_donation_positive(donation: &Donation) {
    assert!(
        donation.amount > 0,
        "INV-4 violated: live donation with zero amount"
    );
}

/// INV-5: The contract's token balance equals the sum of `raised` across all
/// live campaigns.
pub fn assert_escrow_covers_campaigns(escrow_balance: i128, campaigns: &[Campaign]) {
    let total: i128 = campaigns.iter().map(|c| i128::from(c.raised)).sum();
    assert_eq!(
        escrow_balance, total,
        "INV-5 violated: escrow holds {} but campaigns report {}",
        escrow_balance, total
    );
}

/// INV-6: Donate invariant. After a donation of `amount`, `raised` grows by
/// exactly `amount`.
pub fn assert_donate_invariant(raised_before: u64, raised_after: u64, amount: u64) {
    assert_eq!(
        raised_after,
        raised_before + amount,
        "INV-6 violated: {} + {} != {}",
        raised_before,
        amount,
        raised_after
    );
}

/// INV-7: Phase transitions only move forward:
///   Open          -> EndedUnfunded | EndedFunded
///   EndedFunded   -> Disbursed
///   EndedUnfunded -> (none; closing removes the record)
///   Disbursed     -> (none)
pub fn assert_valid_phase_transition(from: CampaignPhase, to: CampaignPhase) {
    let valid = from == to
        || matches!(
            (from, to),
            (CampaignPhase::Open, CampaignPhase::EndedUnfunded)
                | (CampaignPhase::Open, CampaignPhase::EndedFunded)
                | (CampaignPhase::EndedFunded, CampaignPhase::Disbursed)
        );

    assert!(
        valid,
        "INV-7 violated: invalid phase transition from {:?} to {:?}",
        from, to
    );
}

/// INV-8: Fields fixed at creation never change.
pub fn assert_campaign_immutable_fields(original: &Campaign, current: &Campaign) {
    assert_eq!(original.id, current.id, "INV-8 violated: campaign id changed");
    assert_eq!(
        original.creator, current.creator,
        "INV-8 violated: campaign creator changed"
    );
    assert_eq!(
        original.title, current.title,
        "INV-8 violated: campaign title changed"
    );
    assert_eq!(
        original.description, current.description,
        "INV-8 violated: campaign description changed"
    );
    assert_eq!(original.goal, current.goal, "INV-8 violated: campaign goal changed");
    assert_eq!(
        original.end_time, current.end_time,
        "INV-8 violated: campaign end_time changed"
    );
}

/// Run all stateless campaign invariants.
pub fn assert_all_campaign_invariants(campaign: &Campaign) {
    assert_goal_positive(campaign);
    assert_disbursed_is_empty(campaign);
}
