extern crate std;

use soroban_sdk::{
    testutils::{Address as _, AuthorizedFunction},
    Address, BytesN, Env, IntoVal, String, Symbol, Val, Vec,
};

use crate::test::{Fixture, DURATION, GOAL};
use crate::{CrowdfundEscrow, CrowdfundEscrowClient, Error};

/// The last invocation needed exactly one signature, from `signer`, over
/// `function(args)` on the crowdfund contract.
fn assert_signed_by(f: &Fixture, signer: &Address, function: &str, args: Vec<Val>) {
    let auths = f.env.auths();
    assert_eq!(auths.len(), 1);
    let (address, invocation) = &auths[0];
    assert_eq!(address, signer);
    assert_eq!(
        invocation.function,
        AuthorizedFunction::Contract((
            f.client.address.clone(),
            Symbol::new(&f.env, function),
            args,
        ))
    );
}

#[test]
fn test_create_campaign_requires_creator_signature() {
    let f = Fixture::new();
    let creator = f.account(0);
    let title = f.text("Mars");
    let description = f.text("desc");
    let end_time = f.now() + DURATION;

    f.client
        .create_campaign(&creator, &title, &description, &GOAL, &end_time);

    assert_signed_by(
        &f,
        &creator,
        "create_campaign",
        (&creator, title, description, GOAL, end_time).into_val(&f.env),
    );
}

#[test]
fn test_donate_requires_donor_signature() {
    let f = Fixture::new();
    let creator = f.account(0);
    let donor = f.account(1_000);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);

    f.client.donate(&donor, &campaign.id, &40);

    assert_signed_by(
        &f,
        &donor,
        "donate",
        (&donor, campaign.id.clone(), 40u64).into_val(&f.env),
    );
}

#[test]
fn test_withdraw_requires_creator_signature() {
    let f = Fixture::new();
    let creator = f.account(0);
    let donor = f.account(1_000);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);
    f.client.donate(&donor, &campaign.id, &GOAL);
    f.set_time(campaign.end_time);

    f.client.withdraw(&creator, &campaign.id);

    assert_signed_by(
        &f,
        &creator,
        "withdraw",
        (&creator, campaign.id.clone()).into_val(&f.env),
    );
}

#[test]
fn test_refund_requires_donor_signature() {
    let f = Fixture::new();
    let creator = f.account(0);
    let donor = f.account(1_000);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);
    let donation = f.client.donate(&donor, &campaign.id, &25);

    f.client.refund(&donor, &campaign.id, &donation.id);

    assert_signed_by(
        &f,
        &donor,
        "refund",
        (&donor, campaign.id.clone(), donation.id.clone()).into_val(&f.env),
    );
}

#[test]
fn test_close_campaign_requires_creator_signature() {
    let f = Fixture::new();
    let creator = f.account(0);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);

    f.client.close_campaign(&creator, &campaign.id);

    assert_signed_by(
        &f,
        &creator,
        "close_campaign",
        (&creator, campaign.id.clone()).into_val(&f.env),
    );
}

#[test]
fn test_unsigned_calls_are_rejected_by_the_host() {
    // No mocked auths: every require_auth must fail.
    let env = Env::default();
    let asset = env.register_stellar_asset_contract_v2(Address::generate(&env));
    let contract_id = env.register(CrowdfundEscrow, (asset.address(),));
    let client = CrowdfundEscrowClient::new(&env, &contract_id);

    let caller = Address::generate(&env);
    let campaign_id = BytesN::from_array(&env, &[7u8; 32]);
    let title = String::from_str(&env, "Mars");

    assert!(matches!(
        client.try_create_campaign(&caller, &title, &title, &GOAL, &DURATION),
        Err(Err(_))
    ));
    assert!(matches!(
        client.try_donate(&caller, &campaign_id, &10),
        Err(Err(_))
    ));
    assert!(matches!(
        client.try_withdraw(&caller, &campaign_id),
        Err(Err(_))
    ));
    assert!(matches!(
        client.try_refund(&caller, &campaign_id, &campaign_id),
        Err(Err(_))
    ));
    assert!(matches!(
        client.try_close_campaign(&caller, &campaign_id),
        Err(Err(_))
    ));

    // Once signed, the same call reaches the contract's own checks.
    env.mock_all_auths();
    assert_eq!(
        client.try_donate(&caller, &campaign_id, &10),
        Err(Ok(Error::CampaignNotFound))
    );
}
