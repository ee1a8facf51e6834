extern crate std;

use soroban_sdk::{symbol_short, testutils::Events, vec, IntoVal, Symbol, TryIntoVal, Val};

use crate::events::{
    CampaignClosed, CampaignCreated, DonationMade, DonationRefunded, FundsWithdrawn,
};
use crate::test::{Fixture, GOAL};

/// Topics and payload of the most recent event, asserting it came from the
/// crowdfund contract.
fn last_event(f: &Fixture) -> (soroban_sdk::Vec<Val>, Val) {
    let all_events = f.env.events().all();
    let (contract, topics, data) = all_events.last().expect("No events found");
    assert_eq!(contract, f.client.address);
    (topics, data)
}

fn topics(f: &Fixture, name: Symbol, campaign_id: &soroban_sdk::BytesN<32>) -> soroban_sdk::Vec<Val> {
    vec![&f.env, name.into_val(&f.env), campaign_id.into_val(&f.env)]
}

#[test]
fn test_campaign_created_event() {
    let f = Fixture::new();
    let creator = f.account(0);

    let campaign = f.open_campaign(&creator, "Mars", GOAL);

    let (event_topics, data) = last_event(&f);
    assert_eq!(event_topics, topics(&f, symbol_short!("created"), &campaign.id));
    let data: CampaignCreated = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        data,
        CampaignCreated {
            creator,
            goal: GOAL,
            end_time: campaign.end_time,
        }
    );
}

#[test]
fn test_donation_made_event() {
    let f = Fixture::new();
    let creator = f.account(0);
    let donor = f.account(1_000);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);

    f.client.donate(&donor, &campaign.id, &30);
    f.client.donate(&donor, &campaign.id, &12);

    let (event_topics, data) = last_event(&f);
    assert_eq!(event_topics, topics(&f, symbol_short!("donated"), &campaign.id));
    let data: DonationMade = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        data,
        DonationMade {
            donor,
            amount: 12,
            raised: 42,
        }
    );
}

#[test]
fn test_funds_withdrawn_event() {
    let f = Fixture::new();
    let creator = f.account(0);
    let donor = f.account(1_000);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);

    f.client.donate(&donor, &campaign.id, &(GOAL + 5));
    f.set_time(campaign.end_time);
    f.client.withdraw(&creator, &campaign.id);

    let (event_topics, data) = last_event(&f);
    assert_eq!(
        event_topics,
        topics(&f, symbol_short!("withdrawn"), &campaign.id)
    );
    let data: FundsWithdrawn = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        data,
        FundsWithdrawn {
            creator,
            amount: GOAL + 5,
        }
    );
}

#[test]
fn test_donation_refunded_event() {
    let f = Fixture::new();
    let creator = f.account(0);
    let alice = f.account(1_000);
    let bob = f.account(1_000);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);

    f.client.donate(&alice, &campaign.id, &20);
    let bobs = f.client.donate(&bob, &campaign.id, &15);
    f.client.refund(&bob, &campaign.id, &bobs.id);

    let (event_topics, data) = last_event(&f);
    assert_eq!(
        event_topics,
        topics(&f, symbol_short!("refunded"), &campaign.id)
    );
    let data: DonationRefunded = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        data,
        DonationRefunded {
            donor: bob,
            amount: 15,
            raised: 20,
        }
    );
}

#[test]
fn test_campaign_closed_event() {
    let f = Fixture::new();
    let creator = f.account(0);
    let campaign = f.open_campaign(&creator, "Mars", GOAL);

    f.client.close_campaign(&creator, &campaign.id);

    let (event_topics, data) = last_event(&f);
    assert_eq!(event_topics, topics(&f, symbol_short!("closed"), &campaign.id));
    let data: CampaignClosed = data.try_into_val(&f.env).unwrap();
    assert_eq!(data, CampaignClosed { creator });
}
