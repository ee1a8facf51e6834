//! Folds decoded events into the per-campaign read model.
//!
//! The contract keeps no secondary index, so this is how clients enumerate
//! campaigns. Only newly inserted events are applied, so each event is folded
//! in exactly once.

use crate::errors::{IndexerError, Result};
use crate::events::{CampaignRecord, CampaignStatus, CrowdfundEvent, EventKind};

/// What to do with the stored campaign row after applying one event.
#[derive(Debug, PartialEq, Eq)]
pub enum Projection {
    Upsert(CampaignRecord),
    /// The event does not change the read model (unknown kind, or the
    /// campaign was created before indexing started).
    Ignore,
}

pub fn apply(current: Option<&CampaignRecord>, event: &CrowdfundEvent) -> Result<Projection> {
    let Some(campaign_id) = event.campaign_id.as_deref() else {
        return Ok(Projection::Ignore);
    };

    match (event.kind(), current) {
        (EventKind::CampaignCreated, _) => {
            let goal = parse_units(event.amount.as_deref(), "goal")?;
            let end_time = event
                .end_time
                .ok_or_else(|| IndexerError::EventParse("created event without end_time".into()))?;
            Ok(Projection::Upsert(CampaignRecord {
                campaign_id: campaign_id.to_string(),
                creator: event.actor.clone(),
                goal: goal.to_string(),
                raised: "0".to_string(),
                end_time,
                status: CampaignStatus::Active.as_str().to_string(),
                updated_ledger: event.ledger,
            }))
        }
        (EventKind::DonationMade, Some(row)) => {
            let raised = match event.raised.as_deref() {
                Some(raised) => parse_units(Some(raised), "raised")?,
                None => row
                    .raised_units()
                    .checked_add(parse_units(event.amount.as_deref(), "amount")?)
                    .ok_or_else(|| IndexerError::EventParse("raised overflows u64".into()))?,
            };
            Ok(Projection::Upsert(with_raised(row, raised, event.ledger)))
        }
        (EventKind::DonationRefunded, Some(row)) => {
            let raised = match event.raised.as_deref() {
                Some(raised) => parse_units(Some(raised), "raised")?,
                None => row
                    .raised_units()
                    .checked_sub(parse_units(event.amount.as_deref(), "amount")?)
                    .ok_or_else(|| IndexerError::EventParse("refund exceeds raised".into()))?,
            };
            Ok(Projection::Upsert(with_raised(row, raised, event.ledger)))
        }
        (EventKind::FundsWithdrawn, Some(row)) => {
            let mut next = with_raised(row, 0, event.ledger);
            next.status = CampaignStatus::Withdrawn.as_str().to_string();
            Ok(Projection::Upsert(next))
        }
        (EventKind::CampaignClosed, Some(row)) => {
            let mut next = with_raised(row, 0, event.ledger);
            next.status = CampaignStatus::Closed.as_str().to_string();
            Ok(Projection::Upsert(next))
        }
        _ => Ok(Projection::Ignore),
    }
}

fn with_raised(row: &CampaignRecord, raised: u64, ledger: i64) -> CampaignRecord {
    CampaignRecord {
        raised: raised.to_string(),
        updated_ledger: ledger,
        ..row.clone()
    }
}

fn parse_units(value: Option<&str>, field: &str) -> Result<u64> {
    value
        .ok_or_else(|| IndexerError::EventParse(format!("missing {field}")))?
        .parse()
        .map_err(|_| IndexerError::EventParse(format!("invalid {field}: {value:?}")))
}
