//! Indexer configuration, read from environment variables (optionally via `.env`).
//!
//! | Variable             | Default                               |
//! |----------------------|---------------------------------------|
//! | `RPC_URL`            | `https://soroban-testnet.stellar.org` |
//! | `CONTRACT_ID`        | required                              |
//! | `DATABASE_URL`       | `sqlite:./crowdfund_events.db`        |
//! | `API_PORT`           | `3001`                                |
//! | `POLL_INTERVAL_SECS` | `5`                                   |
//! | `EVENTS_PER_PAGE`    | `100`                                 |
//! | `START_LEDGER`       | `0`                                   |

use std::str::FromStr;

use crate::errors::{IndexerError, Result};

const DEFAULT_RPC_URL: &str = "https://soroban-testnet.stellar.org";
const DEFAULT_DATABASE_URL: &str = "sqlite:./crowdfund_events.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rpc_url: String,
    /// Crowdfund escrow contract address (strkey).
    pub contract_id: String,
    pub database_url: String,
    pub api_port: u16,
    pub poll_interval_secs: u64,
    /// Page size for `getEvents`.
    pub events_per_page: u32,
    /// First ledger to scan when no cursor has been saved yet.
    pub start_ledger: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let contract_id = lookup("CONTRACT_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| IndexerError::Config("CONTRACT_ID is required".to_string()))?;

        Ok(Config {
            rpc_url: lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            contract_id,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            api_port: parsed(&lookup, "API_PORT", 3001)?,
            poll_interval_secs: parsed(&lookup, "POLL_INTERVAL_SECS", 5)?,
            events_per_page: parsed(&lookup, "EVENTS_PER_PAGE", 100)?,
            start_ledger: parsed(&lookup, "START_LEDGER", 0)?,
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IndexerError::Config(format!("invalid {key}: {raw:?}"))),
    }
}
