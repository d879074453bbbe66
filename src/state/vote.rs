use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::{
    config::pubkey_string,
    error::{DecodeError, VoteClientError},
    state::{expect_owned, log_malformed},
    transport::RpcTransport,
    utils::raw_amount_to_ui,
};

define_state! {
    /// On-chain vote account. Tallies are in the token's smallest unit.
    pub struct Vote {
        pub token: [u8; 32],
        pub true_votes: [u8; 8],
        pub false_votes: [u8; 8],
        pub end_timestamp: [u8; 8],
        pub vault_bump: u8,
    }
}

impl Vote {
    pub fn token(&self) -> Pubkey {
        Pubkey::new_from_array(self.token)
    }

    pub fn yes_votes(&self) -> u64 {
        u64::from_le_bytes(self.true_votes)
    }

    pub fn no_votes(&self) -> u64 {
        u64::from_le_bytes(self.false_votes)
    }

    pub fn end_timestamp(&self) -> i64 {
        i64::from_le_bytes(self.end_timestamp)
    }
}

/// Decoded vote, unit-corrected for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteState {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub token: Pubkey,
    pub yes_votes: f64,
    pub no_votes: f64,
    #[serde(skip)]
    pub yes_raw: u64,
    #[serde(skip)]
    pub no_raw: u64,
    pub end_time: DateTime<Utc>,
    pub is_active: bool,
}

impl VoteState {
    /// Decodes raw vote bytes. `now` is unix seconds and only feeds `is_active`.
    pub fn decode(
        address: Pubkey,
        data: &[u8],
        decimals: u8,
        now: i64,
    ) -> Result<Self, DecodeError> {
        let vote = Vote::load(data)?;
        let end_timestamp = vote.end_timestamp();
        let end_time =
            DateTime::<Utc>::from_timestamp(end_timestamp, 0).ok_or_else(|| {
                DecodeError::Malformed {
                    layout: "Vote",
                    reason: format!("end timestamp {end_timestamp} out of range"),
                }
            })?;

        Ok(Self {
            address,
            token: vote.token(),
            yes_votes: raw_amount_to_ui(vote.yes_votes(), decimals),
            no_votes: raw_amount_to_ui(vote.no_votes(), decimals),
            yes_raw: vote.yes_votes(),
            no_raw: vote.no_votes(),
            end_time,
            is_active: now < end_timestamp,
        })
    }

    pub fn total_raw(&self) -> u64 {
        self.yes_raw.saturating_add(self.no_raw)
    }
}

/// Fetches and decodes a vote account owned by `program_id`.
pub async fn fetch_vote_state<T: RpcTransport + ?Sized>(
    transport: &T,
    program_id: &Pubkey,
    address: &Pubkey,
    decimals: u8,
    now: i64,
) -> Result<VoteState, VoteClientError> {
    let account = transport.get_account(address).await?;
    let data = expect_owned(address, account.as_ref(), program_id, "Vote")?;
    VoteState::decode(*address, data, decimals, now)
        .map_err(|e| log_malformed(address, e).into())
}

/// Reads only the mint a vote was created for.
pub async fn fetch_vote_token<T: RpcTransport + ?Sized>(
    transport: &T,
    program_id: &Pubkey,
    address: &Pubkey,
) -> Result<Pubkey, VoteClientError> {
    let account = transport.get_account(address).await?;
    let data = expect_owned(address, account.as_ref(), program_id, "Vote")?;
    let vote = Vote::load(data).map_err(|e| log_malformed(address, e))?;
    Ok(vote.token())
}
