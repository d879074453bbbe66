use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::{
    config::pubkey_string,
    error::{DecodeError, VoteClientError},
    state::{expect_owned, log_malformed},
    transport::RpcTransport,
    utils::raw_amount_to_ui,
};

define_state! {
    /// One voter's stake in one vote.
    pub struct Position {
        pub amount: [u8; 8],
        pub side: u8,
        pub bump: u8,
    }
}

impl Position {
    pub fn amount(&self) -> u64 {
        u64::from_le_bytes(self.amount)
    }

    pub fn side(&self) -> Side {
        Side::from_byte(self.side)
    }
}

/// Which outcome a position backs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    No = 0,
    Yes = 1,
}

impl Side {
    /// The program treats any non-zero side byte as "yes".
    pub fn from_byte(byte: u8) -> Self {
        if byte == 0 {
            Side::No
        } else {
            Side::Yes
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        side as u8
    }
}

impl From<bool> for Side {
    fn from(yes: bool) -> Self {
        if yes {
            Side::Yes
        } else {
            Side::No
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(Side::Yes),
            "no" | "false" => Ok(Side::No),
            other => Err(format!("unknown side '{other}', expected yes or no")),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "yes"),
            Side::No => write!(f, "no"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    pub amount: u64,
    pub ui_amount: f64,
    pub side: Side,
    pub bump: u8,
}

impl PositionState {
    pub fn decode(address: Pubkey, data: &[u8], decimals: u8) -> Result<Self, DecodeError> {
        let position = Position::load(data)?;
        Ok(Self {
            address,
            amount: position.amount(),
            ui_amount: raw_amount_to_ui(position.amount(), decimals),
            side: position.side(),
            bump: position.bump,
        })
    }
}

/// Fetches a position. `None` means the voter never opened one, which is a
/// normal state rather than an error.
pub async fn fetch_position_state<T: RpcTransport + ?Sized>(
    transport: &T,
    program_id: &Pubkey,
    address: &Pubkey,
    decimals: u8,
) -> Result<Option<PositionState>, VoteClientError> {
    let Some(account) = transport.get_account(address).await? else {
        return Ok(None);
    };
    let data = expect_owned(address, Some(&account), program_id, "Position")?;
    PositionState::decode(*address, data, decimals)
        .map(Some)
        .map_err(|e| log_malformed(address, e).into())
}
