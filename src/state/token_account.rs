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
    /// Standard SPL token account layout.
    pub struct TokenAccount {
        pub mint: [u8; 32],
        pub owner: [u8; 32],
        pub amount: [u8; 8],
        pub delegate_option: [u8; 4],
        pub delegate: [u8; 32],
        pub state: u8,
        pub is_native_option: [u8; 4],
        pub is_native: [u8; 8],
        pub delegated_amount: [u8; 8],
        pub close_authority_option: [u8; 4],
        pub close_authority: [u8; 32],
    }

    /// Standard SPL mint layout, read for its decimals.
    pub struct Mint {
        pub mint_authority_option: [u8; 4],
        pub mint_authority: [u8; 32],
        pub supply: [u8; 8],
        pub decimals: u8,
        pub is_initialized: u8,
        pub freeze_authority_option: [u8; 4],
        pub freeze_authority: [u8; 32],
    }
}

impl TokenAccount {
    pub fn mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.mint)
    }

    pub fn owner(&self) -> Pubkey {
        Pubkey::new_from_array(self.owner)
    }

    pub fn amount(&self) -> u64 {
        u64::from_le_bytes(self.amount)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub owner: Pubkey,
    pub amount: u64,
    pub decimals: u8,
    pub ui_amount: f64,
}

impl TokenBalance {
    /// Decodes a token account. Decimals are not part of the token account
    /// layout and come from the mint.
    pub fn decode(address: Pubkey, data: &[u8], decimals: u8) -> Result<Self, DecodeError> {
        // Token-2022 accounts carry extensions after the base layout
        let base = data.get(..TokenAccount::LEN).ok_or_else(|| DecodeError::Malformed {
            layout: "TokenAccount",
            reason: format!("expected at least {} bytes, found {}", TokenAccount::LEN, data.len()),
        })?;
        let account = TokenAccount::load(base)?;

        Ok(Self {
            address,
            mint: account.mint(),
            owner: account.owner(),
            amount: account.amount(),
            decimals,
            ui_amount: raw_amount_to_ui(account.amount(), decimals),
        })
    }
}

pub fn decode_mint_decimals(data: &[u8]) -> Result<u8, DecodeError> {
    let base = data.get(..Mint::LEN).ok_or_else(|| DecodeError::Malformed {
        layout: "Mint",
        reason: format!("expected at least {} bytes, found {}", Mint::LEN, data.len()),
    })?;
    Ok(Mint::load(base)?.decimals)
}

pub async fn fetch_mint_decimals<T: RpcTransport + ?Sized>(
    transport: &T,
    mint: &Pubkey,
) -> Result<u8, VoteClientError> {
    let account = transport.get_account(mint).await?;
    let data = expect_owned(mint, account.as_ref(), &spl_token::ID, "Mint")?;
    decode_mint_decimals(data).map_err(|e| log_malformed(mint, e).into())
}

/// Fetches a token account and its mint's decimals.
pub async fn fetch_token_balance<T: RpcTransport + ?Sized>(
    transport: &T,
    address: &Pubkey,
) -> Result<TokenBalance, VoteClientError> {
    let account = transport.get_account(address).await?;
    let data = expect_owned(address, account.as_ref(), &spl_token::ID, "TokenAccount")?;
    let base = TokenBalance::decode(*address, data, 0).map_err(|e| log_malformed(address, e))?;
    let decimals = fetch_mint_decimals(transport, &base.mint).await?;

    Ok(TokenBalance {
        decimals,
        ui_amount: raw_amount_to_ui(base.amount, decimals),
        ..base
    })
}
