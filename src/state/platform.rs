use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::{
    config::pubkey_string,
    error::{DecodeError, VoteClientError},
    pda,
    state::{expect_owned, log_malformed, PLATFORM_SEED},
    transport::RpcTransport,
};

define_state! {
    /// Singleton platform config.
    pub struct Platform {
        pub authority: [u8; 32],
        pub fee: [u8; 2],
        pub platform_bump: u8,
        pub vault_bump: u8,
    }
}

impl Platform {
    pub fn authority(&self) -> Pubkey {
        Pubkey::new_from_array(self.authority)
    }

    pub fn fee_bps(&self) -> u16 {
        u16::from_le_bytes(self.fee)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformState {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub authority: Pubkey,
    pub fee_bps: u16,
    pub platform_bump: u8,
    #[serde(with = "pubkey_string")]
    pub vault: Pubkey,
    pub vault_bump: u8,
}

impl PlatformState {
    /// Decodes the platform and checks both stored bumps rederive the
    /// platform and vault addresses.
    pub fn decode(address: Pubkey, data: &[u8], program_id: &Pubkey) -> Result<Self, DecodeError> {
        let platform = Platform::load(data)?;

        if !pda::verify_address(&[PLATFORM_SEED], platform.platform_bump, program_id, &address) {
            return Err(DecodeError::Malformed {
                layout: "Platform",
                reason: format!("stored bump {} does not derive {address}", platform.platform_bump),
            });
        }
        let vault = pda::create_address(&[address.as_ref()], platform.vault_bump, program_id)
            .ok_or_else(|| DecodeError::Malformed {
                layout: "Platform",
                reason: format!("stored vault bump {} is on curve", platform.vault_bump),
            })?;

        Ok(Self {
            address,
            authority: platform.authority(),
            fee_bps: platform.fee_bps(),
            platform_bump: platform.platform_bump,
            vault,
            vault_bump: platform.vault_bump,
        })
    }
}

/// Fetches the platform config. `None` until the platform is initialized.
pub async fn fetch_platform_state<T: RpcTransport + ?Sized>(
    transport: &T,
    program_id: &Pubkey,
) -> Result<Option<PlatformState>, VoteClientError> {
    let (address, _) = pda::find_platform_address(program_id)?;
    let Some(account) = transport.get_account(&address).await? else {
        return Ok(None);
    };
    let data = expect_owned(&address, Some(&account), program_id, "Platform")?;
    PlatformState::decode(address, data, program_id)
        .map(Some)
        .map_err(|e| log_malformed(&address, e).into())
}
