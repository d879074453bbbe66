pub mod platform;
pub mod position;
pub mod token_account;
pub mod vote;

pub use platform::*;
pub use position::*;
pub use token_account::*;
pub use vote::*;

use solana_sdk::pubkey::Pubkey;
use tracing::error;

use crate::{error::DecodeError, transport::AccountData};

// Seeds
pub const PLATFORM_SEED: &[u8; 6] = b"config";
pub const POSITION_SEED: &[u8; 8] = b"position";

/// Checks that a fetched account exists and is owned by `owner`, returning
/// its data. A wrong owner means the address does not hold the expected
/// layout at all, which is reported as malformed rather than missing.
pub(crate) fn expect_owned<'a>(
    address: &Pubkey,
    account: Option<&'a AccountData>,
    owner: &Pubkey,
    layout: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let account = account.ok_or(DecodeError::NotFound { address: *address })?;
    if account.owner != *owner {
        error!(%address, expected = %owner, found = %account.owner, layout, "account owner mismatch");
        return Err(DecodeError::Malformed {
            layout,
            reason: format!("owned by {}, expected {}", account.owner, owner),
        });
    }
    Ok(&account.data)
}

/// Logs a layout mismatch loudly before handing it back to the caller.
pub(crate) fn log_malformed(address: &Pubkey, err: DecodeError) -> DecodeError {
    if let DecodeError::Malformed { layout, reason } = &err {
        error!(%address, layout, reason = reason.as_str(), "malformed account data");
    }
    err
}
