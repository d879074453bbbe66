use solana_sdk::instruction::Instruction;

use crate::{error::EncodeError, pda::AccountContext};

define_instruction!(
    discriminant: 4,
    UpdatePosition,
    accounts: {
        authority: signer => writable, desc: "Authority of the vault",
        platform: readonly, desc: "Platform pda key",
        vault: readonly, desc: "platforms fee vault pda",
        vote: writable, desc: "vote account",
        token: readonly, desc: "vote token",
        vote_vault: writable, desc: "votes vault pda",
        vote_vault_token_account: writable, desc: "votes token account for storing funds",
        authority_token_account: writable, desc: "authorities token account for storing funds",
        vault_token_account: writable, desc: "vault token account for storing funds",
        position: writable, desc: "position pda for voting on one side",
    },
    data: {
        amount: [u8; 8],
    }
);

/// Adds `amount` raw token units to an existing position. The side is fixed
/// when the position is opened.
pub fn update_position(context: &AccountContext, amount: u64) -> Result<Instruction, EncodeError> {
    if amount == 0 {
        return Err(EncodeError::ZeroAmount);
    }

    Ok(UpdatePosition::instruction(
        context.program_id(),
        &UpdatePositionAccounts {
            authority: context.voter,
            platform: context.platform.platform,
            vault: context.platform.vault,
            vote: context.vote,
            token: context.token_mint,
            vote_vault: context.vote_vault,
            vote_vault_token_account: context.vote_vault_token_account,
            authority_token_account: context.voter_token_account,
            vault_token_account: context.vault_token_account,
            position: context.position,
        },
        &UpdatePositionData {
            amount: amount.to_le_bytes(),
        },
    ))
}
