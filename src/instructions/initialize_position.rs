use solana_sdk::instruction::Instruction;

use crate::{error::EncodeError, pda::AccountContext, state::Side};

define_instruction!(
    discriminant: 3,
    InitializePosition,
    accounts: {
        authority: signer => writable, desc: "Authority of the vault",
        platform: readonly, desc: "Platform pda key",
        vault: readonly, desc: "platforms fee vault pda",
        vote: writable, desc: "vote account",
        token: readonly, desc: "vote token",
        vote_vault: readonly, desc: "votes vault pda",
        vote_vault_token_account: writable, desc: "votes token account for storing funds",
        authority_token_account: writable, desc: "authorities token account for storing funds",
        vault_token_account: writable, desc: "vault token account for storing funds",
        position: writable, desc: "position pda for voting on one side",
    },
    data: {
        amount: [u8; 8],
        side: u8,
    }
);

impl InitializePositionAccounts {
    pub fn from_context(context: &AccountContext) -> Self {
        Self {
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
        }
    }
}

/// Opens the voter's position with `amount` raw token units on `side`.
pub fn initialize_position(
    context: &AccountContext,
    amount: u64,
    side: Side,
) -> Result<Instruction, EncodeError> {
    if amount == 0 {
        return Err(EncodeError::ZeroAmount);
    }

    Ok(InitializePosition::instruction(
        context.program_id(),
        &InitializePositionAccounts::from_context(context),
        &InitializePositionData {
            amount: amount.to_le_bytes(),
            side: side.into(),
        },
    ))
}
