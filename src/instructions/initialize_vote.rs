use solana_sdk::{instruction::Instruction, system_program, sysvar};

use crate::pda::AccountContext;

define_instruction!(
    discriminant: 2,
    InitializeVote,
    accounts: {
        authority: signer => writable, desc: "Authority of the vault",
        platform: readonly, desc: "Platform pda key",
        vault: writable, desc: "platforms fee vault pda",
        vote: signer => writable, desc: "new vote account",
        token: readonly, desc: "vote token",
        vote_vault: writable, desc: "votes vault pda",
        vote_vault_token_account: writable, desc: "votes token account for storing funds",
        rent: readonly, desc: "Rent program",
        system_program: readonly, desc: "System program",
        token_program: readonly, desc: "Token program",
        associated_token_program: readonly, desc: "Associated Token program",
    },
    data: {
        time_to_add: [u8; 8],
    }
);

/// Creates the vote account at `context.vote` (a fresh keypair that must
/// co-sign) and its vault. The program adds `time_to_add` seconds to its own
/// clock to get the end timestamp, so the value may be any i64.
pub fn initialize_vote(context: &AccountContext, time_to_add: i64) -> Instruction {
    InitializeVote::instruction(
        context.program_id(),
        &InitializeVoteAccounts {
            authority: context.voter,
            platform: context.platform.platform,
            vault: context.platform.vault,
            vote: context.vote,
            token: context.token_mint,
            vote_vault: context.vote_vault,
            vote_vault_token_account: context.vote_vault_token_account,
            rent: sysvar::rent::ID,
            system_program: system_program::ID,
            token_program: spl_token::ID,
            associated_token_program: spl_associated_token_account::ID,
        },
        &InitializeVoteData {
            time_to_add: time_to_add.to_le_bytes(),
        },
    )
}
