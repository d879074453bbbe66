use solana_sdk::instruction::Instruction;

use crate::{instructions::InitializePositionAccounts, pda::AccountContext};

define_instruction!(
    discriminant: 5,
    RedeemWinnings,
    accounts: {
        authority: signer => writable, desc: "Authority of the vault",
        platform: readonly, desc: "Platform pda key",
        vault: writable, desc: "platforms fee vault pda, receives the closed position's rent",
        vote: writable, desc: "vote account",
        token: readonly, desc: "vote token",
        vote_vault: readonly, desc: "votes vault pda",
        vote_vault_token_account: writable, desc: "votes token account for storing funds",
        authority_token_account: writable, desc: "authorities token account for storing funds",
        vault_token_account: writable, desc: "vault token account for storing funds",
        position: writable, desc: "position pda for voting on one side",
    },
    data: {}
);

/// Pays out a winning position after the vote ends. The payout itself is
/// computed by the program from the final tallies.
pub fn redeem_winnings(context: &AccountContext) -> Instruction {
    let accounts = InitializePositionAccounts::from_context(context);

    RedeemWinnings::instruction(
        context.program_id(),
        &RedeemWinningsAccounts {
            authority: accounts.authority,
            platform: accounts.platform,
            vault: accounts.vault,
            vote: accounts.vote,
            token: accounts.token,
            vote_vault: accounts.vote_vault,
            vote_vault_token_account: accounts.vote_vault_token_account,
            authority_token_account: accounts.authority_token_account,
            vault_token_account: accounts.vault_token_account,
            position: accounts.position,
        },
        &RedeemWinningsData {},
    )
}
