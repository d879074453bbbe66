//! Program derived addresses for every account the voting program touches.
//!
//! Seed ordering must match the program exactly; nothing here is cached, every
//! caller re-derives from seeds.

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::{
    error::DerivationError,
    state::{PLATFORM_SEED, POSITION_SEED},
};

/// Canonical (first off-curve) address and bump for `seeds`.
pub fn find_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
    Pubkey::try_find_program_address(seeds, program_id).ok_or(DerivationError::SeedSearchExhausted {
        program_id: *program_id,
    })
}

/// Address for `seeds` with a known bump, `None` if that bump lands on curve.
pub fn create_address(seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> Option<Pubkey> {
    let bump = [bump];
    let mut with_bump = seeds.to_vec();
    with_bump.push(&bump);
    Pubkey::create_program_address(&with_bump, program_id).ok()
}

/// Cheap check of a stored bump, the same check the program runs.
pub fn verify_address(seeds: &[&[u8]], bump: u8, program_id: &Pubkey, expected: &Pubkey) -> bool {
    create_address(seeds, bump, program_id).as_ref() == Some(expected)
}

pub fn find_platform_address(program_id: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
    find_address(&[PLATFORM_SEED], program_id)
}

pub fn find_vault_address(platform: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
    find_address(&[platform.as_ref()], program_id)
}

pub fn find_vote_vault_address(vote: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
    find_address(&[vote.as_ref()], program_id)
}

pub fn find_position_address(
    vote: &Pubkey,
    voter: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DerivationError> {
    find_address(&[POSITION_SEED, vote.as_ref(), voter.as_ref()], program_id)
}

/// Associated token account of `owner` for `mint` under the classic token program.
pub fn find_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, DerivationError> {
    find_address(
        &[owner.as_ref(), spl_token::ID.as_ref(), mint.as_ref()],
        &spl_associated_token_account::ID,
    )
    .map(|(address, _)| address)
}

/// Platform-scoped addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformAddresses {
    pub program_id: Pubkey,
    pub platform: Pubkey,
    pub platform_bump: u8,
    pub vault: Pubkey,
    pub vault_bump: u8,
}

impl PlatformAddresses {
    pub fn resolve(program_id: &Pubkey) -> Result<Self, DerivationError> {
        let (platform, platform_bump) = find_platform_address(program_id)?;
        let (vault, vault_bump) = find_vault_address(&platform, program_id)?;

        Ok(Self {
            program_id: *program_id,
            platform,
            platform_bump,
            vault,
            vault_bump,
        })
    }
}

/// Every address a vote-scoped instruction needs, derived in one pass so all
/// builders share identical seeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountContext {
    pub platform: PlatformAddresses,
    pub vote: Pubkey,
    pub voter: Pubkey,
    pub token_mint: Pubkey,
    pub vote_vault: Pubkey,
    pub vote_vault_bump: u8,
    pub position: Pubkey,
    pub position_bump: u8,
    pub vote_vault_token_account: Pubkey,
    pub vault_token_account: Pubkey,
    pub voter_token_account: Pubkey,
}

impl AccountContext {
    pub fn resolve(
        program_id: &Pubkey,
        vote: &Pubkey,
        voter: &Pubkey,
        token_mint: &Pubkey,
    ) -> Result<Self, DerivationError> {
        let platform = PlatformAddresses::resolve(program_id)?;
        let (vote_vault, vote_vault_bump) = find_vote_vault_address(vote, program_id)?;
        let (position, position_bump) = find_position_address(vote, voter, program_id)?;

        let context = Self {
            platform,
            vote: *vote,
            voter: *voter,
            token_mint: *token_mint,
            vote_vault,
            vote_vault_bump,
            position,
            position_bump,
            vote_vault_token_account: find_associated_token_address(&vote_vault, token_mint)?,
            vault_token_account: find_associated_token_address(&platform.vault, token_mint)?,
            voter_token_account: find_associated_token_address(voter, token_mint)?,
        };
        debug!(
            vote = %context.vote,
            voter = %context.voter,
            position = %context.position,
            vote_vault = %context.vote_vault,
            "resolved account context"
        );
        Ok(context)
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.platform.program_id
    }
}
