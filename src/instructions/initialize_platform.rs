use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_program};

use crate::pda::PlatformAddresses;

define_instruction!(
    discriminant: 0,
    InitializePlatform,
    accounts: {
        authority: signer => writable, desc: "Authority of the vault",
        platform: writable, desc: "Platform pda key",
        vault: writable, desc: "platforms fee vault pda",
        system_program: readonly, desc: "System program",
    },
    data: {
        fee: [u8; 2],
        platform_bump: u8,
        vault_bump: u8,
    }
);

/// Creates the platform config and fee vault. Bumps are the canonical ones
/// from derivation; the program trusts them and stores them.
pub fn initialize_platform(addresses: &PlatformAddresses, authority: &Pubkey, fee_bps: u16) -> Instruction {
    InitializePlatform::instruction(
        &addresses.program_id,
        &InitializePlatformAccounts {
            authority: *authority,
            platform: addresses.platform,
            vault: addresses.vault,
            system_program: system_program::ID,
        },
        &InitializePlatformData {
            fee: fee_bps.to_le_bytes(),
            platform_bump: addresses.platform_bump,
            vault_bump: addresses.vault_bump,
        },
    )
}
