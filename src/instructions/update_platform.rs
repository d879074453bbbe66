use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_program, sysvar};

use crate::pda::PlatformAddresses;

define_instruction!(
    discriminant: 1,
    UpdatePlatform,
    accounts: {
        authority: signer => writable, desc: "Authority of the vault",
        new_authority: readonly, desc: "New authority of the vault",
        platform: writable, desc: "Platform pda key",
        vault: readonly, desc: "platforms fee vault pda",
        rent: readonly, desc: "Rent program",
        system_program: readonly, desc: "System program",
    },
    data: {
        new_fee: [u8; 2],
    }
);

/// Hands the platform to `new_authority` and sets a new fee. Passing the
/// current authority keeps ownership and only changes the fee.
pub fn update_platform(
    addresses: &PlatformAddresses,
    authority: &Pubkey,
    new_authority: &Pubkey,
    new_fee_bps: u16,
) -> Instruction {
    UpdatePlatform::instruction(
        &addresses.program_id,
        &UpdatePlatformAccounts {
            authority: *authority,
            new_authority: *new_authority,
            platform: addresses.platform,
            vault: addresses.vault,
            rent: sysvar::rent::ID,
            system_program: system_program::ID,
        },
        &UpdatePlatformData {
            new_fee: new_fee_bps.to_le_bytes(),
        },
    )
}
