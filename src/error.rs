use solana_sdk::{pubkey::Pubkey, transaction::TransactionError};
use thiserror::Error;

// Custom codes returned by the voting program as `InstructionError::Custom`.
define_program_errors! {
    pub enum VoteProgramError {
        PlatformKeyIncorrect = 6002,
        VaultKeyIncorrect = 6003,
        VoteVaultKeyIncorrect = 6004,
        PositionKeyIncorrect = 6005,
        VoteVaultTokenAccountIncorrect = 6006,
        /// Positions can no longer be opened or topped up
        VoteHasAlreadyEnded = 6007,
        /// Winnings can only be redeemed after the end timestamp
        VoteIsStillRunning = 6008,
        VoteWasTied = 6009,
        DidNotVoteForWinningSide = 6010,
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("no off-curve address found for seeds under program {program_id}")]
    SeedSearchExhausted { program_id: Pubkey },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("amount must be a positive finite number, got {0}")]
    InvalidAmount(f64),

    #[error("amount {0} is below the smallest token unit")]
    AmountTooSmall(f64),

    #[error("amount {0} does not fit in 64 bits after scaling")]
    AmountOverflow(f64),

    #[error("amount must be at least one smallest unit")]
    ZeroAmount,

    #[error("vote end time must be in the future")]
    EndTimeInPast,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet not connected or not ready")]
    NotConnected,

    #[error("user rejected the signing request")]
    Rejected,

    #[error("transaction signing failed: {0}")]
    SigningFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("blockhash expired before the transaction landed")]
    BlockhashExpired,

    #[error("insufficient funds for stake or fees")]
    InsufficientFunds,

    #[error("{instruction} failed with program error {error}")]
    Program {
        instruction: &'static str,
        error: VoteProgramError,
    },

    #[error("a position already exists for this vote and voter, use update position instead")]
    PositionAlreadyExists,

    #[error("token account {address} does not exist or is not owned by the token program")]
    TokenAccountMissing { address: Pubkey },

    #[error("transaction rejected: {0}")]
    Rejected(TransactionError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("account {address} not found")]
    NotFound { address: Pubkey },

    #[error("malformed {layout} account: {reason}")]
    Malformed { layout: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The ledger processed and rejected the transaction.
    #[error("transaction error: {0}")]
    Transaction(TransactionError),

    #[error("rpc request failed: {0}")]
    Rpc(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoteClientError {
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl VoteClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Decode(DecodeError::NotFound { .. }))
    }
}
