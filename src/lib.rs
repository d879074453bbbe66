#[macro_use]
pub mod macros;
pub mod client;
pub mod config;
pub mod error;
pub mod instructions;
pub mod pda;
pub mod state;
pub mod transaction;
pub mod transport;
pub mod utils;
pub mod wallet;
pub mod watch;

// Instruction enum and discriminator names, generated from src/instructions by the build script
pub mod generated;

pub use client::{CreateVoteParams, CreatedVote, FailureKind, StakeQuote, TransactionOutcome, VotingClient};
pub use config::ClientConfig;
pub use error::*;
pub use state::Side;
pub use transport::{RpcTransport, SolanaRpcTransport};
pub use wallet::{KeypairWallet, WalletSigner};
pub use watch::{VoteSnapshot, VoteWatch};

solana_sdk::declare_id!("pVoTew8KNhq6rsrYq9jEUzKypytaLtQR62UbagWTCvu");
