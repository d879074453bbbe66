use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    signer::SignerError,
    transaction::Transaction,
};

use crate::error::WalletError;

/// The connected wallet. It pays fees and signs as the transaction's fee
/// payer; it never submits on its own.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// `None` while no account is connected.
    fn pubkey(&self) -> Option<Pubkey>;

    /// Adds the wallet's signature to an assembled transaction, keeping
    /// signatures already present.
    async fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError>;
}

/// Wallet backed by a local keypair, for scripts, tests and servers.
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

impl From<SignerError> for WalletError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::UserCancel(_) => WalletError::Rejected,
            other => WalletError::SigningFailed(other.to_string()),
        }
    }
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    fn pubkey(&self) -> Option<Pubkey> {
        Some(self.keypair.pubkey())
    }

    async fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_partial_sign(&[&self.keypair], blockhash)?;
        Ok(())
    }
}
