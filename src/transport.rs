//! RPC seam. Everything the client needs from the network goes through
//! [`RpcTransport`] so the core can run against a real cluster or an
//! in-memory ledger.

use async_trait::async_trait;
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use tracing::debug;

use crate::error::TransportError;

/// A blockhash and the last block height at which transactions built on it
/// are still accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Raw account as returned by the cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountData {
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, TransportError>;

    async fn get_block_height(&self) -> Result<u64, TransportError>;

    /// `None` when no account exists at `address`.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountData>, TransportError>;

    /// Submits and waits for confirmation. Ledger rejections come back as
    /// [`TransportError::Transaction`].
    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature, TransportError>;
}

/// [`RpcTransport`] over a Solana JSON-RPC endpoint.
pub struct SolanaRpcTransport {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaRpcTransport {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.into(), commitment),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        match err.get_transaction_error() {
            Some(tx_err) => TransportError::Transaction(tx_err),
            None => TransportError::Rpc(err.to_string()),
        }
    }
}

#[async_trait]
impl RpcTransport for SolanaRpcTransport {
    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, TransportError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        debug!(%blockhash, last_valid_block_height, "fetched latest blockhash");

        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn get_block_height(&self) -> Result<u64, TransportError> {
        Ok(self
            .client
            .get_block_height_with_commitment(self.commitment)
            .await?)
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountData>, TransportError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await?;

        Ok(response.value.map(|account| AccountData {
            owner: account.owner,
            lamports: account.lamports,
            data: account.data,
        }))
    }

    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature, TransportError> {
        Ok(self.client.send_and_confirm_transaction(transaction).await?)
    }
}
