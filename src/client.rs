//! High level voting operations. Each write is one pipeline: derive, encode,
//! assemble, sign, submit. Reads fetch fresh account state on every call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    config::{pubkey_string, ClientConfig},
    error::{DecodeError, EncodeError, LedgerError, VoteClientError, WalletError},
    instructions,
    pda::{self, AccountContext, PlatformAddresses},
    state::{self, PlatformState, PositionState, Side, TokenBalance, VoteState},
    transaction,
    transport::{RpcTransport, SolanaRpcTransport},
    utils::{calculate_fees, raw_amount_to_ui, ui_amount_to_raw},
    wallet::WalletSigner,
    watch::VoteWatch,
};

/// Stake used by [`VotingClient::cast_vote`] when no amount is given.
pub const DEFAULT_CAST_AMOUNT: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct CreateVoteParams {
    pub end_time: DateTime<Utc>,
    /// Falls back to the configured default mint.
    pub token_mint: Option<Pubkey>,
    /// Opens the creator's position in the same transaction, so the vote
    /// only exists if the stake lands too.
    pub initial_position: Option<(f64, Side)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatedVote {
    pub signature: Signature,
    pub vote: Pubkey,
}

/// What staking `amount` costs, including the platform fee taken on top.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeQuote {
    pub amount: u64,
    pub fee: u64,
    pub total: u64,
    pub fee_bps: u16,
    pub ui_amount: f64,
    pub ui_fee: f64,
    pub ui_total: f64,
}

pub struct VotingClient<T, W> {
    config: ClientConfig,
    transport: Arc<T>,
    wallet: W,
    signing_lock: Mutex<()>,
}

impl<W: WalletSigner> VotingClient<SolanaRpcTransport, W> {
    /// Client over JSON-RPC at the configured url.
    pub fn connect(config: ClientConfig, wallet: W) -> Self {
        let transport = SolanaRpcTransport::new(config.rpc_url.clone(), config.commitment_config());
        Self::new(config, Arc::new(transport), wallet)
    }
}

impl<T, W> VotingClient<T, W>
where
    T: RpcTransport + 'static,
    W: WalletSigner,
{
    pub fn new(config: ClientConfig, transport: Arc<T>, wallet: W) -> Self {
        Self {
            config,
            transport,
            wallet,
            signing_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    /// Creates a vote ending at `end_time`. The vote account is a fresh
    /// keypair that co-signs the creation and is discarded afterwards.
    pub async fn create_vote(&self, params: CreateVoteParams) -> Result<CreatedVote, VoteClientError> {
        let creator = self.wallet_pubkey()?;
        let time_to_add = (params.end_time - Utc::now()).num_seconds();
        if time_to_add <= 0 {
            return Err(EncodeError::EndTimeInPast.into());
        }

        let vote_keypair = Keypair::new();
        let vote = vote_keypair.pubkey();
        let mint = params.token_mint.unwrap_or(self.config.default_token_mint);
        let context = AccountContext::resolve(&self.config.program_id, &vote, &creator, &mint)?;

        let mut ixs = vec![instructions::initialize_vote(&context, time_to_add)];
        if let Some((amount, side)) = params.initial_position {
            let amount = ui_amount_to_raw(amount, self.config.token_decimals)?;
            ixs.push(instructions::initialize_position(&context, amount, side)?);
        }

        let signature = self.submit(&ixs, &[&vote_keypair]).await?;
        info!(%vote, %signature, time_to_add, bundled = ixs.len() > 1, "vote created");

        Ok(CreatedVote { signature, vote })
    }

    /// Opens the wallet's position on `vote`. Fails with
    /// [`LedgerError::PositionAlreadyExists`] if one is already open.
    pub async fn initialize_position(
        &self,
        vote: &Pubkey,
        amount: f64,
        side: Side,
        token_mint: Option<Pubkey>,
    ) -> Result<Signature, VoteClientError> {
        let amount = ui_amount_to_raw(amount, self.config.token_decimals)?;
        let context = self.vote_context(vote, token_mint).await?;
        let ix = instructions::initialize_position(&context, amount, side)?;

        let signature = self.submit(&[ix], &[]).await?;
        info!(%vote, %side, amount, %signature, "position opened");
        Ok(signature)
    }

    /// Stakes on `side`, one token unless `amount` is given.
    pub async fn cast_vote(
        &self,
        vote: &Pubkey,
        side: Side,
        amount: Option<f64>,
    ) -> Result<Signature, VoteClientError> {
        self.initialize_position(vote, amount.unwrap_or(DEFAULT_CAST_AMOUNT), side, None)
            .await
    }

    /// Adds to an existing position on its original side.
    pub async fn update_position(
        &self,
        vote: &Pubkey,
        amount: f64,
        token_mint: Option<Pubkey>,
    ) -> Result<Signature, VoteClientError> {
        let amount = ui_amount_to_raw(amount, self.config.token_decimals)?;
        let context = self.vote_context(vote, token_mint).await?;
        let ix = instructions::update_position(&context, amount)?;

        let signature = self.submit(&[ix], &[]).await?;
        info!(%vote, amount, %signature, "position updated");
        Ok(signature)
    }

    pub async fn redeem_winnings(
        &self,
        vote: &Pubkey,
        token_mint: Option<Pubkey>,
    ) -> Result<Signature, VoteClientError> {
        let context = self.vote_context(vote, token_mint).await?;
        let signature = self
            .submit(&[instructions::redeem_winnings(&context)], &[])
            .await?;
        info!(%vote, %signature, "winnings redeemed");
        Ok(signature)
    }

    /// Creates the platform with the wallet as its authority.
    pub async fn initialize_platform(&self, fee_bps: u16) -> Result<Signature, VoteClientError> {
        let authority = self.wallet_pubkey()?;
        let addresses = PlatformAddresses::resolve(&self.config.program_id)?;
        let ix = instructions::initialize_platform(&addresses, &authority, fee_bps);

        let signature = self.submit(&[ix], &[]).await?;
        info!(platform = %addresses.platform, fee_bps, %signature, "platform initialized");
        Ok(signature)
    }

    pub async fn update_platform(
        &self,
        new_authority: &Pubkey,
        new_fee_bps: u16,
    ) -> Result<Signature, VoteClientError> {
        let authority = self.wallet_pubkey()?;
        let addresses = PlatformAddresses::resolve(&self.config.program_id)?;
        let ix = instructions::update_platform(&addresses, &authority, new_authority, new_fee_bps);

        let signature = self.submit(&[ix], &[]).await?;
        info!(%new_authority, new_fee_bps, %signature, "platform updated");
        Ok(signature)
    }

    pub async fn vote_state(&self, vote: &Pubkey) -> Result<VoteState, VoteClientError> {
        state::fetch_vote_state(
            self.transport.as_ref(),
            &self.config.program_id,
            vote,
            self.config.token_decimals,
            Utc::now().timestamp(),
        )
        .await
    }

    /// Position of `voter` (the wallet when `None`) on `vote`.
    pub async fn position(
        &self,
        vote: &Pubkey,
        voter: Option<Pubkey>,
    ) -> Result<Option<PositionState>, VoteClientError> {
        let voter = match voter {
            Some(voter) => voter,
            None => self.wallet_pubkey()?,
        };
        let (address, _) = pda::find_position_address(vote, &voter, &self.config.program_id)?;
        state::fetch_position_state(
            self.transport.as_ref(),
            &self.config.program_id,
            &address,
            self.config.token_decimals,
        )
        .await
    }

    pub async fn platform(&self) -> Result<Option<PlatformState>, VoteClientError> {
        state::fetch_platform_state(self.transport.as_ref(), &self.config.program_id).await
    }

    pub async fn token_balance(&self, address: &Pubkey) -> Result<TokenBalance, VoteClientError> {
        state::fetch_token_balance(self.transport.as_ref(), address).await
    }

    /// Balance of the wallet's associated token account for `mint` (the
    /// configured default when `None`).
    pub async fn wallet_token_balance(&self, mint: Option<Pubkey>) -> Result<TokenBalance, VoteClientError> {
        let owner = self.wallet_pubkey()?;
        let mint = mint.unwrap_or(self.config.default_token_mint);
        let address = pda::find_associated_token_address(&owner, &mint)?;
        self.token_balance(&address).await
    }

    pub async fn quote_stake(&self, amount: f64) -> Result<StakeQuote, VoteClientError> {
        let decimals = self.config.token_decimals;
        let amount = ui_amount_to_raw(amount, decimals)?;
        let platform = match self.platform().await? {
            Some(platform) => platform,
            None => {
                let (address, _) = pda::find_platform_address(&self.config.program_id)?;
                return Err(DecodeError::NotFound { address }.into());
            }
        };

        let fee = calculate_fees(amount, platform.fee_bps);
        let total = amount.checked_add(fee).ok_or(EncodeError::AmountOverflow(raw_amount_to_ui(amount, decimals)))?;

        Ok(StakeQuote {
            amount,
            fee,
            total,
            fee_bps: platform.fee_bps,
            ui_amount: raw_amount_to_ui(amount, decimals),
            ui_fee: raw_amount_to_ui(fee, decimals),
            ui_total: raw_amount_to_ui(total, decimals),
        })
    }

    /// Polls `vote` on the configured interval until the handle is dropped.
    pub fn watch_vote(&self, vote: Pubkey) -> VoteWatch {
        VoteWatch::spawn(
            Arc::clone(&self.transport),
            self.config.program_id,
            vote,
            self.config.token_decimals,
            self.config.poll_interval(),
        )
    }

    fn wallet_pubkey(&self) -> Result<Pubkey, WalletError> {
        self.wallet.pubkey().ok_or(WalletError::NotConnected)
    }

    async fn vote_context(&self, vote: &Pubkey, token_mint: Option<Pubkey>) -> Result<AccountContext, VoteClientError> {
        let voter = self.wallet_pubkey()?;
        let mint = match token_mint {
            Some(mint) => mint,
            None => state::fetch_vote_token(self.transport.as_ref(), &self.config.program_id, vote).await?,
        };
        Ok(AccountContext::resolve(&self.config.program_id, vote, &voter, &mint)?)
    }

    async fn submit(&self, ixs: &[Instruction], local_signers: &[&Keypair]) -> Result<Signature, VoteClientError> {
        transaction::sign_and_submit(
            self.transport.as_ref(),
            &self.wallet,
            &self.signing_lock,
            &self.config.program_id,
            ixs,
            local_signers,
        )
        .await
    }
}

/// Coarse failure reasons a UI can branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Connect the wallet and try again.
    WalletNotReady,
    /// The user or the ledger said no.
    Rejected,
    /// Refetch and resubmit.
    Expired,
    InvalidInput,
    Unknown,
}

impl From<&VoteClientError> for FailureKind {
    fn from(err: &VoteClientError) -> Self {
        match err {
            VoteClientError::Wallet(WalletError::NotConnected) => FailureKind::WalletNotReady,
            VoteClientError::Wallet(WalletError::Rejected) => FailureKind::Rejected,
            VoteClientError::Ledger(LedgerError::BlockhashExpired) => FailureKind::Expired,
            VoteClientError::Ledger(_) => FailureKind::Rejected,
            VoteClientError::Encode(_) | VoteClientError::Derivation(_) => FailureKind::InvalidInput,
            VoteClientError::Wallet(WalletError::SigningFailed(_))
            | VoteClientError::Decode(_)
            | VoteClientError::Transport(_) => FailureKind::Unknown,
        }
    }
}

/// Result of a write operation in the shape handed to UI and persistence
/// callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "optional_pubkey")]
    pub vote_pubkey: Option<Pubkey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl TransactionOutcome {
    fn succeeded(signature: Signature, vote_pubkey: Option<Pubkey>) -> Self {
        Self {
            success: true,
            signature: Some(signature.to_string()),
            vote_pubkey,
            error: None,
            failure: None,
        }
    }

    fn failed(err: &VoteClientError) -> Self {
        Self {
            success: false,
            signature: None,
            vote_pubkey: None,
            error: Some(err.to_string()),
            failure: Some(FailureKind::from(err)),
        }
    }
}

impl From<Result<Signature, VoteClientError>> for TransactionOutcome {
    fn from(result: Result<Signature, VoteClientError>) -> Self {
        match result {
            Ok(signature) => Self::succeeded(signature, None),
            Err(err) => Self::failed(&err),
        }
    }
}

impl From<Result<CreatedVote, VoteClientError>> for TransactionOutcome {
    fn from(result: Result<CreatedVote, VoteClientError>) -> Self {
        match result {
            Ok(created) => Self::succeeded(created.signature, Some(created.vote)),
            Err(err) => Self::failed(&err),
        }
    }
}

mod optional_pubkey {
    use serde::Serializer;
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(pubkey: &Option<Pubkey>, serializer: S) -> Result<S::Ok, S::Error> {
        match pubkey {
            Some(pubkey) => super::pubkey_string::serialize(pubkey, serializer),
            None => serializer.serialize_none(),
        }
    }
}
