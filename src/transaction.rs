//! Transaction assembly, signing and submission.
//!
//! One call is one pipeline: blockhash, assemble, sign, expiry check, send.
//! Nothing here retries; a failed submission is reported and the caller
//! decides whether to start over with a fresh blockhash.

use solana_sdk::{
    instruction::{Instruction, InstructionError},
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::{Transaction, TransactionError},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::{LedgerError, TransportError, VoteClientError, VoteProgramError, WalletError},
    generated::instruction_name,
    instructions::InitializePosition,
    transport::{LatestBlockhash, RpcTransport},
    wallet::WalletSigner,
};

/// An unsigned transaction bound to a blockhash lifetime.
#[derive(Clone, Debug)]
pub struct PreparedTransaction {
    pub transaction: Transaction,
    pub last_valid_block_height: u64,
}

/// Builds one legacy transaction from `instructions`, in order, paid by
/// `fee_payer`. Bundled instructions land or fail together.
pub fn assemble(instructions: &[Instruction], fee_payer: &Pubkey, lifetime: &LatestBlockhash) -> PreparedTransaction {
    let message = Message::new_with_blockhash(instructions, Some(fee_payer), &lifetime.blockhash);
    debug!(
        instructions = instructions.len(),
        signers = message.header.num_required_signatures,
        blockhash = %lifetime.blockhash,
        "assembled transaction"
    );

    PreparedTransaction {
        transaction: Transaction::new_unsigned(message),
        last_valid_block_height: lifetime.last_valid_block_height,
    }
}

/// Submits `instructions` as a single transaction signed by the wallet and
/// any `local_signers` (such as a freshly generated vote keypair).
pub async fn sign_and_submit<T, W>(
    transport: &T,
    wallet: &W,
    signing_lock: &Mutex<()>,
    program_id: &Pubkey,
    instructions: &[Instruction],
    local_signers: &[&Keypair],
) -> Result<Signature, VoteClientError>
where
    T: RpcTransport + ?Sized,
    W: WalletSigner + ?Sized,
{
    let fee_payer = wallet.pubkey().ok_or(WalletError::NotConnected)?;
    let lifetime = transport.get_latest_blockhash().await?;
    let PreparedTransaction {
        mut transaction,
        last_valid_block_height,
    } = assemble(instructions, &fee_payer, &lifetime);

    if !local_signers.is_empty() {
        transaction
            .try_partial_sign(local_signers, lifetime.blockhash)
            .map_err(WalletError::from)?;
    }

    {
        // one wallet prompt at a time
        let _guard = signing_lock.lock().await;
        wallet.sign_transaction(&mut transaction).await?;
    }
    if !transaction.is_signed() {
        return Err(WalletError::SigningFailed("transaction is missing required signatures".to_string()).into());
    }

    let block_height = transport.get_block_height().await?;
    if block_height > last_valid_block_height {
        warn!(block_height, last_valid_block_height, "blockhash expired before submission");
        return Err(LedgerError::BlockhashExpired.into());
    }

    let signature = match transport.send_and_confirm_transaction(&transaction).await {
        Ok(signature) => signature,
        Err(err) => {
            let message = &transaction.message;
            return Err(explain_failure(transport, err, message, program_id, last_valid_block_height).await);
        }
    };
    info!(%signature, "transaction confirmed");

    Ok(signature)
}

/// Turns a failed submission into the error reported to the caller, asking
/// the ledger when the rejection alone is ambiguous.
pub async fn explain_failure<T>(
    transport: &T,
    err: TransportError,
    message: &Message,
    program_id: &Pubkey,
    last_valid_block_height: u64,
) -> VoteClientError
where
    T: RpcTransport + ?Sized,
{
    match err {
        TransportError::Transaction(tx_err) => {
            let ledger_err = match classify_transaction_error(tx_err.clone(), message, program_id) {
                LedgerError::PositionAlreadyExists => {
                    confirm_position_conflict(transport, tx_err, message, program_id).await
                }
                other => other,
            };
            warn!(error = %ledger_err, "transaction rejected");
            ledger_err.into()
        }
        TransportError::Rpc(reason) => {
            // confirmation gives up without a transaction error once the blockhash lapses
            match transport.get_block_height().await {
                Ok(block_height) if block_height > last_valid_block_height => {
                    warn!(block_height, last_valid_block_height, %reason, "blockhash expired while confirming");
                    LedgerError::BlockhashExpired.into()
                }
                _ => TransportError::Rpc(reason).into(),
            }
        }
    }
}

/// The program rejects a missing token account with the same error as an
/// existing position, so look at the accounts before blaming the position.
async fn confirm_position_conflict<T>(
    transport: &T,
    err: TransactionError,
    message: &Message,
    program_id: &Pubkey,
) -> LedgerError
where
    T: RpcTransport + ?Sized,
{
    let TransactionError::InstructionError(index, _) = &err else {
        return LedgerError::Rejected(err);
    };
    let index = *index;

    if let Some(position) = position_instruction_account(message, index, "position") {
        match transport.get_account(&position).await {
            Ok(Some(account)) if account.owner == *program_id => return LedgerError::PositionAlreadyExists,
            Ok(_) => {}
            Err(fetch_err) => warn!(%position, error = %fetch_err, "could not check position account"),
        }
    }

    for name in ["authority_token_account", "vault_token_account"] {
        let Some(address) = position_instruction_account(message, index, name) else {
            continue;
        };
        match transport.get_account(&address).await {
            Ok(Some(account)) if account.owner == spl_token::ID => {}
            Ok(_) => return LedgerError::TokenAccountMissing { address },
            Err(fetch_err) => warn!(%address, error = %fetch_err, "could not check token account"),
        }
    }

    LedgerError::Rejected(err)
}

/// Address passed as the named InitializePosition account of instruction `index`.
fn position_instruction_account(message: &Message, index: u8, name: &str) -> Option<Pubkey> {
    let slot = InitializePosition::ACCOUNTS
        .iter()
        .position(|(account, _)| *account == name)?;
    let instruction = message.instructions.get(index as usize)?;
    let key = *instruction.accounts.get(slot)?;
    message.account_keys.get(key as usize).copied()
}

/// Maps a ledger rejection to the failure the caller can act on. Owner and
/// already-initialized errors on InitializePosition come back as
/// `PositionAlreadyExists`; [`explain_failure`] checks them against the ledger.
pub fn classify_transaction_error(err: TransactionError, message: &Message, program_id: &Pubkey) -> LedgerError {
    match &err {
        TransactionError::BlockhashNotFound => LedgerError::BlockhashExpired,
        TransactionError::InsufficientFundsForFee | TransactionError::InsufficientFundsForRent { .. } => {
            LedgerError::InsufficientFunds
        }
        TransactionError::InstructionError(index, ix_err) => {
            let instruction = program_instruction_name(message, *index, program_id);
            let opens_position = instruction == Some(InitializePosition::NAME);

            match ix_err {
                InstructionError::Custom(code) => match (instruction, VoteProgramError::from_code(*code)) {
                    (Some(instruction), Some(error)) => LedgerError::Program { instruction, error },
                    // system AccountAlreadyInUse while creating the position pda
                    _ if opens_position && *code == 0 => LedgerError::PositionAlreadyExists,
                    // token InsufficientFunds and system ResultWithNegativeLamports
                    _ if *code == 1 => LedgerError::InsufficientFunds,
                    _ => LedgerError::Rejected(err),
                },
                InstructionError::InsufficientFunds => LedgerError::InsufficientFunds,
                InstructionError::InvalidAccountOwner | InstructionError::AccountAlreadyInitialized
                    if opens_position =>
                {
                    LedgerError::PositionAlreadyExists
                }
                _ => LedgerError::Rejected(err),
            }
        }
        _ => LedgerError::Rejected(err),
    }
}

/// Name of the voting-program instruction at `index`, `None` for other programs.
fn program_instruction_name(message: &Message, index: u8, program_id: &Pubkey) -> Option<&'static str> {
    let instruction = message.instructions.get(index as usize)?;
    if instruction.program_id(&message.account_keys) != program_id {
        return None;
    }
    instruction_name(*instruction.data.first()?)
}
