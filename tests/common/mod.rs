#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use degenvote::{
    error::{TransportError, WalletError},
    instructions::{InitializePlatformData, InitializePositionData, InitializeVoteData, UpdatePlatformData, UpdatePositionData},
    pda,
    state::{Mint, Platform, Position, Side, TokenAccount, Vote},
    transport::{AccountData, LatestBlockhash, RpcTransport},
    utils::calculate_fees,
    wallet::WalletSigner,
};
use solana_sdk::{
    hash::Hash,
    instruction::InstructionError,
    message::MessageHeader,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{Transaction, TransactionError},
};

pub const BLOCKHASH_WINDOW: u64 = 150;

struct LedgerState {
    accounts: HashMap<Pubkey, AccountData>,
    block_height: u64,
    blockhash: Hash,
    stale_blockhashes: bool,
    lapse_on_send: bool,
    sent: Vec<Transaction>,
    account_fetches: usize,
}

/// In-memory ledger that runs the voting program's account mutations for the
/// instructions it receives. Instructions in one transaction apply atomically.
pub struct SimulatedLedger {
    program_id: Pubkey,
    state: Mutex<LedgerState>,
}

impl SimulatedLedger {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            state: Mutex::new(LedgerState {
                accounts: HashMap::new(),
                block_height: 1_000,
                blockhash: Hash::new_unique(),
                stale_blockhashes: false,
                lapse_on_send: false,
                sent: Vec::new(),
                account_fetches: 0,
            }),
        }
    }

    /// Ledger with the platform config already created.
    pub fn with_platform(program_id: Pubkey, authority: &Pubkey, fee_bps: u16) -> Self {
        let ledger = Self::new(program_id);
        let addresses = pda::PlatformAddresses::resolve(&program_id).unwrap();
        let platform = Platform {
            authority: authority.to_bytes(),
            fee: fee_bps.to_le_bytes(),
            platform_bump: addresses.platform_bump,
            vault_bump: addresses.vault_bump,
        };
        ledger.set_account(addresses.platform, program_id, bytemuck::bytes_of(&platform).to_vec());
        ledger
    }

    /// Every blockhash handed out from now on is already past its last
    /// valid block height.
    pub fn expire_blockhashes(&self) {
        self.state.lock().unwrap().stale_blockhashes = true;
    }

    /// The next send outlives its blockhash: the block height moves past the
    /// window and confirmation fails without a transaction error.
    pub fn lapse_during_confirmation(&self) {
        self.state.lock().unwrap().lapse_on_send = true;
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn account_fetches(&self) -> usize {
        self.state.lock().unwrap().account_fetches
    }

    pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.state.lock().unwrap().accounts.insert(
            address,
            AccountData {
                owner,
                lamports: 1_000_000,
                data,
            },
        );
    }

    pub fn remove_account(&self, address: &Pubkey) {
        self.state.lock().unwrap().accounts.remove(address);
    }

    pub fn account(&self, address: &Pubkey) -> Option<AccountData> {
        self.state.lock().unwrap().accounts.get(address).cloned()
    }

    pub fn create_mint(&self, mint: Pubkey, decimals: u8) {
        let mut data = vec![0u8; Mint::LEN];
        data[44] = decimals;
        data[45] = 1;
        self.set_account(mint, spl_token::ID, data);
    }

    /// Creates (or overwrites) `owner`'s associated token account.
    pub fn fund_token_account(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Pubkey {
        let address = pda::find_associated_token_address(owner, mint).unwrap();
        let mut account: TokenAccount = bytemuck::Zeroable::zeroed();
        account.mint = mint.to_bytes();
        account.owner = owner.to_bytes();
        account.amount = amount.to_le_bytes();
        account.state = 1;
        self.set_account(address, spl_token::ID, bytemuck::bytes_of(&account).to_vec());
        address
    }

    /// Creates the platform vault's token account for `mint`, where fees land.
    pub fn open_vault_token_account(&self, mint: &Pubkey) -> Pubkey {
        let vault = pda::PlatformAddresses::resolve(&self.program_id).unwrap().vault;
        self.fund_token_account(&vault, mint, 0)
    }

    pub fn token_amount(&self, address: &Pubkey) -> u64 {
        let account = self.account(address).expect("token account");
        bytemuck::from_bytes::<TokenAccount>(&account.data[..TokenAccount::LEN]).amount()
    }

    pub fn insert_vote(&self, vote: Pubkey, token: Pubkey, yes: u64, no: u64, end_timestamp: i64) {
        let (_, vault_bump) = pda::find_vote_vault_address(&vote, &self.program_id).unwrap();
        let state = Vote {
            token: token.to_bytes(),
            true_votes: yes.to_le_bytes(),
            false_votes: no.to_le_bytes(),
            end_timestamp: end_timestamp.to_le_bytes(),
            vault_bump,
        };
        self.set_account(vote, self.program_id, bytemuck::bytes_of(&state).to_vec());
    }

    pub fn vote(&self, vote: &Pubkey) -> Vote {
        *bytemuck::from_bytes::<Vote>(&self.account(vote).expect("vote account").data)
    }

    fn process(
        &self,
        accounts: &mut HashMap<Pubkey, AccountData>,
        keys: &[Pubkey],
        writable: &[bool],
        metas: &[u8],
        data: &[u8],
    ) -> Result<(), InstructionError> {
        let key = |index: usize| {
            metas
                .get(index)
                .and_then(|&k| keys.get(k as usize))
                .copied()
                .ok_or(InstructionError::NotEnoughAccountKeys)
        };
        let is_writable = |index: usize| {
            metas
                .get(index)
                .and_then(|&k| writable.get(k as usize))
                .copied()
                .unwrap_or(false)
        };
        // voter and fee vault token accounts are validated before the position
        let token_accounts = |accounts: &HashMap<Pubkey, AccountData>| -> Result<(), InstructionError> {
            for index in [7, 8] {
                match accounts.get(&key(index)?) {
                    Some(account) if account.owner == spl_token::ID => {}
                    _ => return Err(InstructionError::InvalidAccountOwner),
                }
            }
            Ok(())
        };
        let now = Utc::now().timestamp();

        match data.first().copied() {
            Some(0) => {
                let payload = InitializePlatformData::unpack(data).ok_or(InstructionError::InvalidInstructionData)?;
                let platform = key(1)?;
                if accounts.contains_key(&platform) {
                    return Err(InstructionError::AccountAlreadyInitialized);
                }
                let state = Platform {
                    authority: key(0)?.to_bytes(),
                    fee: payload.fee,
                    platform_bump: payload.platform_bump,
                    vault_bump: payload.vault_bump,
                };
                accounts.insert(platform, self.program_account(bytemuck::bytes_of(&state)));
            }
            Some(1) => {
                let payload = UpdatePlatformData::unpack(data).ok_or(InstructionError::InvalidInstructionData)?;
                let (authority, new_authority) = (key(0)?, key(1)?);
                let account = accounts.get_mut(&key(2)?).ok_or(InstructionError::UninitializedAccount)?;
                let platform = bytemuck::from_bytes_mut::<Platform>(&mut account.data);
                if platform.authority != authority.to_bytes() {
                    return Err(InstructionError::IncorrectAuthority);
                }
                platform.authority = new_authority.to_bytes();
                platform.fee = payload.new_fee;
            }
            Some(2) => {
                let payload = InitializeVoteData::unpack(data).ok_or(InstructionError::InvalidInstructionData)?;
                let vote = key(3)?;
                if accounts.contains_key(&vote) {
                    return Err(InstructionError::AccountAlreadyInitialized);
                }
                let (_, vault_bump) = pda::find_vote_vault_address(&vote, &self.program_id).unwrap();
                let state = Vote {
                    token: key(4)?.to_bytes(),
                    true_votes: [0; 8],
                    false_votes: [0; 8],
                    end_timestamp: (now + i64::from_le_bytes(payload.time_to_add)).to_le_bytes(),
                    vault_bump,
                };
                accounts.insert(vote, self.program_account(bytemuck::bytes_of(&state)));
            }
            Some(3) => {
                let payload = InitializePositionData::unpack(data).ok_or(InstructionError::InvalidInstructionData)?;
                token_accounts(&*accounts)?;
                let position = key(9)?;
                if accounts.contains_key(&position) {
                    return Err(InstructionError::InvalidAccountOwner);
                }
                let amount = u64::from_le_bytes(payload.amount);
                let side = Side::from_byte(payload.side);
                self.stake(accounts, &key(1)?, &key(3)?, &key(7)?, &key(8)?, amount, side, now)?;

                let (_, bump) = pda::find_position_address(&key(3)?, &key(0)?, &self.program_id).unwrap();
                let state = Position {
                    amount: payload.amount,
                    side: payload.side,
                    bump,
                };
                accounts.insert(position, self.program_account(bytemuck::bytes_of(&state)));
            }
            Some(4) => {
                let payload = UpdatePositionData::unpack(data).ok_or(InstructionError::InvalidInstructionData)?;
                token_accounts(&*accounts)?;
                let position = key(9)?;
                let existing = *bytemuck::from_bytes::<Position>(
                    &accounts.get(&position).ok_or(InstructionError::UninitializedAccount)?.data,
                );
                let amount = u64::from_le_bytes(payload.amount);
                self.stake(accounts, &key(1)?, &key(3)?, &key(7)?, &key(8)?, amount, existing.side(), now)?;

                let account = accounts.get_mut(&position).ok_or(InstructionError::UninitializedAccount)?;
                let state = bytemuck::from_bytes_mut::<Position>(&mut account.data);
                state.amount = (existing.amount() + amount).to_le_bytes();
            }
            Some(5) => {
                token_accounts(&*accounts)?;
                let vote = *bytemuck::from_bytes::<Vote>(
                    &accounts.get(&key(3)?).ok_or(InstructionError::UninitializedAccount)?.data,
                );
                if vote.end_timestamp() > now {
                    return Err(InstructionError::Custom(6008));
                }
                if vote.yes_votes() == vote.no_votes() {
                    return Err(InstructionError::Custom(6009));
                }
                let winner = Side::from(vote.yes_votes() > vote.no_votes());
                let position = key(9)?;
                let state = *bytemuck::from_bytes::<Position>(
                    &accounts.get(&position).ok_or(InstructionError::UninitializedAccount)?.data,
                );
                if state.side() != winner {
                    return Err(InstructionError::Custom(6010));
                }
                let (winning, losing) = match winner {
                    Side::Yes => (vote.yes_votes(), vote.no_votes()),
                    Side::No => (vote.no_votes(), vote.yes_votes()),
                };
                let reward = state.amount() + state.amount() * losing / winning;
                let fee = calculate_fees(reward, self.fee_bps(accounts)?);
                self.credit(accounts, &key(7)?, reward - fee)?;

                // closing the position moves its rent to the vault
                if !is_writable(2) {
                    return Err(InstructionError::ReadonlyLamportChange);
                }
                let rent = accounts.remove(&position).map(|account| account.lamports).unwrap_or(0);
                let vault = accounts.entry(key(2)?).or_insert_with(|| AccountData {
                    owner: self.program_id,
                    lamports: 0,
                    data: Vec::new(),
                });
                vault.lamports += rent;
            }
            _ => return Err(InstructionError::Custom(6001)),
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn stake(
        &self,
        accounts: &mut HashMap<Pubkey, AccountData>,
        platform: &Pubkey,
        vote: &Pubkey,
        voter_token_account: &Pubkey,
        vault_token_account: &Pubkey,
        amount: u64,
        side: Side,
        now: i64,
    ) -> Result<(), InstructionError> {
        if !accounts.contains_key(platform) {
            return Err(InstructionError::Custom(6002));
        }
        let fee = calculate_fees(amount, self.fee_bps(accounts)?);

        let vote_account = accounts.get_mut(vote).ok_or(InstructionError::UninitializedAccount)?;
        let state = bytemuck::from_bytes_mut::<Vote>(&mut vote_account.data);
        if state.end_timestamp() <= now {
            return Err(InstructionError::Custom(6007));
        }
        match side {
            Side::Yes => state.true_votes = (state.yes_votes() + amount).to_le_bytes(),
            Side::No => state.false_votes = (state.no_votes() + amount).to_le_bytes(),
        }

        let token_account = accounts
            .get_mut(voter_token_account)
            .ok_or(InstructionError::InvalidAccountOwner)?;
        let token = bytemuck::from_bytes_mut::<TokenAccount>(&mut token_account.data[..TokenAccount::LEN]);
        let balance = token.amount();
        if balance < amount + fee {
            // token program InsufficientFunds
            return Err(InstructionError::Custom(1));
        }
        token.amount = (balance - amount - fee).to_le_bytes();
        self.credit(accounts, vault_token_account, fee)
    }

    fn credit(
        &self,
        accounts: &mut HashMap<Pubkey, AccountData>,
        token_account: &Pubkey,
        amount: u64,
    ) -> Result<(), InstructionError> {
        let account = accounts.get_mut(token_account).ok_or(InstructionError::InvalidAccountOwner)?;
        let token = bytemuck::from_bytes_mut::<TokenAccount>(&mut account.data[..TokenAccount::LEN]);
        token.amount = (token.amount() + amount).to_le_bytes();
        Ok(())
    }

    fn fee_bps(&self, accounts: &HashMap<Pubkey, AccountData>) -> Result<u16, InstructionError> {
        let (platform, _) = pda::find_platform_address(&self.program_id).unwrap();
        let account = accounts.get(&platform).ok_or(InstructionError::Custom(6002))?;
        Ok(bytemuck::from_bytes::<Platform>(&account.data).fee_bps())
    }

    fn program_account(&self, data: &[u8]) -> AccountData {
        AccountData {
            owner: self.program_id,
            lamports: 1_000_000,
            data: data.to_vec(),
        }
    }
}

#[async_trait]
impl RpcTransport for SimulatedLedger {
    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, TransportError> {
        let state = self.state.lock().unwrap();
        let last_valid_block_height = if state.stale_blockhashes {
            state.block_height - 1
        } else {
            state.block_height + BLOCKHASH_WINDOW
        };
        Ok(LatestBlockhash {
            blockhash: state.blockhash,
            last_valid_block_height,
        })
    }

    async fn get_block_height(&self) -> Result<u64, TransportError> {
        Ok(self.state.lock().unwrap().block_height)
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountData>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.account_fetches += 1;
        Ok(state.accounts.get(address).cloned())
    }

    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(transaction.clone());

        if state.lapse_on_send {
            state.lapse_on_send = false;
            state.block_height += BLOCKHASH_WINDOW + 1;
            return Err(TransportError::Rpc("unable to confirm transaction".to_string()));
        }
        if transaction.message.recent_blockhash != state.blockhash {
            return Err(TransportError::Transaction(TransactionError::BlockhashNotFound));
        }
        transaction.verify().map_err(TransportError::Transaction)?;

        let message = &transaction.message;
        let writable: Vec<bool> = (0..message.account_keys.len())
            .map(|index| is_writable_index(&message.header, message.account_keys.len(), index))
            .collect();
        let mut accounts = state.accounts.clone();
        for (index, ix) in message.instructions.iter().enumerate() {
            if *ix.program_id(&message.account_keys) != self.program_id {
                continue;
            }
            self.process(&mut accounts, &message.account_keys, &writable, &ix.accounts, &ix.data)
                .map_err(|err| TransportError::Transaction(TransactionError::InstructionError(index as u8, err)))?;
        }

        state.accounts = accounts;
        state.block_height += 1;
        Ok(transaction.signatures[0])
    }
}

/// Writability of account key `index` as encoded by the message header.
fn is_writable_index(header: &MessageHeader, keys: usize, index: usize) -> bool {
    let signers = header.num_required_signatures as usize;
    if index < signers {
        index < signers - header.num_readonly_signed_accounts as usize
    } else {
        index < keys - header.num_readonly_unsigned_accounts as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletMode {
    Connected,
    Disconnected,
    Rejecting,
}

/// Wallet double that can be disconnected or refuse to sign, and records how
/// many signing prompts overlap.
pub struct MockWallet {
    keypair: Keypair,
    mode: WalletMode,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: AtomicUsize,
}

impl MockWallet {
    pub fn new(mode: WalletMode) -> Self {
        Self {
            keypair: Keypair::new(),
            mode,
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn connected() -> Self {
        Self::new(WalletMode::Connected)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockWallet {
    fn pubkey(&self) -> Option<Pubkey> {
        match self.mode {
            WalletMode::Disconnected => None,
            _ => Some(self.keypair.pubkey()),
        }
    }

    async fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = match self.mode {
            WalletMode::Connected => {
                let blockhash = transaction.message.recent_blockhash;
                transaction
                    .try_partial_sign(&[&self.keypair], blockhash)
                    .map_err(WalletError::from)
            }
            WalletMode::Rejecting => Err(WalletError::Rejected),
            WalletMode::Disconnected => Err(WalletError::NotConnected),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
