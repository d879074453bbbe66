use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey,
    pubkey::Pubkey,
};
use thiserror::Error;

use crate::utils::DEFAULT_TOKEN_DECIMALS;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_TOKEN_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("poll interval must be at least one second")]
    ZeroPollInterval,
}

/// Everything the client needs to know about its cluster and program.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,
    pub rpc_url: String,
    pub commitment: CommitmentLevel,
    pub token_decimals: u8,
    #[serde(with = "pubkey_string")]
    pub default_token_mint: Pubkey,
    pub poll_interval_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: crate::ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentLevel::Confirmed,
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            default_token_mint: DEFAULT_TOKEN_MINT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        if config.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Pubkeys as base58 strings in config files and serialized outputs.
pub mod pubkey_string {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bs58::encode(pubkey.as_ref()).into_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = bs58::decode(&text)
            .into_vec()
            .map_err(|e| de::Error::custom(format!("invalid base58 pubkey '{text}': {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| de::Error::custom(format!("pubkey '{text}' is {} bytes, expected 32", b.len())))?;
        Ok(Pubkey::new_from_array(bytes))
    }
}
