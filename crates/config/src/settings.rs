//! Node protocol settings.
//!
//! Settings deserialize from JSON (`protocol.json` in the node distribution)
//! and fall back to the built-in MainNet profile. Validator keys are kept as
//! hex strings here so the config crate stays free of crypto dependencies;
//! the ledger parses them at startup.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Which chain this node participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    MainNet,
    TestNet,
    Private,
}

impl NetworkType {
    /// Network magic used in the p2p handshake and payload signing.
    pub fn magic(&self) -> u32 {
        match self {
            NetworkType::MainNet => 0x4c41_5342,
            NetworkType::TestNet => 0x5442_5342,
            NetworkType::Private => 0x0000_0000,
        }
    }
}

/// Per-transaction-type system fees, in whole utility tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFees {
    #[serde(default = "default_register_fee")]
    pub register: u64,
    #[serde(default = "default_enrollment_fee")]
    pub enrollment: u64,
    #[serde(default = "default_issue_fee")]
    pub issue: u64,
    #[serde(default = "default_publish_fee")]
    pub publish: u64,
}

fn default_register_fee() -> u64 {
    10_000
}

fn default_enrollment_fee() -> u64 {
    1_000
}

fn default_issue_fee() -> u64 {
    500
}

fn default_publish_fee() -> u64 {
    500
}

impl Default for SystemFees {
    fn default() -> Self {
        Self {
            register: default_register_fee(),
            enrollment: default_enrollment_fee(),
            issue: default_issue_fee(),
            publish: default_publish_fee(),
        }
    }
}

/// Protocol-level settings shared by every component of the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSettings {
    /// Network selector; decides the magic number.
    pub network: NetworkType,

    /// Target block interval in seconds.
    #[serde(default = "default_seconds_per_block")]
    pub seconds_per_block: u32,

    /// Standby validator public keys, hex-encoded compressed secp256r1
    /// points, in committee order.
    pub standby_validators: Vec<String>,

    /// System fees charged per transaction type.
    #[serde(default)]
    pub system_fees: SystemFees,

    /// Upper bound on mempool size.
    #[serde(default = "default_mempool_capacity")]
    pub mempool_capacity: usize,
}

fn default_seconds_per_block() -> u32 {
    crate::DEFAULT_SECONDS_PER_BLOCK
}

fn default_mempool_capacity() -> usize {
    crate::MEMPOOL_CAPACITY
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ProtocolSettings {
    /// The built-in MainNet profile.
    pub fn mainnet() -> Self {
        Self {
            network: NetworkType::MainNet,
            seconds_per_block: default_seconds_per_block(),
            standby_validators: vec![
                "03b209fd4f53a7170ea4444e0cb0a6bb6a53c2bd016926989cf85f9b0fba17a70c".into(),
                "02df48f60e8f3e01c48ff40b9b7f1310d7a8b2a193188befe1c2e3df740e895093".into(),
                "03b8d9d5771d8f513aa0869b9cc8d50986403b78c6da36890638c3d46a5adce04a".into(),
                "02ca0e27697b9c248f6f16e085fd0061e26f44da85b58ee835c110caa5ec3ba554".into(),
                "024c7b7fb6c310fccf1ba33b082519d82964ea93868d676662d4a59ad548df0e7d".into(),
                "02aaec38470f6aad0042c6e877cfd8087d2676b0f516fddd362801b9bd3936399e".into(),
                "02486fd15702c4490a26703112a5cc1d0923fd697a33406bd5a1c00e0013b09a70".into(),
            ],
            system_fees: SystemFees::default(),
            mempool_capacity: default_mempool_capacity(),
        }
    }

    /// Loads settings from a JSON file and validates them.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The network magic number.
    pub fn magic(&self) -> u32 {
        self.network.magic()
    }

    /// Checks internal consistency without touching crypto.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.standby_validators.is_empty() {
            return Err(SettingsError::Invalid(
                "standby_validators must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for key in &self.standby_validators {
            let bytes = hex::decode(key)
                .map_err(|e| SettingsError::Invalid(format!("validator key {key}: {e}")))?;
            if bytes.len() != 33 || !matches!(bytes[0], 0x02 | 0x03) {
                return Err(SettingsError::Invalid(format!(
                    "validator key {key} is not a compressed point"
                )));
            }
            if !seen.insert(bytes) {
                return Err(SettingsError::Invalid(format!(
                    "duplicate validator key {key}"
                )));
            }
        }
        if self.seconds_per_block == 0 {
            return Err(SettingsError::Invalid("seconds_per_block must be > 0".into()));
        }
        if self.mempool_capacity == 0 {
            return Err(SettingsError::Invalid("mempool_capacity must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_profile_is_valid() {
        let settings = ProtocolSettings::mainnet();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.standby_validators.len(), 7);
        assert_eq!(settings.seconds_per_block, 15);
    }

    #[test]
    fn network_magic_values() {
        assert_eq!(NetworkType::Private.magic(), 0);
        assert_ne!(NetworkType::MainNet.magic(), NetworkType::TestNet.magic());
    }

    #[test]
    fn rejects_empty_validator_set() {
        let mut settings = ProtocolSettings::mainnet();
        settings.standby_validators.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_malformed_validator_key() {
        let mut settings = ProtocolSettings::mainnet();
        settings.standby_validators[0] = "deadbeef".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn parses_json_with_defaults() {
        let raw = r#"{
            "network": "private",
            "standby_validators": [
                "03b209fd4f53a7170ea4444e0cb0a6bb6a53c2bd016926989cf85f9b0fba17a70c"
            ]
        }"#;
        let settings: ProtocolSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.network, NetworkType::Private);
        assert_eq!(settings.seconds_per_block, crate::DEFAULT_SECONDS_PER_BLOCK);
        assert_eq!(settings.mempool_capacity, crate::MEMPOOL_CAPACITY);
        assert_eq!(settings.system_fees.register, 10_000);
    }
}
