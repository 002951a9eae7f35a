//! Chain parameters derived from settings, including the genesis block.

use basalt_config::{
    ProtocolSettings, DECREMENT_INTERVAL, GENERATION_AMOUNT, GENESIS_NONCE, GENESIS_TIMESTAMP,
    GOVERNING_TOKEN_SUPPLY,
};
use basalt_core::transaction::{AssetType, TransactionData};
use basalt_core::{
    merkle, script, Block, ECPoint, Fixed8, Header, Transaction, TransactionOutput, UInt160,
    UInt256, Witness,
};

use crate::error::{LedgerError, Result};

/// Everything consensus-critical that is fixed once settings are parsed:
/// the standby validator set, the two native assets and the genesis block.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub settings: ProtocolSettings,
    pub standby_validators: Vec<ECPoint>,
    /// Multi-sig address collecting block signatures (Byzantine quorum).
    pub consensus_address: UInt160,
    pub governing_token: Transaction,
    pub utility_token: Transaction,
    pub governing_token_hash: UInt256,
    pub utility_token_hash: UInt256,
    pub genesis: Block,
}

impl ChainParams {
    pub fn new(settings: ProtocolSettings) -> Result<Self> {
        settings.validate()?;
        let standby_validators: Vec<ECPoint> = settings
            .standby_validators
            .iter()
            .map(|key| key.parse::<ECPoint>())
            .collect::<std::result::Result<_, _>>()?;

        let consensus_address = script::consensus_address(&standby_validators)?;
        let committee_address = script::committee_address(&standby_validators)?;
        let asset_owner = standby_validators[0];

        let governing_token = Transaction::new(TransactionData::Register {
            asset_type: AssetType::GoverningToken,
            name: "[{\"lang\":\"en\",\"name\":\"Basalt\"}]".into(),
            amount: Fixed8::from_whole(GOVERNING_TOKEN_SUPPLY)?,
            precision: 0,
            owner: asset_owner,
            admin: basalt_core::hash160(&script::trivial_true_script()),
        });

        let utility_supply: u64 = GENERATION_AMOUNT
            .iter()
            .map(|amount| *amount as u64 * DECREMENT_INTERVAL as u64)
            .sum();
        let utility_token = Transaction::new(TransactionData::Register {
            asset_type: AssetType::UtilityToken,
            name: "[{\"lang\":\"en\",\"name\":\"BasaltGas\"}]".into(),
            amount: Fixed8::from_whole(utility_supply)?,
            precision: 8,
            owner: asset_owner,
            admin: basalt_core::hash160(&[0x00]),
        });

        let governing_token_hash = governing_token.hash();
        let utility_token_hash = utility_token.hash();

        let miner = Transaction::new(TransactionData::Miner {
            nonce: GENESIS_NONCE,
        });

        let mut issue = Transaction::new(TransactionData::Issue);
        issue.outputs.push(TransactionOutput {
            asset_id: governing_token_hash,
            value: Fixed8::from_whole(GOVERNING_TOKEN_SUPPLY)?,
            script_hash: committee_address,
        });
        issue.witnesses.push(Witness::trivial());

        let transactions = vec![miner, governing_token.clone(), utility_token.clone(), issue];
        let merkle_root =
            merkle::merkle_root(&transactions.iter().map(Transaction::hash).collect::<Vec<_>>());
        let genesis = Block {
            header: Header {
                version: 0,
                prev_hash: UInt256::zero(),
                merkle_root,
                timestamp: GENESIS_TIMESTAMP,
                index: 0,
                consensus_data: GENESIS_NONCE as u64,
                next_consensus: consensus_address,
                witness: Witness::trivial(),
            },
            transactions,
        };

        Ok(Self {
            settings,
            standby_validators,
            consensus_address,
            governing_token,
            utility_token,
            governing_token_hash,
            utility_token_hash,
            genesis,
        })
    }

    /// Per-block utility generation at `height`, in whole tokens.
    pub fn generation_at(height: u32) -> u64 {
        let interval = (height / DECREMENT_INTERVAL) as usize;
        GENERATION_AMOUNT
            .get(interval)
            .copied()
            .unwrap_or(0) as u64
    }

    /// Utility earned by `value` governing tokens held over the half-open
    /// height range `[start, end)`.
    pub fn calculate_bonus_for(value: Fixed8, start: u32, end: u32) -> Result<Fixed8> {
        if end <= start || value.is_negative() {
            return Ok(Fixed8::ZERO);
        }
        let mut generated: u64 = 0;
        let mut height = start as u64;
        let end = end as u64;
        while height < end {
            let interval_end = (height / DECREMENT_INTERVAL as u64 + 1) * DECREMENT_INTERVAL as u64;
            let span_end = interval_end.min(end);
            generated += Self::generation_at(height as u32) * (span_end - height);
            height = span_end;
        }
        let bonus = (value.raw() as i128 * generated as i128) / GOVERNING_TOKEN_SUPPLY as i128;
        i64::try_from(bonus)
            .map(Fixed8::from_raw)
            .map_err(|_| LedgerError::Inconsistent("claim bonus overflow".into()))
    }
}
