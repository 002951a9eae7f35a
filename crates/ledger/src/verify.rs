//! Stateful validation of transactions, headers and blocks.
//!
//! Everything here reads the committed view only; no side effects. Failures
//! come back as [`VerifyError`] and the dispatcher maps them onto
//! [`crate::RelayResultReason`] for the sender.

use std::collections::{BTreeSet, HashMap};

use basalt_core::transaction::TransactionData;
use basalt_core::{
    Block, Fixed8, Header, Transaction, TransactionType, UInt160, UInt256,
};
use basalt_storage::SnapshotView;

use crate::genesis::ChainParams;
use crate::mempool::MemPool;

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The payload is malformed or contradicts chain state.
    Invalid(String),
    /// A storage read failed underneath validation.
    Storage(String),
}

impl VerifyError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }
}

impl From<basalt_storage::StorageError> for VerifyError {
    fn from(e: basalt_storage::StorageError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<basalt_core::CoreError> for VerifyError {
    fn from(e: basalt_core::CoreError) -> Self {
        Self::Invalid(e.to_string())
    }
}

type VerifyResult<T = ()> = std::result::Result<T, VerifyError>;

/// Net consumption per asset: inputs minus outputs. Positive means
/// destroyed, negative means minted.
fn transaction_results(
    transaction: &Transaction,
    references: &[(basalt_core::CoinReference, basalt_core::TransactionOutput)],
) -> VerifyResult<HashMap<UInt256, i64>> {
    let mut results: HashMap<UInt256, i64> = HashMap::new();
    for (_, output) in references {
        *results.entry(output.asset_id).or_default() += output.value.raw();
    }
    for output in &transaction.outputs {
        *results.entry(output.asset_id).or_default() -= output.value.raw();
    }
    results.retain(|_, amount| *amount != 0);
    Ok(results)
}

/// Network fee: utility destroyed beyond the system fee.
pub fn network_fee(
    transaction: &Transaction,
    view: &SnapshotView,
    params: &ChainParams,
) -> VerifyResult<Fixed8> {
    let references = view
        .references(transaction)?
        .ok_or_else(|| VerifyError::invalid("unknown inputs"))?;
    let utility_in: i64 = references
        .iter()
        .filter(|(_, output)| output.asset_id == params.utility_token_hash)
        .map(|(_, output)| output.value.raw())
        .sum();
    let utility_out: i64 = transaction
        .outputs
        .iter()
        .filter(|output| output.asset_id == params.utility_token_hash)
        .map(|output| output.value.raw())
        .sum();
    let system_fee = transaction.system_fee(&params.settings.system_fees);
    Ok(Fixed8::from_raw(
        (utility_in - utility_out - system_fee.raw()).max(0),
    ))
}

/// Script hashes that must be witnessed for this transaction.
fn script_hashes_for_verifying(
    transaction: &Transaction,
    view: &SnapshotView,
    references: &[(basalt_core::CoinReference, basalt_core::TransactionOutput)],
) -> VerifyResult<Vec<UInt160>> {
    let mut hashes: BTreeSet<UInt160> = references
        .iter()
        .map(|(_, output)| output.script_hash)
        .collect();
    match &transaction.data {
        TransactionData::Claim { claims } => {
            for claim in claims {
                let output = view
                    .output(claim)?
                    .ok_or_else(|| VerifyError::invalid("unknown claim reference"))?;
                hashes.insert(output.script_hash);
            }
        }
        TransactionData::Issue => {
            for output in &transaction.outputs {
                let asset = view
                    .asset(&output.asset_id)?
                    .ok_or_else(|| VerifyError::invalid("issue of unregistered asset"))?;
                hashes.insert(asset.admin);
            }
        }
        TransactionData::Register { owner, .. } => {
            hashes.insert(owner.to_script_hash());
        }
        TransactionData::Enrollment { pubkey } => {
            hashes.insert(pubkey.to_script_hash());
        }
        TransactionData::State { descriptors } => {
            for descriptor in descriptors {
                match descriptor.kind {
                    basalt_core::StateKind::Account => {
                        hashes.insert(descriptor.account_key()?);
                    }
                    basalt_core::StateKind::Validator => {
                        hashes.insert(descriptor.validator_key()?.to_script_hash());
                    }
                }
            }
        }
        _ => {}
    }
    Ok(hashes.into_iter().collect())
}

fn verify_witnesses(transaction: &Transaction, required: &[UInt160]) -> VerifyResult {
    if transaction.witnesses.len() != required.len() {
        return Err(VerifyError::invalid("witness count mismatch"));
    }
    let message = transaction.unsigned_bytes();
    for (hash, witness) in required.iter().zip(&transaction.witnesses) {
        if witness.script_hash() != *hash {
            return Err(VerifyError::invalid("witness for wrong script hash"));
        }
        match witness.verify(&message) {
            Ok(true) => {}
            Ok(false) => return Err(VerifyError::invalid("signature check failed")),
            Err(e) => return Err(VerifyError::invalid(e.to_string())),
        }
    }
    Ok(())
}

/// Full mempool-admission verification of a transaction.
pub fn verify_transaction(
    transaction: &Transaction,
    view: &SnapshotView,
    mempool: &MemPool,
    params: &ChainParams,
) -> VerifyResult {
    if transaction.transaction_type() == TransactionType::Miner {
        return Err(VerifyError::invalid("miner transactions arrive only in blocks"));
    }
    transaction.check_structure()?;

    let references = view
        .references(transaction)?
        .ok_or_else(|| VerifyError::invalid("unknown inputs"))?;
    if view.is_double_spend(transaction)? {
        return Err(VerifyError::invalid("double spend"));
    }
    if mempool.conflicts_with(transaction) {
        return Err(VerifyError::invalid("conflicts with pooled transaction"));
    }

    for output in &transaction.outputs {
        let asset = view
            .asset(&output.asset_id)?
            .ok_or_else(|| VerifyError::invalid("output of unregistered asset"))?;
        if !output.value.fits_precision(asset.precision) {
            return Err(VerifyError::invalid("output below asset precision"));
        }
    }

    let results = transaction_results(transaction, &references)?;
    let system_fee = transaction.system_fee(&params.settings.system_fees);

    let mut destroyed_utility: i64 = 0;
    for (asset_id, amount) in &results {
        if *amount > 0 {
            if *asset_id != params.utility_token_hash {
                return Err(VerifyError::invalid("destroying a non-utility asset"));
            }
            destroyed_utility += *amount;
        }
    }
    if destroyed_utility < system_fee.raw() {
        return Err(VerifyError::invalid("insufficient system fee"));
    }

    let minted: Vec<(&UInt256, i64)> = results
        .iter()
        .filter(|(_, amount)| **amount < 0)
        .map(|(asset, amount)| (asset, -*amount))
        .collect();
    match transaction.transaction_type() {
        TransactionType::Claim => {
            for (asset_id, _) in &minted {
                if **asset_id != params.utility_token_hash {
                    return Err(VerifyError::invalid("claim mints only utility"));
                }
            }
            verify_claims(transaction, view, params, &minted)?;
        }
        TransactionType::Issue => {
            for (asset_id, amount) in &minted {
                let asset = view
                    .asset(asset_id)?
                    .ok_or_else(|| VerifyError::invalid("issue of unregistered asset"))?;
                if let Some(remaining) = asset.remaining() {
                    if *amount > remaining.raw() {
                        return Err(VerifyError::invalid("issue beyond registered supply"));
                    }
                }
            }
        }
        _ if !minted.is_empty() => {
            return Err(VerifyError::invalid("transaction type cannot mint"));
        }
        _ => {}
    }

    let required = script_hashes_for_verifying(transaction, view, &references)?;
    verify_witnesses(transaction, &required)
}

fn verify_claims(
    transaction: &Transaction,
    view: &SnapshotView,
    params: &ChainParams,
    minted: &[(&UInt256, i64)],
) -> VerifyResult {
    let TransactionData::Claim { claims } = &transaction.data else {
        return Err(VerifyError::invalid("not a claim transaction"));
    };
    let mut bonus = Fixed8::ZERO;
    for claim in claims {
        let spent = view
            .spent_coins(&claim.prev_hash)?
            .ok_or_else(|| VerifyError::invalid("claim of unspent coin"))?;
        let end = spent
            .spent_height(claim.prev_index)
            .ok_or_else(|| VerifyError::invalid("claim of unrecorded output"))?;
        let output = view
            .output(claim)?
            .ok_or_else(|| VerifyError::invalid("unknown claim reference"))?;
        if output.asset_id != params.governing_token_hash {
            return Err(VerifyError::invalid("claim of non-governing output"));
        }
        let earned =
            ChainParams::calculate_bonus_for(output.value, spent.transaction_height, end)
                .map_err(|e| VerifyError::invalid(e.to_string()))?;
        bonus = bonus
            .checked_add(earned)
            .map_err(|_| VerifyError::invalid("claim bonus overflow"))?;
    }
    let claimed: i64 = minted
        .iter()
        .filter(|(asset, _)| **asset == params.utility_token_hash)
        .map(|(_, amount)| *amount)
        .sum();
    if claimed > bonus.raw() {
        return Err(VerifyError::invalid("claim exceeds earned bonus"));
    }
    Ok(())
}

/// Header validation at `prev.index + 1`.
pub fn verify_header(header: &Header, prev: &Header) -> VerifyResult {
    if header.index != prev.index + 1 {
        return Err(VerifyError::invalid("non-consecutive header index"));
    }
    if header.prev_hash != prev.hash() {
        return Err(VerifyError::invalid("previous hash mismatch"));
    }
    if header.timestamp <= prev.timestamp {
        return Err(VerifyError::invalid("timestamp not increasing"));
    }
    if header.witness.script_hash() != prev.next_consensus {
        return Err(VerifyError::invalid("witness not from consensus address"));
    }
    match header.witness.verify(&header.unsigned_bytes()) {
        Ok(true) => Ok(()),
        Ok(false) => Err(VerifyError::invalid("consensus signature check failed")),
        Err(e) => Err(VerifyError::invalid(e.to_string())),
    }
}

/// Block validation against its predecessor header.
pub fn verify_block(block: &Block, prev: &Header) -> VerifyResult {
    block.check_structure()?;
    verify_header(&block.header, prev)
}
