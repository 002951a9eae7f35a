//! The deterministic block→state-delta function.
//!
//! `apply_block` folds one block into a snapshot: block and transaction
//! records, coin flags, balances, vote accounting, asset issuance, claims,
//! enrollments, contract publishing and script execution. The caller owns
//! the snapshot lifecycle (commit, view swap, notifications).
//!
//! Any inconsistency found here means the store or the validation layer is
//! broken; errors are fatal to the dispatcher.

use std::collections::BTreeMap;

use basalt_config::DECREMENT_INTERVAL;
use basalt_core::state::{
    AccountState, AssetState, BlockState, CoinState, ContractState, HashIndexState,
    SpentCoinState, TransactionState, UnspentCoinState, ValidatorState,
};
use basalt_core::transaction::TransactionData;
use basalt_core::{
    hash160, Block, CoinReference, ECPoint, Fixed8, Transaction, TransactionOutput, UInt256,
};
use basalt_storage::Snapshot;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::genesis::ChainParams;
use crate::vm::{ApplicationExecuted, ExecutionRequest, ScriptExecutor, VmState};

fn inconsistent(reason: impl Into<String>) -> LedgerError {
    LedgerError::Inconsistent(reason.into())
}

/// Applies `block` to `snapshot`. Returns the execution results of its
/// invocation transactions, in block order.
pub fn apply_block(
    snapshot: &mut Snapshot,
    block: &Block,
    params: &ChainParams,
    executor: &dyn ScriptExecutor,
) -> Result<Vec<ApplicationExecuted>> {
    snapshot.persisting_block = Some(block.clone());
    let fees = &params.settings.system_fees;

    let prev_fee_total = if block.index() == 0 {
        Fixed8::ZERO
    } else {
        snapshot
            .blocks
            .try_get(&block.header.prev_hash)?
            .ok_or_else(|| inconsistent("previous block record missing"))?
            .system_fee_amount
    };
    let block_fees: i64 = block
        .transactions
        .iter()
        .map(|tx| tx.system_fee(fees).raw())
        .sum();
    let cumulative = prev_fee_total.checked_add(Fixed8::from_raw(block_fees))?;

    // A header-only record may already exist for this hash; overwrite it
    // with the full trimmed block.
    let record = snapshot.blocks.get_or_create(&block.hash(), || BlockState {
        system_fee_amount: Fixed8::ZERO,
        trimmed: block.trim(),
    })?;
    record.system_fee_amount = cumulative;
    record.trimmed = block.trim();

    let mut executions = Vec::new();
    for transaction in &block.transactions {
        apply_transaction(snapshot, block, transaction, params, executor, &mut executions)?;
    }

    *snapshot.block_hash_index.get_and_change()? =
        HashIndexState::new(block.hash(), block.index());

    debug!(index = block.index(), txs = block.transactions.len(), "block applied");
    Ok(executions)
}

fn apply_transaction(
    snapshot: &mut Snapshot,
    block: &Block,
    transaction: &Transaction,
    params: &ChainParams,
    executor: &dyn ScriptExecutor,
    executions: &mut Vec<ApplicationExecuted>,
) -> Result<()> {
    let tx_hash = transaction.hash();
    snapshot.transactions.add(
        tx_hash,
        TransactionState {
            block_index: block.index(),
            transaction: transaction.clone(),
        },
    )?;
    snapshot.unspent_coins.add(
        tx_hash,
        UnspentCoinState::confirmed(transaction.outputs.len()),
    )?;

    for output in &transaction.outputs {
        credit_output(snapshot, output, params)?;
    }
    debit_inputs(snapshot, block, transaction, params)?;

    match &transaction.data {
        TransactionData::Miner { .. } | TransactionData::Contract => {}
        TransactionData::Issue => apply_issue(snapshot, transaction)?,
        TransactionData::Register {
            asset_type,
            name,
            amount,
            precision,
            owner,
            admin,
        } => {
            snapshot.assets.add(
                tx_hash,
                AssetState {
                    asset_id: tx_hash,
                    asset_type: *asset_type,
                    name: name.clone(),
                    amount: *amount,
                    available: Fixed8::ZERO,
                    precision: *precision,
                    owner: *owner,
                    admin: *admin,
                    expiration: block.index() + 2 * DECREMENT_INTERVAL,
                    is_frozen: false,
                },
            )?;
        }
        TransactionData::Claim { claims } => apply_claims(snapshot, claims)?,
        TransactionData::Enrollment { pubkey } => {
            snapshot
                .validators
                .get_or_create(pubkey, || ValidatorState::new(*pubkey))?
                .registered = true;
        }
        TransactionData::State { descriptors } => {
            for descriptor in descriptors {
                match descriptor.kind {
                    basalt_core::StateKind::Account => {
                        apply_vote_reassignment(snapshot, descriptor, params)?;
                    }
                    basalt_core::StateKind::Validator => {
                        apply_validator_toggle(snapshot, descriptor)?;
                    }
                }
            }
        }
        TransactionData::Publish {
            script,
            parameter_list,
            return_type,
            properties,
            name,
            code_version,
            author,
            email,
            description,
        } => {
            let script_hash = hash160(script);
            snapshot.contracts.get_or_create(&script_hash, || ContractState {
                script: script.clone(),
                parameter_list: parameter_list.clone(),
                return_type: *return_type,
                properties: *properties,
                name: name.clone(),
                code_version: code_version.clone(),
                author: author.clone(),
                email: email.clone(),
                description: description.clone(),
            })?;
        }
        TransactionData::Invocation { script, gas } => {
            let mut sandbox = snapshot.clone_cache();
            let outcome = executor.execute(
                ExecutionRequest {
                    script,
                    gas: *gas,
                    container: tx_hash,
                },
                &mut sandbox,
            );
            if outcome.state == VmState::Halt {
                snapshot.merge_from(sandbox)?;
            }
            executions.push(ApplicationExecuted { tx_hash, outcome });
        }
    }
    Ok(())
}

/// Credits one output to its account, propagating governing-token stake to
/// voted validators and the count histogram.
fn credit_output(
    snapshot: &mut Snapshot,
    output: &TransactionOutput,
    params: &ChainParams,
) -> Result<()> {
    let votes = {
        let account = snapshot
            .accounts
            .get_or_create(&output.script_hash, || AccountState::new(output.script_hash))?;
        account.adjust_balance(output.asset_id, output.value)?;
        account.votes.clone()
    };
    if output.asset_id == params.governing_token_hash && !votes.is_empty() {
        shift_validator_stake(snapshot, &votes, output.value)?;
        snapshot
            .validators_count
            .get_and_change()?
            .adjust(votes.len(), output.value)?;
    }
    Ok(())
}

/// Marks inputs spent, debits the previous owners and maintains spent-coin
/// records plus vote accounting for governing-token inputs.
fn debit_inputs(
    snapshot: &mut Snapshot,
    block: &Block,
    transaction: &Transaction,
    params: &ChainParams,
) -> Result<()> {
    let mut groups: BTreeMap<UInt256, Vec<CoinReference>> = BTreeMap::new();
    for input in &transaction.inputs {
        groups.entry(input.prev_hash).or_default().push(*input);
    }
    for (prev_hash, inputs) in groups {
        let prev_state = snapshot
            .transactions
            .try_get(&prev_hash)?
            .ok_or_else(|| inconsistent(format!("spending unknown transaction {prev_hash}")))?;
        {
            let coins = snapshot.unspent_coins.get_and_change(&prev_hash)?;
            for input in &inputs {
                let flag = coins
                    .items
                    .get_mut(input.prev_index as usize)
                    .ok_or_else(|| inconsistent("input index out of range"))?;
                *flag |= CoinState::SPENT;
            }
        }
        for input in &inputs {
            let output = prev_state
                .transaction
                .outputs
                .get(input.prev_index as usize)
                .ok_or_else(|| inconsistent("input index out of range"))?;

            let votes = {
                let account = snapshot
                    .accounts
                    .get_or_create(&output.script_hash, || AccountState::new(output.script_hash))?;
                account.adjust_balance(output.asset_id, -output.value)?;
                account.votes.clone()
            };
            if output.asset_id == params.governing_token_hash {
                snapshot
                    .spent_coins
                    .get_or_create(&prev_hash, || {
                        SpentCoinState::new(prev_hash, prev_state.block_index)
                    })?
                    .record_spend(input.prev_index, block.index());
                if !votes.is_empty() {
                    shift_validator_stake(snapshot, &votes, -output.value)?;
                    snapshot
                        .validators_count
                        .get_and_change()?
                        .adjust(votes.len(), -output.value)?;
                }
            }
        }
    }
    Ok(())
}

/// Adds `delta` stake to each voted validator, deleting entries that end up
/// unregistered with zero votes.
fn shift_validator_stake(
    snapshot: &mut Snapshot,
    votes: &[ECPoint],
    delta: Fixed8,
) -> Result<()> {
    for pubkey in votes {
        let obsolete = {
            let validator = snapshot
                .validators
                .get_or_create(pubkey, || ValidatorState::new(*pubkey))?;
            validator.votes = validator.votes.checked_add(delta)?;
            validator.is_obsolete()
        };
        if obsolete {
            snapshot.validators.delete(pubkey)?;
        }
    }
    Ok(())
}

/// Mints the net issued amount of each asset in an issue transaction.
fn apply_issue(snapshot: &mut Snapshot, transaction: &Transaction) -> Result<()> {
    let mut results: BTreeMap<UInt256, i64> = BTreeMap::new();
    for input in &transaction.inputs {
        let output = snapshot
            .try_get_output(input)?
            .ok_or_else(|| inconsistent("issue input unknown"))?;
        *results.entry(output.asset_id).or_default() += output.value.raw();
    }
    for output in &transaction.outputs {
        *results.entry(output.asset_id).or_default() -= output.value.raw();
    }
    for (asset_id, amount) in results {
        if amount < 0 {
            let asset = snapshot.assets.get_and_change(&asset_id)?;
            asset.available = asset.available.checked_add(Fixed8::from_raw(-amount))?;
        }
    }
    Ok(())
}

/// Removes claimed spent-coin records and marks the coins claimed.
fn apply_claims(snapshot: &mut Snapshot, claims: &[CoinReference]) -> Result<()> {
    for claim in claims {
        let now_empty = {
            let spent = snapshot.spent_coins.get_and_change(&claim.prev_hash)?;
            spent
                .remove(claim.prev_index)
                .ok_or_else(|| inconsistent("claim of unrecorded spent coin"))?;
            spent.is_empty()
        };
        if now_empty {
            snapshot.spent_coins.delete(&claim.prev_hash)?;
        }
        let coins = snapshot.unspent_coins.get_and_change(&claim.prev_hash)?;
        let flag = coins
            .items
            .get_mut(claim.prev_index as usize)
            .ok_or_else(|| inconsistent("claim index out of range"))?;
        *flag |= CoinState::CLAIMED;
    }
    Ok(())
}

/// Vote reassignment for an `Account`/`Votes` descriptor.
fn apply_vote_reassignment(
    snapshot: &mut Snapshot,
    descriptor: &basalt_core::StateDescriptor,
    params: &ChainParams,
) -> Result<()> {
    let account_hash = descriptor.account_key()?;
    let new_votes = descriptor.parse_votes()?;
    let (balance, old_votes) = {
        let account = snapshot
            .accounts
            .get_or_create(&account_hash, || AccountState::new(account_hash))?;
        (account.balance(&params.governing_token_hash), account.votes.clone())
    };

    shift_validator_stake(snapshot, &old_votes, -balance)?;
    if new_votes.len() != old_votes.len() {
        let counts = snapshot.validators_count.get_and_change()?;
        if !old_votes.is_empty() {
            counts.adjust(old_votes.len(), -balance)?;
        }
        if !new_votes.is_empty() {
            counts.adjust(new_votes.len(), balance)?;
        }
    }
    snapshot.accounts.get_and_change(&account_hash)?.votes = new_votes.clone();
    shift_validator_stake(snapshot, &new_votes, balance)?;
    Ok(())
}

/// Registration toggle for a `Validator`/`Registered` descriptor.
fn apply_validator_toggle(
    snapshot: &mut Snapshot,
    descriptor: &basalt_core::StateDescriptor,
) -> Result<()> {
    let pubkey = descriptor.validator_key()?;
    let registered = descriptor.registered_flag()?;
    let obsolete = {
        let validator = snapshot
            .validators
            .get_or_create(&pubkey, || ValidatorState::new(pubkey))?;
        validator.registered = registered;
        validator.is_obsolete()
    };
    if obsolete {
        snapshot.validators.delete(&pubkey)?;
    }
    Ok(())
}
