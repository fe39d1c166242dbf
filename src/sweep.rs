//! # Sweep Transaction Assembly
//!
//! Walks the channel records, resolves each one into a spendable time-lock
//! input, and assembles the single batch transaction claiming all of them.
//! Record-level problems skip that record with a diagnostic; anything wrong
//! with keys, funds, or signing aborts the whole batch before a single byte
//! is signed or published.

use crate::config::sweep::P2WPKH_DUST_LIMIT;
use crate::error::{SkipReason, SweepError, SweepResult};
use crate::keys::{self, KeyRing};
use crate::records::SummaryEntry;
use crate::script;
use crate::selector;
use crate::signer;
use crate::utils;
use crate::weight::{self, TxWeightEstimator, TO_LOCAL_TIMEOUT_WITNESS_SIZE};
use bitcoin::absolute::LockTime;
use bitcoin::bip32::Xpriv;
use bitcoin::secp256k1::SecretKey;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use log::{info, warn};
use std::str::FromStr;

/// One resolved transaction input, ready to be signed
#[derive(Debug)]
pub struct SweepInput {
    /// The force-close output being claimed
    pub outpoint: OutPoint,
    /// Value of that output in satoshis
    pub value: u64,
    /// BIP68 block-based relative lock encoding the recovered CSV delay
    pub sequence: Sequence,
    /// The reconstructed witness script
    pub witness_script: ScriptBuf,
    /// Private key behind the delay base point
    pub delay_base_secret: SecretKey,
    /// Commitment tweak to apply at signing time
    pub single_tweak: [u8; 32],
    /// Channel identity, for diagnostics
    pub channel_point: String,
}

/// Accumulates sweep inputs together with their claimed value and weight
#[derive(Default)]
pub struct SweepBuilder {
    inputs: Vec<SweepInput>,
    total_value: u64,
    estimator: TxWeightEstimator,
}

/// The assembled transaction with everything needed to sign it
#[derive(Debug)]
pub struct FinalizedSweep {
    pub transaction: Transaction,
    pub inputs: Vec<SweepInput>,
    pub total_claimed: u64,
    pub fee: u64,
    pub weight: u64,
}

impl SweepBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Append one time-lock input and account for its witness weight
    pub fn add_timeout_input(&mut self, input: SweepInput) {
        self.total_value += input.value;
        self.estimator.add_witness_input(TO_LOCAL_TIMEOUT_WITNESS_SIZE);
        self.inputs.push(input);
    }

    /// Close the builder: add the destination output, compute the fee from
    /// the weight estimate, and build the unsigned transaction.
    pub fn finalize(mut self, sweep_script: ScriptBuf, fee_rate: u16) -> SweepResult<FinalizedSweep> {
        if self.inputs.is_empty() {
            return Err(SweepError::NoSweepableOutputs);
        }

        self.estimator.add_p2wpkh_output();
        let weight = self.estimator.weight();
        let fee = weight::fee_for_weight(fee_rate, weight);

        // The original tool would happily build a negative or dust output
        // here; reject that instead of producing an unrelayable transaction.
        let output_value = self
            .total_value
            .checked_sub(fee)
            .filter(|value| *value >= P2WPKH_DUST_LIMIT)
            .ok_or(SweepError::InsufficientFunds {
                claimed: self.total_value,
                fee,
            })?;

        let input = self
            .inputs
            .iter()
            .map(|inp| TxIn {
                previous_output: inp.outpoint,
                script_sig: ScriptBuf::new(),
                sequence: inp.sequence,
                witness: Witness::new(),
            })
            .collect();

        let transaction = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input,
            output: vec![TxOut {
                value: Amount::from_sat(output_value),
                script_pubkey: sweep_script,
            }],
        };

        Ok(FinalizedSweep {
            transaction,
            inputs: self.inputs,
            total_claimed: self.total_value,
            fee,
            weight: weight.to_wu(),
        })
    }
}

/// A successfully swept channel, for the report
#[derive(Debug)]
pub struct SweptChannel {
    pub channel_point: String,
    pub outpoint: OutPoint,
    pub value: u64,
    pub csv_delay: u16,
}

/// A skipped channel together with the reason, for the report
#[derive(Debug)]
pub struct SkippedChannel {
    pub channel_point: String,
    pub reason: SkipReason,
}

/// Outcome of a full sweep run: the signed transaction plus diagnostics
#[derive(Debug)]
pub struct SweepReport {
    pub transaction: Transaction,
    pub raw_tx_hex: String,
    pub total_claimed: u64,
    pub fee: u64,
    pub weight: u64,
    pub swept: Vec<SweptChannel>,
    pub skipped: Vec<SkippedChannel>,
}

/// Resolve one record into a sweep input, or the reason it was skipped.
///
/// Key-material failures (malformed points, unresolvable locators) are
/// deliberately fatal rather than skips, so a subtly wrong derivation is
/// never misread as "CSV search exhausted".
fn resolve_entry(
    keyring: &KeyRing,
    entry: &SummaryEntry,
    max_csv: u16,
) -> SweepResult<Result<(SweepInput, u16), SkipReason>> {
    let (txindex, out) = match selector::select_output(entry) {
        Ok(selected) => selected,
        Err(reason) => return Ok(Err(reason)),
    };
    let force_close = match &entry.force_close {
        Some(fc) => fc,
        None => return Ok(Err(SkipReason::NothingToSweep)),
    };

    let sweep_keys = keys::derive_sweep_keys(keyring, force_close)?;

    let target_script = match hex::decode(&out.script) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(Err(SkipReason::InvalidTargetScript {
                message: e.to_string(),
            }))
        }
    };

    let recovered = match script::brute_force_delay(
        &sweep_keys.tweaked_delay,
        &sweep_keys.revocation,
        &target_script,
        max_csv,
    ) {
        Ok(recovered) => recovered,
        Err(SweepError::InvalidScriptLength { length }) => {
            return Ok(Err(SkipReason::InvalidTargetScript {
                message: format!("expected 34 bytes, got {}", length),
            }))
        }
        Err(SweepError::ScriptNotFound { limit }) => {
            return Ok(Err(SkipReason::ScriptNotFound { limit }))
        }
        Err(e) => return Err(e),
    };

    let txid = Txid::from_str(&force_close.txid)
        .map_err(|e| SweepError::operation("parse_txid", e.to_string()))?;

    let input = SweepInput {
        outpoint: OutPoint {
            txid,
            vout: txindex,
        },
        value: out.value,
        sequence: Sequence::from_height(recovered.csv_delay),
        witness_script: recovered.witness_script,
        delay_base_secret: sweep_keys.delay_base_secret,
        single_tweak: sweep_keys.single_tweak,
        channel_point: entry.channel_point.clone(),
    };
    Ok(Ok((input, recovered.csv_delay)))
}

/// Run the whole sweep: resolve every record, assemble, fee, sign, encode.
pub fn sweep_time_lock(
    master: Xpriv,
    entries: &[SummaryEntry],
    sweep_addr: &str,
    max_csv: u16,
    fee_rate: u16,
) -> SweepResult<SweepReport> {
    if entries.is_empty() {
        return Err(SweepError::NoEntries);
    }

    let keyring = KeyRing::new(master);
    let sweep_script = utils::address::parse_sweep_script(sweep_addr, keyring.network())?;

    let mut builder = SweepBuilder::new();
    let mut swept = Vec::new();
    let mut skipped = Vec::new();

    for entry in entries {
        match resolve_entry(&keyring, entry, max_csv)? {
            Ok((input, csv_delay)) => {
                info!(
                    "Sweeping {} of {}: {} with CSV delay {}",
                    utils::amount::format_dual(input.value),
                    entry.channel_point,
                    input.outpoint,
                    csv_delay
                );
                swept.push(SweptChannel {
                    channel_point: entry.channel_point.clone(),
                    outpoint: input.outpoint,
                    value: input.value,
                    csv_delay,
                });
                builder.add_timeout_input(input);
            }
            Err(reason) => {
                warn!("Not sweeping {}: {}", entry.channel_point, reason);
                skipped.push(SkippedChannel {
                    channel_point: entry.channel_point.clone(),
                    reason,
                });
            }
        }
    }

    let finalized = builder.finalize(sweep_script, fee_rate)?;
    info!(
        "Fee {} sats of {} total amount (estimated weight {})",
        finalized.fee, finalized.total_claimed, finalized.weight
    );

    let mut transaction = finalized.transaction;
    signer::sign_sweep_transaction(&mut transaction, &finalized.inputs, keyring.secp())?;

    let raw_tx_hex = bitcoin::consensus::encode::serialize_hex(&transaction);

    Ok(SweepReport {
        transaction,
        raw_tx_hex,
        total_claimed: finalized.total_claimed,
        fee: finalized.fee,
        weight: finalized.weight,
        swept,
        skipped,
    })
}
