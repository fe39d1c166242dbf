//! # Channel Summary Records
//!
//! Read-only data model for the per-channel summary entries the sweep
//! consumes. Entries are loaded from a JSON file produced by an external
//! channel-state export; the sweep never mutates them.

use crate::error::SweepResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One channel's historical state as exported from the channel database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// Funding outpoint of the channel (txid:index)
    pub channel_point: String,
    /// Total channel capacity in satoshis
    #[serde(default)]
    pub channel_capacity: u64,
    /// Our balance at the last known state, in satoshis
    #[serde(default)]
    pub local_balance: u64,
    /// Counterparty balance at the last known state, in satoshis
    #[serde(default)]
    pub remote_balance: u64,
    /// The on-chain closing transaction, if the channel is closed
    #[serde(default)]
    pub closing_tx: Option<ClosingTx>,
    /// Force-close state, if the channel was unilaterally closed
    #[serde(default)]
    pub force_close: Option<ForceClose>,
}

impl SummaryEntry {
    /// Whether the closing transaction has no unspent outputs left
    pub fn all_outs_spent(&self) -> bool {
        self.closing_tx
            .as_ref()
            .map(|tx| tx.all_outs_spent)
            .unwrap_or(false)
    }
}

/// Minimal view of the channel's closing transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingTx {
    /// Transaction id of the close
    pub txid: String,
    /// All outputs of the close have already been spent elsewhere
    #[serde(default)]
    pub all_outs_spent: bool,
}

/// Force-close state needed to reconstruct and claim the delayed output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceClose {
    /// Transaction id of the broadcast commitment transaction
    pub txid: String,
    /// Outputs of the commitment transaction
    pub outs: Vec<Out>,
    /// Per-state commitment point, hex-encoded compressed public key
    pub commit_point: String,
    /// Counterparty revocation base point
    pub revocation_base_point: BasePoint,
    /// Our delayed-payment base point with its key locator
    pub delay_base_point: BasePoint,
}

/// One output of the commitment transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Out {
    /// Hex-encoded locking script (P2WSH script-pubkey)
    pub script: String,
    /// Output value in satoshis
    pub value: u64,
}

/// A channel base point together with its HD key locator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasePoint {
    /// Hex-encoded compressed public key, if recorded
    #[serde(default)]
    pub pubkey: String,
    /// Key family under the node's key-chain purpose
    pub family: u16,
    /// Index within the family
    pub index: u32,
}

/// Load summary entries from a JSON file
pub fn load_entries(path: &Path) -> SweepResult<Vec<SummaryEntry>> {
    let file = File::open(path)?;
    let entries = serde_json::from_reader(BufReader::new(file))?;
    Ok(entries)
}
