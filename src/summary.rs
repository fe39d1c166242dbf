//! # Channel Summary Reporting
//!
//! Read-only aggregation over the channel records: how many channels are
//! open, closed cooperatively, or force-closed, and how many sats sit where.
//! Spentness of force-close outputs is checked against the explorer. Nothing
//! here touches keys or signs anything.

use crate::config::files::RESULTS_DIR;
use crate::error::SweepResult;
use crate::records::SummaryEntry;
use crate::services::ExplorerApi;
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Aggregate channel statistics
#[derive(Debug, Default, Serialize)]
pub struct ChannelSummary {
    pub open_channels: u32,
    pub funds_open_channels: u64,
    pub closed_channels: u32,
    pub force_closed_channels: u32,
    pub coop_closed_channels: u32,
    pub fully_spent_channels: u32,
    pub channels_with_unspent: u32,
    pub funds_closed_channels: u64,
    pub funds_closed_spent: u64,
    pub funds_force_close: u64,
}

/// Compile the summary across all entries, querying the explorer for the
/// spend status of force-close outputs that are not already recorded as
/// fully spent.
pub async fn summarize_channels(
    api: &ExplorerApi,
    entries: &[SummaryEntry],
) -> SweepResult<ChannelSummary> {
    let mut summary = ChannelSummary::default();

    for entry in entries {
        let closing = match &entry.closing_tx {
            None => {
                summary.open_channels += 1;
                summary.funds_open_channels += entry.local_balance;
                continue;
            }
            Some(closing) => closing,
        };

        summary.closed_channels += 1;
        summary.funds_closed_channels += entry.local_balance;

        let force_close = match &entry.force_close {
            None => {
                summary.coop_closed_channels += 1;
                continue;
            }
            Some(fc) => fc,
        };
        summary.force_closed_channels += 1;

        if closing.all_outs_spent {
            summary.fully_spent_channels += 1;
            summary.funds_closed_spent += entry.local_balance;
            continue;
        }

        match api.get_outspends(&force_close.txid).await {
            Ok(outspends) => {
                let mut unspent_value = 0u64;
                for (idx, out) in force_close.outs.iter().enumerate() {
                    let spent = outspends.get(idx).map(|o| o.spent).unwrap_or(false);
                    if spent {
                        summary.funds_closed_spent += out.value;
                    } else {
                        unspent_value += out.value;
                    }
                }
                if unspent_value > 0 {
                    summary.channels_with_unspent += 1;
                    summary.funds_force_close += unspent_value;
                } else {
                    summary.fully_spent_channels += 1;
                }
            }
            Err(e) => {
                warn!(
                    "Could not check outputs of {}: {}",
                    entry.channel_point, e
                );
            }
        }
    }

    Ok(summary)
}

/// Log the aggregate lines of the finished scan
pub fn log_summary(summary: &ChannelSummary) {
    info!("Finished scanning.");
    info!("Open channels: {}", summary.open_channels);
    info!("Sats in open channels: {}", summary.funds_open_channels);
    info!("Closed channels: {}", summary.closed_channels);
    info!(" --> force closed channels: {}", summary.force_closed_channels);
    info!(" --> coop closed channels: {}", summary.coop_closed_channels);
    info!(
        " --> closed channels with all outputs spent: {}",
        summary.fully_spent_channels
    );
    info!(
        " --> closed channels with unspent outputs: {}",
        summary.channels_with_unspent
    );
    info!("Sats in closed channels: {}", summary.funds_closed_channels);
    info!(
        " --> closed channel sats that have been swept/spent: {}",
        summary.funds_closed_spent
    );
    info!(
        " --> closed channel sats that are in force-close outputs: {}",
        summary.funds_force_close
    );
}

fn report_path(timestamp: &str) -> PathBuf {
    PathBuf::from(RESULTS_DIR).join(format!("summary-{}.json", timestamp))
}

/// Write the summary as pretty-printed JSON under the results directory.
/// Returns the path of the written report.
pub fn write_report(summary: &ChannelSummary) -> SweepResult<PathBuf> {
    fs::create_dir_all(RESULTS_DIR)?;
    let path = report_path(&chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string());
    fs::write(&path, serde_json::to_string_pretty(summary)?)?;
    info!("Writing result to {}", path.display());
    Ok(path)
}
