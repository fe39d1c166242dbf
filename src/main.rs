//! # chansweep: Force-Close Channel Recovery Tool
//!
//! Sweeps the delayed outputs of force-closed Lightning channels once their
//! relative time lock has expired. The exact CSV delay is brute-forced from
//! the on-chain locking script, the channel keys are re-derived from the
//! node's root key, and every recoverable output is claimed in one batch
//! transaction.
//!
//! ## Usage
//!
//! ```text
//! chansweep sweep-time-lock \
//!     --rootkey xprv... \
//!     --listchannels channels.json \
//!     --sweepaddr bc1q...
//! ```
//!
//! The raw transaction is printed by default; pass `--publish` to broadcast
//! it through the explorer API, or `--publish --bitcoind` to broadcast
//! through a local node.

use anyhow::{Context, Result};
use bitcoin::bip32::Xpriv;
use chansweep::config::{network, sweep as sweep_config};
use chansweep::services::{BitcoindClient, ExplorerApi};
use chansweep::{records, summary, sweep, utils};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "chansweep")]
#[command(about = "Recover funds from force-closed Lightning channels after the time lock expired")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep force-closed channel outputs once the time lock has expired
    SweepTimeLock {
        /// BIP32 extended root key the channel keys derive from
        #[arg(long)]
        rootkey: String,
        /// JSON file with the channel summary entries
        #[arg(long)]
        listchannels: PathBuf,
        /// Address to sweep the funds to (must be P2WPKH)
        #[arg(long)]
        sweepaddr: String,
        /// Maximum CSV limit to use for the brute-force search
        #[arg(long, default_value_t = sweep_config::DEFAULT_CSV_LIMIT)]
        maxcsvlimit: u16,
        /// Fee rate for the sweep transaction in sat/vByte
        #[arg(long, default_value_t = sweep_config::DEFAULT_FEE_RATE)]
        feerate: u16,
        /// Publish the sweep TX instead of just printing it
        #[arg(long, default_value_t = false)]
        publish: bool,
        /// Esplora-compatible API URL
        #[arg(long, default_value = network::DEFAULT_API_URL)]
        apiurl: String,
        /// Publish through a local bitcoind (RPC_* environment) instead of
        /// the explorer API
        #[arg(long, default_value_t = false)]
        bitcoind: bool,
    },
    /// Compile a summary about the current state of channels
    Summary {
        /// JSON file with the channel summary entries
        #[arg(long)]
        listchannels: PathBuf,
        /// Esplora-compatible API URL
        #[arg(long, default_value = network::DEFAULT_API_URL)]
        apiurl: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::SweepTimeLock {
            rootkey,
            listchannels,
            sweepaddr,
            maxcsvlimit,
            feerate,
            publish,
            apiurl,
            bitcoind,
        } => {
            sweep_time_lock(
                &rootkey,
                &listchannels,
                &sweepaddr,
                maxcsvlimit,
                feerate,
                publish,
                &apiurl,
                bitcoind,
            )
            .await?;
        }
        Commands::Summary {
            listchannels,
            apiurl,
        } => {
            summarize(&listchannels, &apiurl).await?;
        }
    }

    Ok(())
}

async fn sweep_time_lock(
    rootkey: &str,
    listchannels: &Path,
    sweepaddr: &str,
    maxcsvlimit: u16,
    feerate: u16,
    publish: bool,
    apiurl: &str,
    bitcoind: bool,
) -> Result<()> {
    let master = Xpriv::from_str(rootkey).context("error reading root key")?;
    let entries = records::load_entries(listchannels).context("error parsing channel input")?;

    let report = sweep::sweep_time_lock(master, &entries, sweepaddr, maxcsvlimit, feerate)?;
    info!(
        "Swept {} channels ({} skipped), claiming {}",
        report.swept.len(),
        report.skipped.len(),
        utils::amount::format_dual(report.total_claimed)
    );

    if publish {
        let txid = report.transaction.compute_txid();
        if bitcoind {
            let client = BitcoindClient::new()?;
            client.send_raw_transaction(&report.transaction)?;
            info!("Published TX {} via bitcoind", txid);
        } else {
            let api = ExplorerApi::new(apiurl)?;
            let response = api.publish_tx(&report.raw_tx_hex).await?;
            info!("Published TX {}, response: {}", txid, response);
        }
    }

    println!("{}", report.raw_tx_hex);
    Ok(())
}

async fn summarize(listchannels: &Path, apiurl: &str) -> Result<()> {
    let entries = records::load_entries(listchannels).context("error parsing channel input")?;

    let api = ExplorerApi::new(apiurl)?;
    let channel_summary = summary::summarize_channels(&api, &entries).await?;
    summary::log_summary(&channel_summary);

    let path = summary::write_report(&channel_summary)?;
    println!("Summary written to {}", path.display());
    Ok(())
}
