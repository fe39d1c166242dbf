//! # Output Selection
//!
//! Locates the sweepable output of a force-close commitment transaction.
//! Recorded balances can be slightly off for old channels, so a lone output
//! is accepted even when its value disagrees with the recorded balance.

use crate::error::SkipReason;
use crate::records::{Out, SummaryEntry};
use log::warn;

/// Pick the output of the commitment transaction that carries our delayed
/// balance.
///
/// Skips (not errors) when there is nothing to sweep for this channel:
/// missing force-close data, all outputs already spent, or a zero local
/// balance. With a single candidate output a value mismatch is tolerated and
/// logged; with multiple candidates only an exact balance match is accepted.
pub fn select_output(entry: &SummaryEntry) -> Result<(u32, &Out), SkipReason> {
    let force_close = match &entry.force_close {
        Some(fc) => fc,
        None => return Err(SkipReason::NothingToSweep),
    };
    if entry.all_outs_spent() || entry.local_balance == 0 {
        return Err(SkipReason::NothingToSweep);
    }

    if force_close.outs.len() == 1 {
        let out = &force_close.outs[0];
        if out.value != entry.local_balance {
            warn!(
                "Potential value mismatch! {} vs {} ({})",
                out.value, entry.local_balance, entry.channel_point
            );
        }
        return Ok((0, out));
    }

    force_close
        .outs
        .iter()
        .enumerate()
        .find(|(_, out)| out.value == entry.local_balance)
        .map(|(idx, out)| (idx as u32, out))
        .ok_or(SkipReason::OutputNotFound {
            balance: entry.local_balance,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BasePoint, ClosingTx, ForceClose};

    fn base_point() -> BasePoint {
        BasePoint {
            pubkey: String::new(),
            family: 4,
            index: 0,
        }
    }

    fn entry_with_outs(local_balance: u64, outs: Vec<Out>) -> SummaryEntry {
        SummaryEntry {
            channel_point: "aa:0".to_string(),
            channel_capacity: 1_000_000,
            local_balance,
            remote_balance: 0,
            closing_tx: None,
            force_close: Some(ForceClose {
                txid: "bb".to_string(),
                outs,
                commit_point: String::new(),
                revocation_base_point: base_point(),
                delay_base_point: base_point(),
            }),
        }
    }

    fn out(value: u64) -> Out {
        Out {
            script: String::new(),
            value,
        }
    }

    #[test]
    fn test_skip_without_force_close() {
        let mut entry = entry_with_outs(100, vec![out(100)]);
        entry.force_close = None;
        assert!(matches!(
            select_output(&entry),
            Err(SkipReason::NothingToSweep)
        ));
    }

    #[test]
    fn test_skip_when_all_outs_spent() {
        let mut entry = entry_with_outs(100, vec![out(100)]);
        entry.closing_tx = Some(ClosingTx {
            txid: "cc".to_string(),
            all_outs_spent: true,
        });
        assert!(matches!(
            select_output(&entry),
            Err(SkipReason::NothingToSweep)
        ));
    }

    #[test]
    fn test_skip_on_zero_balance() {
        let entry = entry_with_outs(0, vec![out(100)]);
        assert!(matches!(
            select_output(&entry),
            Err(SkipReason::NothingToSweep)
        ));
    }

    #[test]
    fn test_single_output_selected_despite_mismatch() {
        let entry = entry_with_outs(100_000, vec![out(90_000)]);
        let (idx, out) = select_output(&entry).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(out.value, 90_000);
    }

    #[test]
    fn test_multiple_outputs_exact_match() {
        let entry = entry_with_outs(60_000, vec![out(40_000), out(60_000), out(1_000)]);
        let (idx, out) = select_output(&entry).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(out.value, 60_000);
    }

    #[test]
    fn test_multiple_outputs_no_match() {
        let entry = entry_with_outs(70_000, vec![out(40_000), out(60_000)]);
        assert!(matches!(
            select_output(&entry),
            Err(SkipReason::OutputNotFound { balance: 70_000 })
        ));
    }
}
