//! # Utility Functions
//!
//! Common helpers used throughout chansweep.

use crate::error::{SweepError, SweepResult};
use bitcoin::{Address, Network, ScriptBuf};
use std::str::FromStr;

/// Address helpers
pub mod address {
    use super::*;

    /// Parse the sweep destination and return its output script.
    ///
    /// The address must belong to the given network and must be P2WPKH,
    /// since the fee estimation accounts for exactly that output type.
    pub fn parse_sweep_script(address_str: &str, network: Network) -> SweepResult<ScriptBuf> {
        let address = Address::from_str(address_str)
            .map_err(|_| SweepError::InvalidAddress {
                address: address_str.to_string(),
            })?
            .require_network(network)
            .map_err(|_| SweepError::InvalidAddress {
                address: address_str.to_string(),
            })?;

        let script = address.script_pubkey();
        if !script.is_p2wpkh() {
            return Err(SweepError::InvalidAddress {
                address: address_str.to_string(),
            });
        }
        Ok(script)
    }
}

/// Amount formatting helpers
pub mod amount {
    /// Convert satoshis to BTC with 8 decimal places
    pub fn sats_to_btc(sats: u64) -> f64 {
        sats as f64 / 100_000_000.0
    }

    /// Format amount with both sats and BTC
    pub fn format_dual(sats: u64) -> String {
        format!("{} sats ({:.8} BTC)", sats, sats_to_btc(sats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP173 example P2WPKH address.
    const P2WPKH_ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    #[test]
    fn test_parse_sweep_script() {
        let script = address::parse_sweep_script(P2WPKH_ADDR, Network::Bitcoin).unwrap();
        assert!(script.is_p2wpkh());
    }

    #[test]
    fn test_wrong_network_rejected() {
        let err = address::parse_sweep_script(P2WPKH_ADDR, Network::Testnet).unwrap_err();
        assert!(matches!(err, SweepError::InvalidAddress { .. }));
    }

    #[test]
    fn test_non_p2wpkh_rejected() {
        // P2PKH addresses cannot be the sweep target.
        let err = address::parse_sweep_script("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", Network::Bitcoin)
            .unwrap_err();
        assert!(matches!(err, SweepError::InvalidAddress { .. }));
    }

    #[test]
    fn test_amount_formatting() {
        assert_eq!(amount::sats_to_btc(100_000_000), 1.0);
        assert_eq!(
            amount::format_dual(99_757),
            "99757 sats (0.00099757 BTC)"
        );
    }
}
