//! # Error Types
//!
//! Error handling for the sweep pipeline. Fatal errors abort the whole batch
//! before anything is signed or published; per-record skip reasons are logged
//! with the channel identity and the batch continues without that record.

use thiserror::Error;

/// Fatal error type for sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    /// Sweep address missing, malformed, or not P2WPKH for the key network
    #[error("invalid sweep address: {address}")]
    InvalidAddress { address: String },

    /// Malformed public key or root key material
    #[error("key parse error: {message}")]
    KeyParse { message: String },

    /// A key locator could not be resolved against the master key
    #[error("key derivation failed: {source}")]
    KeyDerivation {
        #[from]
        source: bitcoin::bip32::Error,
    },

    /// Target locking script is not a 34-byte P2WSH script-pubkey
    #[error("invalid target script length: expected 34 bytes, got {length}")]
    InvalidScriptLength { length: usize },

    /// CSV delay search exhausted without reproducing the target script
    #[error("no matching script found for CSV delays 0..={limit}")]
    ScriptNotFound { limit: u16 },

    /// The channel input file contained no records at all
    #[error("no channel records to process")]
    NoEntries,

    /// Every record was filtered or skipped; there is nothing to sweep
    #[error("no sweepable outputs found")]
    NoSweepableOutputs,

    /// The claimed value cannot cover the fee plus a non-dust output
    #[error("insufficient funds: claimed {claimed} sats cannot cover fee of {fee} sats")]
    InsufficientFunds { claimed: u64, fee: u64 },

    /// Signing primitive rejected the key or sighash
    #[error("signing failed: {message}")]
    Signing { message: String },

    /// Elliptic curve operation failures
    #[error("secp256k1 operation failed: {source}")]
    Secp {
        #[from]
        source: bitcoin::secp256k1::Error,
    },

    /// Network request failures (explorer API)
    #[error("network request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// Bitcoin Core RPC communication failures
    #[error("RPC communication failed: {source}")]
    Rpc {
        #[from]
        source: bitcoincore_rpc::Error,
    },

    /// File I/O operations
    #[error("file operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON processing error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Generic operation failures with context
    #[error("operation failed: {operation} - {message}")]
    OperationFailed { operation: String, message: String },
}

/// Result type alias for sweep operations
pub type SweepResult<T> = Result<T, SweepError>;

impl SweepError {
    /// Create a key parse error with a message
    pub fn key_parse(message: impl Into<String>) -> Self {
        Self::KeyParse {
            message: message.into(),
        }
    }

    /// Create a signing error with a message
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Create an operation failed error
    pub fn operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Check if this error leaves the record usable (skip instead of abort)
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            SweepError::InvalidScriptLength { .. } | SweepError::ScriptNotFound { .. }
        )
    }
}

/// Why a single channel record was excluded from the sweep
#[derive(Debug, Error)]
pub enum SkipReason {
    /// No force-close data, all outputs already spent, or zero balance
    #[error("force-close info missing or all outputs spent")]
    NothingToSweep,

    /// None of the commitment outputs matches the recorded local balance
    #[error("no output matches local balance of {balance} sats")]
    OutputNotFound { balance: u64 },

    /// Brute-force search exhausted the CSV bound
    #[error("no matching script within CSV limit {limit}; the limit may be too low")]
    ScriptNotFound { limit: u16 },

    /// The recorded locking script is unusable (bad hex or wrong length)
    #[error("unusable target script: {message}")]
    InvalidTargetScript { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let parse_err = SweepError::key_parse("bad hex");
        assert!(matches!(parse_err, SweepError::KeyParse { .. }));

        let sign_err = SweepError::signing("curve error");
        assert!(matches!(sign_err, SweepError::Signing { .. }));
    }

    #[test]
    fn test_per_record_classification() {
        assert!(SweepError::ScriptNotFound { limit: 2016 }.is_per_record());
        assert!(SweepError::InvalidScriptLength { length: 33 }.is_per_record());
        assert!(!SweepError::NoSweepableOutputs.is_per_record());
        assert!(!SweepError::key_parse("x").is_per_record());
    }

    #[test]
    fn test_skip_reason_messages() {
        let reason = SkipReason::ScriptNotFound { limit: 144 };
        assert!(reason.to_string().contains("144"));

        let reason = SkipReason::OutputNotFound { balance: 50_000 };
        assert!(reason.to_string().contains("50000"));
    }
}
