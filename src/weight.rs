//! # Transaction Weight Estimation
//!
//! Weight is estimated up front, before any witness exists, so the fee and
//! the sweep output value can be fixed prior to signing. Sizes assume
//! worst-case DER signatures.

use bitcoin::consensus::encode::VarInt;
use bitcoin::constants::WITNESS_SCALE_FACTOR;
use bitcoin::Weight;

/// Non-witness size of one input: outpoint (36), empty script-sig length
/// prefix (1), sequence (4).
const INPUT_SIZE: usize = 41;

/// Size of a P2WPKH output: value (8), script length (1), script (22).
const P2WPKH_OUTPUT_SIZE: usize = 31;

/// Segwit marker and flag bytes.
const WITNESS_HEADER_SIZE: usize = 2;

/// Size of the delayed-or-revoked witness script: OP_IF (1), revocation key
/// push (34), OP_ELSE (1), delay push (up to 5), OP_CSV (1), OP_DROP (1),
/// delay key push (34), OP_ENDIF (1), OP_CHECKSIG (1).
pub const TO_LOCAL_SCRIPT_SIZE: usize = 79;

/// Witness size for spending the delayed branch: element count (1),
/// signature with length prefix (74), empty branch selector (1), script
/// with length prefix (1 + TO_LOCAL_SCRIPT_SIZE).
pub const TO_LOCAL_TIMEOUT_WITNESS_SIZE: usize = 1 + 74 + 1 + 1 + TO_LOCAL_SCRIPT_SIZE;

/// Incremental weight estimator for the sweep transaction
#[derive(Debug, Default)]
pub struct TxWeightEstimator {
    input_count: usize,
    input_size: usize,
    output_count: usize,
    output_size: usize,
    witness_size: usize,
    has_witness: bool,
}

impl TxWeightEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one segwit input with the given witness size
    pub fn add_witness_input(&mut self, witness_size: usize) {
        self.input_count += 1;
        self.input_size += INPUT_SIZE;
        self.witness_size += witness_size;
        self.has_witness = true;
    }

    /// Account for one P2WPKH output
    pub fn add_p2wpkh_output(&mut self) {
        self.output_count += 1;
        self.output_size += P2WPKH_OUTPUT_SIZE;
    }

    /// Total estimated weight of the transaction in weight units
    pub fn weight(&self) -> Weight {
        let base_size = 4
            + VarInt(self.input_count as u64).size()
            + self.input_size
            + VarInt(self.output_count as u64).size()
            + self.output_size
            + 4;

        let mut weight_units = base_size * WITNESS_SCALE_FACTOR;
        if self.has_witness {
            weight_units += WITNESS_HEADER_SIZE + self.witness_size;
        }
        Weight::from_wu(weight_units as u64)
    }
}

/// Convert a sat/vByte rate to the per-kilo-weight-unit rate used for the
/// fee computation. One virtual byte spans four weight units.
pub fn fee_rate_per_kw(fee_rate_sat_per_vbyte: u16) -> u64 {
    u64::from(fee_rate_sat_per_vbyte) * 1000 / WITNESS_SCALE_FACTOR as u64
}

/// Total fee in satoshis for a transaction of the given weight, truncating
/// sub-satoshi remainders.
pub fn fee_for_weight(fee_rate_sat_per_vbyte: u16, weight: Weight) -> u64 {
    fee_rate_per_kw(fee_rate_sat_per_vbyte) * weight.to_wu() / 1000
}
