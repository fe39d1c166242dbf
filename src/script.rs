//! # Script Reconstruction
//!
//! The channel database cannot be trusted to have recorded the CSV delay of
//! an old force-close output, but the delay is the only unknown parameter of
//! the locking script. Brute-forcing it is cheap: rebuild the candidate
//! script for every delay in a bounded range and compare script hashes
//! against the on-chain output.

use crate::error::{SweepError, SweepResult};
use bitcoin::hashes::{sha256, Hash};
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_CSV, OP_DROP, OP_ELSE, OP_ENDIF, OP_IF};
use bitcoin::script::Builder;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{Script, ScriptBuf};

/// Expected length of a P2WSH script-pubkey: version byte, push length,
/// 32-byte script hash.
pub const TARGET_SCRIPT_LEN: usize = 34;

/// Number of leading script-pubkey bytes that must match during the search.
/// A 64-bit prefix cannot collide within a few thousand candidates.
const MATCH_PREFIX_LEN: usize = 8;

/// Result of a successful delay search
#[derive(Debug, Clone)]
pub struct RecoveredScript {
    /// The relative time lock the output was created with
    pub csv_delay: u16,
    /// The full witness script redeeming the output
    pub witness_script: ScriptBuf,
    /// P2WSH script-pubkey committing to `witness_script`
    pub script_pubkey: ScriptBuf,
}

/// Build the delayed-or-revoked commitment output script:
///
/// ```text
/// OP_IF
///     <revocation_pubkey>
/// OP_ELSE
///     <csv_delay> OP_CHECKSEQUENCEVERIFY OP_DROP
///     <delay_pubkey>
/// OP_ENDIF
/// OP_CHECKSIG
/// ```
pub fn commit_script_to_self(
    csv_delay: u16,
    delay_pubkey: &PublicKey,
    revocation_pubkey: &PublicKey,
) -> ScriptBuf {
    Builder::new()
        .push_opcode(OP_IF)
        .push_slice(revocation_pubkey.serialize())
        .push_opcode(OP_ELSE)
        .push_int(i64::from(csv_delay))
        .push_opcode(OP_CSV)
        .push_opcode(OP_DROP)
        .push_slice(delay_pubkey.serialize())
        .push_opcode(OP_ENDIF)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// Hash a witness script into its P2WSH script-pubkey
pub fn witness_script_hash(witness_script: &Script) -> ScriptBuf {
    let script_hash = sha256::Hash::hash(witness_script.as_bytes());
    ScriptBuf::new_p2wsh(&script_hash.into())
}

/// Search for the CSV delay that reproduces `target_script`.
///
/// Candidates are tried in increasing order starting at zero, so the
/// smallest matching delay always wins. Returns
/// [`SweepError::InvalidScriptLength`] without any search iteration when the
/// target is not a 34-byte P2WSH script-pubkey, and
/// [`SweepError::ScriptNotFound`] when the bound is exhausted.
pub fn brute_force_delay(
    delay_pubkey: &PublicKey,
    revocation_pubkey: &PublicKey,
    target_script: &[u8],
    max_csv: u16,
) -> SweepResult<RecoveredScript> {
    if target_script.len() != TARGET_SCRIPT_LEN {
        return Err(SweepError::InvalidScriptLength {
            length: target_script.len(),
        });
    }

    for csv_delay in 0..=max_csv {
        let witness_script = commit_script_to_self(csv_delay, delay_pubkey, revocation_pubkey);
        let script_pubkey = witness_script_hash(&witness_script);
        if script_pubkey.as_bytes()[..MATCH_PREFIX_LEN] == target_script[..MATCH_PREFIX_LEN] {
            return Ok(RecoveredScript {
                csv_delay,
                witness_script,
                script_pubkey,
            });
        }
    }

    Err(SweepError::ScriptNotFound { limit: max_csv })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::{Secp256k1, SecretKey};

    fn test_keys() -> (PublicKey, PublicKey) {
        let secp = Secp256k1::new();
        let delay = PublicKey::from_secret_key(
            &secp,
            &SecretKey::from_slice(&[0x11u8; 32]).unwrap(),
        );
        let revocation = PublicKey::from_secret_key(
            &secp,
            &SecretKey::from_slice(&[0x22u8; 32]).unwrap(),
        );
        (delay, revocation)
    }

    #[test]
    fn test_script_shape() {
        let (delay, revocation) = test_keys();
        let script = commit_script_to_self(144, &delay, &revocation);

        let bytes = script.as_bytes();
        assert_eq!(bytes[0], OP_IF.to_u8());
        assert_eq!(*bytes.last().unwrap(), OP_CHECKSIG.to_u8());

        // Both script parameters must appear verbatim.
        let hex = hex::encode(bytes);
        assert!(hex.contains(&hex::encode(revocation.serialize())));
        assert!(hex.contains(&hex::encode(delay.serialize())));

        let script_pubkey = witness_script_hash(&script);
        assert!(script_pubkey.is_p2wsh());
        assert_eq!(script_pubkey.len(), TARGET_SCRIPT_LEN);
    }

    #[test]
    fn test_search_round_trip() {
        let (delay, revocation) = test_keys();

        for csv in [0u16, 1, 5, 144, 2016] {
            let original = commit_script_to_self(csv, &delay, &revocation);
            let target = witness_script_hash(&original);

            let recovered =
                brute_force_delay(&delay, &revocation, target.as_bytes(), 2016).unwrap();
            assert_eq!(recovered.csv_delay, csv);
            assert_eq!(recovered.witness_script, original);
            assert_eq!(recovered.script_pubkey, target);
        }
    }

    #[test]
    fn test_search_bound_exhausted() {
        let (delay, revocation) = test_keys();
        let target = witness_script_hash(&commit_script_to_self(145, &delay, &revocation));

        let err = brute_force_delay(&delay, &revocation, target.as_bytes(), 144).unwrap_err();
        assert!(matches!(err, SweepError::ScriptNotFound { limit: 144 }));
    }

    #[test]
    fn test_search_returns_smallest_match() {
        let (delay, revocation) = test_keys();
        // The candidate loop starts at zero and returns on the first hit, so
        // a target built at delay five must come back as exactly five even
        // with plenty of search room left.
        let target = witness_script_hash(&commit_script_to_self(5, &delay, &revocation));
        let recovered = brute_force_delay(&delay, &revocation, target.as_bytes(), 2016).unwrap();
        assert_eq!(recovered.csv_delay, 5);
    }

    #[test]
    fn test_invalid_target_length_rejected_before_search() {
        let (delay, revocation) = test_keys();

        let err = brute_force_delay(&delay, &revocation, &[0u8; 33], 2016).unwrap_err();
        assert!(matches!(err, SweepError::InvalidScriptLength { length: 33 }));

        let err = brute_force_delay(&delay, &revocation, &[], 2016).unwrap_err();
        assert!(matches!(err, SweepError::InvalidScriptLength { length: 0 }));
    }

    #[test]
    fn test_wrong_keys_never_match() {
        let secp = Secp256k1::new();
        let (delay, revocation) = test_keys();
        let target = witness_script_hash(&commit_script_to_self(10, &delay, &revocation));

        // A deviation in either script parameter makes the search come up
        // empty instead of producing a false positive.
        let wrong = PublicKey::from_secret_key(
            &secp,
            &SecretKey::from_slice(&[0x33u8; 32]).unwrap(),
        );
        let err = brute_force_delay(&wrong, &revocation, target.as_bytes(), 100).unwrap_err();
        assert!(matches!(err, SweepError::ScriptNotFound { .. }));
    }
}
