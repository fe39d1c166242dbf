//! # Witness Signing
//!
//! Produces the witness satisfying the delayed branch of the reconstructed
//! time-lock script for every input of the finalized sweep transaction. The
//! revoked branch is never taken here: the channel owner is recovering their
//! own funds, not punishing a counterparty.

use crate::error::{SweepError, SweepResult};
use crate::keys;
use crate::sweep::SweepInput;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, Transaction, Witness};

/// Sign every input of the sweep transaction in place.
///
/// One sighash cache is shared across all inputs. The signing key is the
/// delay base key offset by the per-commitment single tweak, reproducing the
/// public key embedded in the witness script.
pub fn sign_sweep_transaction(
    transaction: &mut Transaction,
    inputs: &[SweepInput],
    secp: &Secp256k1<All>,
) -> SweepResult<()> {
    let mut sighash_cache = SighashCache::new(transaction);

    for (input_index, input) in inputs.iter().enumerate() {
        let sighash = sighash_cache
            .p2wsh_signature_hash(
                input_index,
                &input.witness_script,
                Amount::from_sat(input.value),
                EcdsaSighashType::All,
            )
            .map_err(|e| SweepError::signing(e.to_string()))?;
        let message = Message::from_digest(sighash.to_byte_array());

        let signing_key = keys::tweak_privkey(&input.delay_base_secret, &input.single_tweak)?;
        let signature = secp.sign_ecdsa_low_r(&message, &signing_key);

        let mut signature_bytes = signature.serialize_der().to_vec();
        signature_bytes.push(EcdsaSighashType::All as u8);

        let mut witness = Witness::new();
        witness.push(signature_bytes);
        witness.push(Vec::new()); // empty selector takes the delayed branch
        witness.push(input.witness_script.as_bytes());

        *sighash_cache
            .witness_mut(input_index)
            .ok_or_else(|| SweepError::signing(format!("no input at index {}", input_index)))? =
            witness;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script;
    use crate::sweep::SweepInput;
    use bitcoin::absolute::LockTime;
    use bitcoin::secp256k1::{ecdsa::Signature, PublicKey, SecretKey};
    use bitcoin::transaction::Version;
    use bitcoin::{OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Txid, Witness};
    use std::str::FromStr;

    #[test]
    fn test_witness_satisfies_delayed_branch() {
        let secp = Secp256k1::new();
        let delay_base_secret = SecretKey::from_slice(&[0x41u8; 32]).unwrap();
        let delay_base = PublicKey::from_secret_key(&secp, &delay_base_secret);
        let commit_point = PublicKey::from_secret_key(
            &secp,
            &SecretKey::from_slice(&[0x42u8; 32]).unwrap(),
        );
        let revocation = PublicKey::from_secret_key(
            &secp,
            &SecretKey::from_slice(&[0x43u8; 32]).unwrap(),
        );

        let single_tweak = keys::single_tweak_bytes(&commit_point, &delay_base);
        let tweaked_delay = keys::tweak_pubkey(&secp, &delay_base, &commit_point).unwrap();
        let witness_script = script::commit_script_to_self(25, &tweaked_delay, &revocation);

        let outpoint = OutPoint {
            txid: Txid::from_str(&"ab".repeat(32)).unwrap(),
            vout: 1,
        };
        let value = 250_000u64;
        let inputs = vec![SweepInput {
            outpoint,
            value,
            sequence: Sequence::from_height(25),
            witness_script: witness_script.clone(),
            delay_base_secret,
            single_tweak,
            channel_point: "test:0".to_string(),
        }];

        let mut transaction = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::from_height(25),
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(value - 1_000),
                script_pubkey: ScriptBuf::new(),
            }],
        };

        sign_sweep_transaction(&mut transaction, &inputs, &secp).unwrap();

        let witness = &transaction.input[0].witness;
        assert_eq!(witness.len(), 3);
        assert_eq!(witness.nth(1).unwrap(), &[] as &[u8]);
        assert_eq!(witness.nth(2).unwrap(), witness_script.as_bytes());

        // The signature must verify under the tweaked delay key, the key the
        // script's delayed branch checks against.
        let sig_push = witness.nth(0).unwrap();
        assert_eq!(*sig_push.last().unwrap(), EcdsaSighashType::All as u8);
        let signature = Signature::from_der(&sig_push[..sig_push.len() - 1]).unwrap();

        let sighash = SighashCache::new(&transaction)
            .p2wsh_signature_hash(
                0,
                &witness_script,
                Amount::from_sat(value),
                EcdsaSighashType::All,
            )
            .unwrap();
        let message = Message::from_digest(sighash.to_byte_array());
        assert!(secp.verify_ecdsa(&message, &signature, &tweaked_delay).is_ok());
    }
}
