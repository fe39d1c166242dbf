//! # Key Derivation
//!
//! Derives the per-commitment keys needed to rebuild the delayed output
//! script and to sign against it. The script side needs the tweaked public
//! keys, the signing side needs the matching private-key tweak; both go
//! through [`single_tweak_bytes`] so the two can never drift apart.

use crate::error::{SweepError, SweepResult};
use crate::records::{BasePoint, ForceClose};
use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use bitcoin::{Network, NetworkKind};

/// BIP43 purpose under which node keys are derived (m/1017'/...)
pub const KEYCHAIN_PURPOSE: u32 = 1017;

/// Parse a hex-encoded compressed public key
pub fn pubkey_from_hex(pubkey_hex: &str) -> SweepResult<PublicKey> {
    let bytes = hex::decode(pubkey_hex)
        .map_err(|e| SweepError::key_parse(format!("invalid pubkey hex: {}", e)))?;
    PublicKey::from_slice(&bytes)
        .map_err(|e| SweepError::key_parse(format!("invalid public key: {}", e)))
}

/// Compute the commitment tweak `SHA256(commit_point || base_point)`.
///
/// This is the single source of truth for the additive tweak: the public
/// key used inside the witness script and the private key used at signing
/// time are both offset by this value.
pub fn single_tweak_bytes(commit_point: &PublicKey, base_point: &PublicKey) -> [u8; 32] {
    let mut engine = sha256::Hash::engine();
    engine.input(&commit_point.serialize());
    engine.input(&base_point.serialize());
    sha256::Hash::from_engine(engine).to_byte_array()
}

/// Tweak a base point with the commitment point: `base + tweak*G`
pub fn tweak_pubkey(
    secp: &Secp256k1<All>,
    base_point: &PublicKey,
    commit_point: &PublicKey,
) -> SweepResult<PublicKey> {
    let tweak = single_tweak_bytes(commit_point, base_point);
    let scalar = Scalar::from_be_bytes(tweak)
        .map_err(|_| SweepError::key_parse("commitment tweak out of curve order"))?;
    Ok(base_point.add_exp_tweak(secp, &scalar)?)
}

/// Apply the single tweak to the base private key: `secret + tweak`
pub fn tweak_privkey(base_secret: &SecretKey, single_tweak: &[u8; 32]) -> SweepResult<SecretKey> {
    let scalar = Scalar::from_be_bytes(*single_tweak)
        .map_err(|_| SweepError::key_parse("commitment tweak out of curve order"))?;
    Ok(base_secret.add_tweak(&scalar)?)
}

/// Derive the revocation public key from the revocation base point and the
/// commitment point:
///
/// `rev_base * SHA256(rev_base || commit) + commit * SHA256(commit || rev_base)`
pub fn derive_revocation_pubkey(
    secp: &Secp256k1<All>,
    revocation_base: &PublicKey,
    commit_point: &PublicKey,
) -> SweepResult<PublicKey> {
    let rev_append_commit = {
        let mut engine = sha256::Hash::engine();
        engine.input(&revocation_base.serialize());
        engine.input(&commit_point.serialize());
        sha256::Hash::from_engine(engine).to_byte_array()
    };
    let commit_append_rev = {
        let mut engine = sha256::Hash::engine();
        engine.input(&commit_point.serialize());
        engine.input(&revocation_base.serialize());
        sha256::Hash::from_engine(engine).to_byte_array()
    };

    let scalar_a = Scalar::from_be_bytes(rev_append_commit)
        .map_err(|_| SweepError::key_parse("revocation tweak out of curve order"))?;
    let scalar_b = Scalar::from_be_bytes(commit_append_rev)
        .map_err(|_| SweepError::key_parse("revocation tweak out of curve order"))?;

    let part_a = revocation_base.mul_tweak(secp, &scalar_a)?;
    let part_b = commit_point.mul_tweak(secp, &scalar_b)?;
    Ok(part_a.combine(&part_b)?)
}

/// Resolves key locators from the channel records against the master key
pub struct KeyRing {
    secp: Secp256k1<All>,
    master: Xpriv,
}

impl KeyRing {
    pub fn new(master: Xpriv) -> Self {
        Self {
            secp: Secp256k1::new(),
            master,
        }
    }

    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    /// Network implied by the master key's version bytes
    pub fn network(&self) -> Network {
        match self.master.network {
            NetworkKind::Main => Network::Bitcoin,
            NetworkKind::Test => Network::Testnet,
        }
    }

    fn coin_type(&self) -> u32 {
        match self.master.network {
            NetworkKind::Main => 0,
            NetworkKind::Test => 1,
        }
    }

    /// Fetch the private key for a key locator via
    /// `m/1017'/coin_type'/family'/0/index`
    pub fn fetch_priv_key(&self, locator: &BasePoint) -> SweepResult<SecretKey> {
        let path = DerivationPath::from(vec![
            ChildNumber::from_hardened_idx(KEYCHAIN_PURPOSE)?,
            ChildNumber::from_hardened_idx(self.coin_type())?,
            ChildNumber::from_hardened_idx(u32::from(locator.family))?,
            ChildNumber::from_normal_idx(0)?,
            ChildNumber::from_normal_idx(locator.index)?,
        ]);
        let derived = self.master.derive_priv(&self.secp, &path)?;
        Ok(derived.private_key)
    }
}

/// The keys needed to rebuild and spend one delayed commitment output
pub struct SweepKeys {
    /// Private key behind the delay base point
    pub delay_base_secret: SecretKey,
    /// Delay base point (public side of `delay_base_secret`)
    pub delay_base: PublicKey,
    /// Commitment-tweaked delayed-payment key, a script parameter
    pub tweaked_delay: PublicKey,
    /// Revocation key, the other script parameter
    pub revocation: PublicKey,
    /// Tweak bytes to re-apply on the private key at signing time
    pub single_tweak: [u8; 32],
}

/// Derive all keys for one force-close record (§ commitment state)
pub fn derive_sweep_keys(keyring: &KeyRing, force_close: &ForceClose) -> SweepResult<SweepKeys> {
    let commit_point = pubkey_from_hex(&force_close.commit_point)?;
    let revocation_base = pubkey_from_hex(&force_close.revocation_base_point.pubkey)?;

    let delay_base_secret = keyring.fetch_priv_key(&force_close.delay_base_point)?;
    let delay_base = PublicKey::from_secret_key(keyring.secp(), &delay_base_secret);

    let single_tweak = single_tweak_bytes(&commit_point, &delay_base);
    let tweaked_delay = tweak_pubkey(keyring.secp(), &delay_base, &commit_point)?;
    let revocation = derive_revocation_pubkey(keyring.secp(), &revocation_base, &commit_point)?;

    Ok(SweepKeys {
        delay_base_secret,
        delay_base,
        tweaked_delay,
        revocation,
        single_tweak,
    })
}
