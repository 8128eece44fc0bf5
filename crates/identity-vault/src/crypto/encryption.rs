//! Passphrase encryption of secret identity fields.
//!
//! Secret fields (keypair private keys, serialized group identities) are
//! sealed with ChaCha20-Poly1305 under a key derived from the user
//! passphrase: Argon2id stretches the passphrase into a master key and
//! HKDF-SHA256 expands it into the field encryption key.
//!
//! The sealed value is a compact JSON envelope stored as a plain string
//! column:
//! ```json
//! {
//!     "v": 1,
//!     "alg": "chacha20-poly1305",
//!     "kdf": "argon2id",
//!     "params": { "m_cost": 65536, "t_cost": 3, "p_cost": 4 },
//!     "salt": "<base64-16-bytes>",
//!     "nonce": "<base64-12-bytes>",
//!     "ct": "<base64-ciphertext>"
//! }
//! ```
//!
//! Each call uses a fresh salt and nonce, so sealing the same plaintext
//! twice produces different envelopes. The KDF parameters travel with the
//! envelope so a vault configured with cheaper or stronger parameters can
//! still open older values.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::random::{random_nonce_12, random_salt_16};
use crate::error::{Result, VaultError};

// ── Envelope constants ────────────────────────────────────────────────────────

const SEALED_VERSION: u32 = 1;
const SEALED_ALGORITHM: &str = "chacha20-poly1305";
const SEALED_KDF: &str = "argon2id";

/// HKDF context for the field encryption key. Must remain stable across
/// versions or previously sealed values become unreadable.
const FIELD_ENCRYPTION_CONTEXT: &str = "identity-vault/secret-field";

/// Upper bound on the Argon2 memory cost accepted from an envelope (1 GiB).
const MAX_M_COST: u32 = 1 << 20;

/// Upper bound on the Argon2 iteration count accepted from an envelope.
const MAX_T_COST: u32 = 64;

// ── KDF parameters ────────────────────────────────────────────────────────────

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of iterations.
    pub t_cost: u32,
    /// Parallel lanes.
    pub p_cost: u32,
}

impl KdfParams {
    /// Minimal-cost parameters. Only suitable for tests and benchmarks.
    pub fn fast() -> Self {
        Self {
            m_cost: 1024,
            t_cost: 1,
            p_cost: 1,
        }
    }
}

impl Default for KdfParams {
    /// 64 MiB, 3 iterations, 4 lanes.
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// A sealed secret as it is written to durable storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedSecret {
    /// Envelope version.
    pub v: u32,
    /// Symmetric cipher used.
    pub alg: String,
    /// Key derivation function used.
    pub kdf: String,
    /// KDF cost parameters used for this value.
    pub params: KdfParams,
    /// Base64-encoded Argon2id salt (16 bytes).
    pub salt: String,
    /// Base64-encoded ChaCha20-Poly1305 nonce (12 bytes).
    pub nonce: String,
    /// Base64-encoded ciphertext including the Poly1305 tag.
    pub ct: String,
}

impl SealedSecret {
    /// Parse an envelope from its stored string form.
    pub fn parse(ciphertext: &str) -> Result<Self> {
        let sealed: SealedSecret = serde_json::from_str(ciphertext)
            .map_err(|e| VaultError::InvalidFileFormat(format!("sealed secret: {e}")))?;

        if sealed.v != SEALED_VERSION || sealed.alg != SEALED_ALGORITHM || sealed.kdf != SEALED_KDF
        {
            return Err(VaultError::InvalidFileFormat(format!(
                "unsupported sealed secret v={} alg={} kdf={}",
                sealed.v, sealed.alg, sealed.kdf
            )));
        }
        if sealed.params.m_cost > MAX_M_COST {
            return Err(VaultError::InvalidFileFormat(format!(
                "argon2 memory cost too large: {}",
                sealed.params.m_cost
            )));
        }
        if sealed.params.t_cost > MAX_T_COST {
            return Err(VaultError::InvalidFileFormat(format!(
                "argon2 iteration count too large: {}",
                sealed.params.t_cost
            )));
        }

        Ok(sealed)
    }
}

// ── Key derivation ────────────────────────────────────────────────────────────

/// Derive the 32-byte field encryption key from a passphrase and salt.
///
/// passphrase → Argon2id(passphrase, salt) → master key →
/// HKDF-SHA256(master key, context) → field key
pub fn derive_field_key(
    passphrase: &[u8],
    salt: &[u8; 16],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>> {
    let argon_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| VaultError::DerivationFailed(format!("Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut master = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, &mut master[..])
        .map_err(|e| VaultError::DerivationFailed(format!("Argon2 hash: {e}")))?;

    let hk = Hkdf::<Sha256>::new(None, &master[..]);
    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(FIELD_ENCRYPTION_CONTEXT.as_bytes(), &mut key[..])
        .map_err(|e| VaultError::DerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(key)
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Seal `plaintext` under `passphrase` using the default KDF parameters.
pub fn encrypt(plaintext: &str, passphrase: &str) -> Result<String> {
    encrypt_with(plaintext, passphrase, &KdfParams::default())
}

/// Seal `plaintext` under `passphrase` using explicit KDF parameters.
///
/// # Errors
///
/// Returns `VaultError::DerivationFailed` for invalid KDF parameters or
/// `VaultError::EncryptionFailed` if the cipher rejects the input.
pub fn encrypt_with(plaintext: &str, passphrase: &str, params: &KdfParams) -> Result<String> {
    let salt = random_salt_16();
    let nonce_bytes = random_nonce_12();
    let key = derive_field_key(passphrase.as_bytes(), &salt, params)?;

    let cipher = ChaCha20Poly1305::new_from_slice(&key[..])
        .map_err(|e| VaultError::EncryptionFailed(format!("cipher init: {e}")))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("encrypt: {e}")))?;

    let sealed = SealedSecret {
        v: SEALED_VERSION,
        alg: SEALED_ALGORITHM.to_string(),
        kdf: SEALED_KDF.to_string(),
        params: *params,
        salt: B64.encode(salt),
        nonce: B64.encode(nonce_bytes),
        ct: B64.encode(&ciphertext),
    };

    serde_json::to_string(&sealed).map_err(|e| VaultError::SerializationError(e.to_string()))
}

/// Open a sealed secret with `passphrase`.
///
/// Decrypting a sealed empty string succeeds and returns `""`; every
/// failure is an `Err`, so the two cases are never confused.
///
/// # Errors
///
/// Returns `VaultError::InvalidPassphrase` when AEAD authentication fails
/// (wrong passphrase or tampered ciphertext), `VaultError::InvalidFileFormat`
/// when the envelope cannot be parsed, or `VaultError::DecryptionFailed`
/// when the plaintext is not UTF-8.
pub fn decrypt(ciphertext: &str, passphrase: &str) -> Result<String> {
    let sealed = SealedSecret::parse(ciphertext)?;

    let salt: [u8; 16] = B64
        .decode(&sealed.salt)
        .map_err(|e| VaultError::InvalidFileFormat(format!("invalid salt base64: {e}")))?
        .try_into()
        .map_err(|_| VaultError::InvalidFileFormat("salt must be 16 bytes".to_string()))?;
    let nonce_bytes: [u8; 12] = B64
        .decode(&sealed.nonce)
        .map_err(|e| VaultError::InvalidFileFormat(format!("invalid nonce base64: {e}")))?
        .try_into()
        .map_err(|_| VaultError::InvalidFileFormat("nonce must be 12 bytes".to_string()))?;
    let ct = B64
        .decode(&sealed.ct)
        .map_err(|e| VaultError::InvalidFileFormat(format!("invalid ciphertext base64: {e}")))?;

    let key = derive_field_key(passphrase.as_bytes(), &salt, &sealed.params)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key[..])
        .map_err(|e| VaultError::DecryptionFailed(format!("cipher init: {e}")))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ct.as_slice())
        .map_err(|_| VaultError::InvalidPassphrase)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        VaultError::DecryptionFailed("plaintext is not valid UTF-8".to_string())
    })
}

/// Lenient form of [`decrypt`]: any failure is reported as "no value".
///
/// Used where a missing or malformed secret should degrade to an empty
/// field rather than abort the caller.
pub fn try_decrypt(ciphertext: &str, passphrase: &str) -> Option<String> {
    match decrypt(ciphertext, passphrase) {
        Ok(plaintext) => Some(plaintext),
        Err(VaultError::InvalidPassphrase) => None,
        Err(e) => {
            log::warn!("treating undecodable secret as absent: {e}");
            None
        }
    }
}
