//! Ed25519 key pair generation for new keypair identities.
//!
//! Keys are exchanged with the rest of the vault as lowercase hex strings,
//! which is the form they take in the `public_key` / `private_key` columns.

use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, VaultError};

/// An Ed25519 key pair.
///
/// The signing key bytes are zeroized on drop.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from a hex-encoded 32-byte signing key.
    pub fn from_private_hex(private_hex: &str) -> Result<Self> {
        let mut bytes = hex::decode(private_hex.trim())
            .map_err(|e| VaultError::InvalidKey(format!("private key hex: {e}")))?;
        let mut key_bytes: [u8; 32] = match bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => {
                bytes.zeroize();
                return Err(VaultError::InvalidKey(
                    "private key must be 32 bytes".to_string(),
                ));
            }
        };
        bytes.zeroize();

        let signing_key = SigningKey::from_bytes(&key_bytes);
        key_bytes.zeroize();
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Return the public key as lowercase hex.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.to_bytes())
    }

    /// Return the private key as lowercase hex.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        let mut bytes = self.signing_key.to_bytes();
        let encoded = Zeroizing::new(hex::encode(bytes));
        bytes.zeroize();
        encoded
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
