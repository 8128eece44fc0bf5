//! In-memory identity model.
//!
//! An [`Identity`] is either a [`KeypairIdentity`] (a public/private key
//! pair) or a [`GroupIdentity`] (membership in a zero-knowledge group).
//! The two variants share only `address` and `nonce`; the flat storage
//! layout with empty placeholder columns lives in [`crate::storage::record`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::keys::Ed25519KeyPair;
use crate::error::{Result, VaultError};

/// Variant tag, as written to the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Keypair,
    Group,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keypair => "keypair",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKind {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keypair" => Ok(Self::Keypair),
            "group" => Ok(Self::Group),
            other => Err(VaultError::Validation(format!("type: unknown '{other}'"))),
        }
    }
}

/// Merkle membership proof for a group identity.
///
/// Opaque to the vault: it is stored and returned but never verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPath {
    /// Sibling hashes from leaf to root.
    pub path_elements: Vec<String>,
    /// Left/right direction bits, one per sibling.
    pub path_index: Vec<u8>,
    /// Merkle root the path resolves to.
    pub root: String,
}

impl IdentityPath {
    /// Check the structural shape of the proof.
    pub fn validate(&self) -> Result<()> {
        if self.path_elements.is_empty() {
            return Err(VaultError::Validation(
                "identityPath: no path elements".to_string(),
            ));
        }
        if self.path_elements.len() != self.path_index.len() {
            return Err(VaultError::Validation(format!(
                "identityPath: {} elements but {} index bits",
                self.path_elements.len(),
                self.path_index.len()
            )));
        }
        if self.path_index.iter().any(|bit| *bit > 1) {
            return Err(VaultError::Validation(
                "identityPath: index bits must be 0 or 1".to_string(),
            ));
        }
        if self.root.is_empty() {
            return Err(VaultError::Validation("identityPath.root".to_string()));
        }
        Ok(())
    }
}

/// A public/private key pair identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypairIdentity {
    pub address: String,
    pub nonce: u64,
    pub public_key: String,
    /// Plaintext only while held as the current identity; ciphertext
    /// when read back from the store.
    pub private_key: String,
}

impl KeypairIdentity {
    /// Create a keypair identity around a freshly generated Ed25519 key.
    pub fn generate(address: impl Into<String>, nonce: u64) -> Self {
        let kp = Ed25519KeyPair::generate();
        Self {
            address: address.into(),
            nonce,
            public_key: kp.public_key_hex(),
            private_key: kp.private_key_hex().to_string(),
        }
    }
}

impl fmt::Debug for KeypairIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairIdentity")
            .field("address", &self.address)
            .field("nonce", &self.nonce)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A zero-knowledge group membership identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupIdentity {
    pub address: String,
    pub nonce: u64,
    /// Group provider, e.g. the social platform the membership derives from.
    pub provider: String,
    /// Group name within the provider.
    pub name: String,
    pub identity_commitment: String,
    pub identity_path: Option<IdentityPath>,
    /// Plaintext only while held as the current identity; ciphertext
    /// when read back from the store.
    pub serialized_identity: String,
}

impl fmt::Debug for GroupIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupIdentity")
            .field("address", &self.address)
            .field("nonce", &self.nonce)
            .field("provider", &self.provider)
            .field("name", &self.name)
            .field("identity_commitment", &self.identity_commitment)
            .field("identity_path", &self.identity_path)
            .field("serialized_identity", &"<redacted>")
            .finish()
    }
}

/// A stored credential: either a keypair or a group membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Identity {
    Keypair(KeypairIdentity),
    Group(GroupIdentity),
}

impl Identity {
    pub fn kind(&self) -> IdentityKind {
        match self {
            Self::Keypair(_) => IdentityKind::Keypair,
            Self::Group(_) => IdentityKind::Group,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            Self::Keypair(id) => &id.address,
            Self::Group(id) => &id.address,
        }
    }

    pub fn nonce(&self) -> u64 {
        match self {
            Self::Keypair(id) => id.nonce,
            Self::Group(id) => id.nonce,
        }
    }

    /// The value used to select this identity: the public key of a keypair
    /// or the commitment of a group identity.
    pub fn lookup_key(&self) -> &str {
        match self {
            Self::Keypair(id) => &id.public_key,
            Self::Group(id) => &id.identity_commitment,
        }
    }

    /// The variant's secret field, in whatever form it is currently held.
    pub fn secret(&self) -> &str {
        match self {
            Self::Keypair(id) => &id.private_key,
            Self::Group(id) => &id.serialized_identity,
        }
    }

    /// Return a copy with the secret field replaced.
    pub fn with_secret(&self, secret: String) -> Self {
        match self {
            Self::Keypair(id) => Self::Keypair(KeypairIdentity {
                private_key: secret,
                ..id.clone()
            }),
            Self::Group(id) => Self::Group(GroupIdentity {
                serialized_identity: secret,
                ..id.clone()
            }),
        }
    }

    /// Overwrite the secret field in memory and leave it empty.
    pub fn zeroize_secret(&mut self) {
        match self {
            Self::Keypair(id) => id.private_key.zeroize(),
            Self::Group(id) => id.serialized_identity.zeroize(),
        }
    }

    /// Check that every required field of the variant is populated.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Validation` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        fn require(value: &str, field: &str) -> Result<()> {
            if value.trim().is_empty() {
                Err(VaultError::Validation(field.to_string()))
            } else {
                Ok(())
            }
        }

        require(self.address(), "address")?;
        match self {
            Self::Keypair(id) => {
                require(&id.public_key, "publicKey")?;
                require(&id.private_key, "privateKey")?;
            }
            Self::Group(id) => {
                require(&id.provider, "provider")?;
                require(&id.name, "name")?;
                require(&id.identity_commitment, "identityCommitment")?;
                require(&id.serialized_identity, "serializedIdentity")?;
                if let Some(path) = &id.identity_path {
                    path.validate()?;
                }
            }
        }
        Ok(())
    }
}

impl From<KeypairIdentity> for Identity {
    fn from(id: KeypairIdentity) -> Self {
        Self::Keypair(id)
    }
}

impl From<GroupIdentity> for Identity {
    fn from(id: GroupIdentity) -> Self {
        Self::Group(id)
    }
}
