//! Flat persistent schema for identity records.
//!
//! Every record carries the columns of both identity variants so the
//! `identity` table stays uniform; the columns of the unused variant hold
//! empty placeholders. Secret columns (`private_key`,
//! `serialized_identity`) only ever hold sealed ciphertext.
//!
//! Record format (JSON, schema version 2):
//! ```json
//! {
//!     "type": "keypair" | "group",
//!     "address": "0x…",
//!     "nonce": 0,
//!     "public_key": "",
//!     "private_key": "",
//!     "provider": "",
//!     "name": "",
//!     "identity_path": null,
//!     "identity_commitment": "",
//!     "serialized_identity": ""
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::{GroupIdentity, Identity, IdentityKind, IdentityPath, KeypairIdentity};

/// Composite primary key: (`public_key`, `identity_commitment`).
///
/// A keypair record leaves the commitment half empty and a group record
/// leaves the public-key half empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub public_key: String,
    pub identity_commitment: String,
}

/// One row of the `identity` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(rename = "type")]
    pub kind: IdentityKind,
    pub address: String,
    pub nonce: u64,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "path_or_empty")]
    pub identity_path: Option<IdentityPath>,
    #[serde(default)]
    pub identity_commitment: String,
    #[serde(default)]
    pub serialized_identity: String,
}

impl IdentityRecord {
    /// Map an identity to its storage row.
    ///
    /// The identity's secret field is copied verbatim, so callers must seal
    /// it before building the record.
    pub fn from_identity(identity: &Identity) -> Self {
        match identity {
            Identity::Keypair(id) => Self {
                kind: IdentityKind::Keypair,
                address: id.address.clone(),
                nonce: id.nonce,
                public_key: id.public_key.clone(),
                private_key: id.private_key.clone(),
                provider: String::new(),
                name: String::new(),
                identity_path: None,
                identity_commitment: String::new(),
                serialized_identity: String::new(),
            },
            Identity::Group(id) => Self {
                kind: IdentityKind::Group,
                address: id.address.clone(),
                nonce: id.nonce,
                public_key: String::new(),
                private_key: String::new(),
                provider: id.provider.clone(),
                name: id.name.clone(),
                identity_path: id.identity_path.clone(),
                identity_commitment: id.identity_commitment.clone(),
                serialized_identity: id.serialized_identity.clone(),
            },
        }
    }

    /// Map a storage row back to the public identity shape. Placeholder
    /// columns of the unused variant are dropped; secrets stay as stored.
    pub fn into_identity(self) -> Identity {
        match self.kind {
            IdentityKind::Keypair => Identity::Keypair(KeypairIdentity {
                address: self.address,
                nonce: self.nonce,
                public_key: self.public_key,
                private_key: self.private_key,
            }),
            IdentityKind::Group => Identity::Group(GroupIdentity {
                address: self.address,
                nonce: self.nonce,
                provider: self.provider,
                name: self.name,
                identity_commitment: self.identity_commitment,
                identity_path: self.identity_path,
                serialized_identity: self.serialized_identity,
            }),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            public_key: self.public_key.clone(),
            identity_commitment: self.identity_commitment.clone(),
        }
    }
}

/// A keypair row from the version 1 schema, which predates group
/// identities and was keyed by `public_key` alone.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRecordV1 {
    pub address: String,
    pub nonce: u64,
    pub public_key: String,
    pub private_key: String,
}

impl From<LegacyRecordV1> for IdentityRecord {
    fn from(old: LegacyRecordV1) -> Self {
        Self {
            kind: IdentityKind::Keypair,
            address: old.address,
            nonce: old.nonce,
            public_key: old.public_key,
            private_key: old.private_key,
            provider: String::new(),
            name: String::new(),
            identity_path: None,
            identity_commitment: String::new(),
            serialized_identity: String::new(),
        }
    }
}

/// Accept `null`, the empty-string placeholder, or a structured path.
fn path_or_empty<'de, D>(deserializer: D) -> std::result::Result<Option<IdentityPath>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StoredPath {
        Path(IdentityPath),
        Placeholder(String),
    }

    match Option::<StoredPath>::deserialize(deserializer)? {
        Some(StoredPath::Path(path)) => Ok(Some(path)),
        Some(StoredPath::Placeholder(s)) if s.is_empty() => Ok(None),
        Some(StoredPath::Placeholder(s)) => Err(serde::de::Error::custom(format!(
            "identity_path: unexpected string '{s}'"
        ))),
        None => Ok(None),
    }
}
