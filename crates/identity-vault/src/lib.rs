//! identity-vault: passphrase-locked store for cryptographic identities.
//!
//! Holds keypair identities and zero-knowledge group identities side by
//! side, keeps their secret material sealed at rest, and gates addition
//! and selection behind a lock/unlock state machine.

pub mod broadcast;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod service;
pub mod storage;

// Re-export primary types
pub use broadcast::{ChannelBroadcaster, NoopBroadcaster, StateBroadcaster, StateEvent};
pub use config::VaultConfig;
pub use crypto::KdfParams;
pub use error::{Result, VaultError};
pub use identity::{GroupIdentity, Identity, IdentityKind, IdentityPath, KeypairIdentity};
pub use service::{IdentityService, IdentityStatus};
pub use storage::{
    FileIdentityStore, IdentityRecord, IdentityStore, MemoryIdentityStore, RecordKey,
};
