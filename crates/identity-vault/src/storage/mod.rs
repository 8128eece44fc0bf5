//! Storage layer for identity records.
//!
//! The vault persists identities in a single versioned `identity` table
//! with a composite primary key (`public_key`, `identity_commitment`) and a
//! non-unique secondary index on `address`.
//!
//! # Backends
//!
//! - [`file_store`]: JSON file on disk, atomic writes, schema migration.
//! - [`memory_store`]: volatile table for tests and embedding.
//!
//! Both backends share [`table::IdentityTable`] and must be opened with
//! [`IdentityStore::open`] before use; any other call on an unopened store
//! fails with `VaultError::NotInitialized`.

pub mod file_store;
pub mod memory_store;
pub mod record;
pub mod table;

use async_trait::async_trait;

use crate::error::{Result, VaultError};

pub use file_store::FileIdentityStore;
pub use memory_store::MemoryIdentityStore;
pub use record::{IdentityRecord, RecordKey};

/// Current schema version of the `identity` table.
pub const SCHEMA_VERSION: u32 = 2;

/// Keyed, versioned storage for identity records.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Open or create the store. Calling it again on an open store is a
    /// no-op.
    async fn open(&self) -> Result<()>;

    /// Whether [`open`](Self::open) has completed.
    async fn is_open(&self) -> bool;

    /// Insert or overwrite a record by its composite primary key.
    async fn put(&self, record: IdentityRecord) -> Result<()>;

    /// Every stored record.
    async fn get_all(&self) -> Result<Vec<IdentityRecord>>;

    /// The first record with `address`, or `None`.
    async fn get_by_address(&self, address: &str) -> Result<Option<IdentityRecord>>;

    /// Fail with `NotInitialized` unless the store is open.
    async fn ensure_open(&self) -> Result<()> {
        if self.is_open().await {
            Ok(())
        } else {
            Err(VaultError::NotInitialized)
        }
    }
}
