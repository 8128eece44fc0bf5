//! File-backed identity store.
//!
//! The whole `identity` table is kept in one JSON file and mirrored in
//! memory after [`open`](IdentityStore::open). Every `put` rewrites the file
//! atomically before the in-memory table is updated, so a failed write
//! leaves both unchanged.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 2,
//!     "format": "identity-store",
//!     "table": "identity",
//!     "records": [ { ... IdentityRecord ... } ]
//! }
//! ```
//!
//! Version 1 files hold keypair rows only (`address`, `nonce`,
//! `public_key`, `private_key`). They are upgraded in place on open.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Result, VaultError};
use crate::storage::record::{IdentityRecord, LegacyRecordV1};
use crate::storage::table::IdentityTable;
use crate::storage::{IdentityStore, SCHEMA_VERSION};

// ── File format constants ─────────────────────────────────────────────────────

const STORE_FORMAT: &str = "identity-store";
const STORE_TABLE: &str = "identity";

// ── On-disk structures ────────────────────────────────────────────────────────

/// Enough of the file to decide how to parse the rest.
#[derive(Debug, Deserialize)]
struct StoreHeader {
    version: u32,
}

/// Top-level structure of a version 2 store file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    format: String,
    table: String,
    records: Vec<IdentityRecord>,
}

/// Top-level structure of a version 1 store file.
#[derive(Debug, Deserialize)]
struct StoreFileV1 {
    records: Vec<LegacyRecordV1>,
}

// ── FileIdentityStore ─────────────────────────────────────────────────────────

/// [`IdentityStore`] persisted to a single JSON file.
///
/// Safe for single-process use; concurrent writers in other processes are
/// not coordinated.
#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
    table: RwLock<Option<IdentityTable>>,
}

impl FileIdentityStore {
    /// Create a store for `path`. Nothing is read until `open`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<IdentityTable> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("creating identity store at {}", self.path.display());
                let table = IdentityTable::new();
                self.persist(&table).await?;
                return Ok(table);
            }
            Err(e) => return Err(e.into()),
        };

        let header: StoreHeader = serde_json::from_slice(&bytes).map_err(|e| {
            VaultError::InvalidFileFormat(format!(
                "failed to parse store file {}: {e}",
                self.path.display()
            ))
        })?;

        match header.version {
            1 => {
                let old: StoreFileV1 = serde_json::from_slice(&bytes).map_err(|e| {
                    VaultError::InvalidFileFormat(format!("version 1 store: {e}"))
                })?;
                let table =
                    IdentityTable::from_records(old.records.into_iter().map(IdentityRecord::from));
                self.persist(&table).await?;
                log::info!(
                    "migrated identity store {} from version 1 to {SCHEMA_VERSION} ({} records)",
                    self.path.display(),
                    table.len()
                );
                Ok(table)
            }
            SCHEMA_VERSION => {
                let file: StoreFile = serde_json::from_slice(&bytes).map_err(|e| {
                    VaultError::InvalidFileFormat(format!(
                        "failed to parse store file {}: {e}",
                        self.path.display()
                    ))
                })?;
                if file.format != STORE_FORMAT || file.table != STORE_TABLE {
                    return Err(VaultError::InvalidFileFormat(format!(
                        "unexpected format={} table={}",
                        file.format, file.table
                    )));
                }
                Ok(IdentityTable::from_records(file.records))
            }
            other => Err(VaultError::UnsupportedVersion(other)),
        }
    }

    async fn persist(&self, table: &IdentityTable) -> Result<()> {
        let file = StoreFile {
            version: SCHEMA_VERSION,
            format: STORE_FORMAT.to_string(),
            table: STORE_TABLE.to_string(),
            records: table.all(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;
        write_atomic(&self.path, &json).await
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn open(&self) -> Result<()> {
        let mut guard = self.table.write().await;
        if guard.is_none() {
            let table = self.load().await?;
            log::debug!(
                "opened identity store {} with {} records",
                self.path.display(),
                table.len()
            );
            *guard = Some(table);
        }
        Ok(())
    }

    async fn is_open(&self) -> bool {
        self.table.read().await.is_some()
    }

    async fn put(&self, record: IdentityRecord) -> Result<()> {
        let mut guard = self.table.write().await;
        let table = guard.as_mut().ok_or(VaultError::NotInitialized)?;

        let mut next = table.clone();
        next.put(record);
        self.persist(&next).await?;
        *table = next;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<IdentityRecord>> {
        let guard = self.table.read().await;
        let table = guard.as_ref().ok_or(VaultError::NotInitialized)?;
        Ok(table.all())
    }

    async fn get_by_address(&self, address: &str) -> Result<Option<IdentityRecord>> {
        let guard = self.table.read().await;
        let table = guard.as_ref().ok_or(VaultError::NotInitialized)?;
        Ok(table.by_address(address))
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Write `data` to `path` through a sibling temp file and rename, creating
/// the parent directory if needed.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, data).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
