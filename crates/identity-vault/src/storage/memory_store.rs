//! Volatile identity store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, VaultError};
use crate::storage::record::IdentityRecord;
use crate::storage::table::IdentityTable;
use crate::storage::IdentityStore;

/// In-memory [`IdentityStore`]. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    table: RwLock<Option<IdentityTable>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn open(&self) -> Result<()> {
        let mut table = self.table.write().await;
        if table.is_none() {
            *table = Some(IdentityTable::new());
        }
        Ok(())
    }

    async fn is_open(&self) -> bool {
        self.table.read().await.is_some()
    }

    async fn put(&self, record: IdentityRecord) -> Result<()> {
        let mut guard = self.table.write().await;
        let table = guard.as_mut().ok_or(VaultError::NotInitialized)?;
        table.put(record);
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
