//! In-memory `identity` table shared by every store backend.
//!
//! Rows are held in primary-key order. The `by_address` secondary index is
//! non-unique; a lookup returns the row with the smallest primary key among
//! those sharing the address.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::storage::record::{IdentityRecord, RecordKey};

#[derive(Debug, Clone, Default)]
pub struct IdentityTable {
    /// Primary store: composite key → row.
    rows: BTreeMap<RecordKey, IdentityRecord>,
    /// Secondary index: address → keys of rows with that address.
    by_address: HashMap<String, BTreeSet<RecordKey>>,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows; later rows overwrite earlier ones with the
    /// same primary key.
    pub fn from_records(records: impl IntoIterator<Item = IdentityRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.put(record);
        }
        table
    }

    /// Insert or overwrite a row. Returns the row previously stored under
    /// the same primary key, if any.
    pub fn put(&mut self, record: IdentityRecord) -> Option<IdentityRecord> {
        let key = record.key();
        let previous = self.rows.insert(key.clone(), record.clone());

        if let Some(old) = &previous {
            if old.address != record.address {
                if let Some(keys) = self.by_address.get_mut(&old.address) {
                    keys.remove(&key);
                    if keys.is_empty() {
                        self.by_address.remove(&old.address);
                    }
                }
            }
        }
        self.by_address
            .entry(record.address)
            .or_default()
            .insert(key);

        previous
    }

    /// Full scan in primary-key order.
    pub fn all(&self) -> Vec<IdentityRecord> {
        self.rows.values().cloned().collect()
    }

    /// First row with `address`, or `None`.
    pub fn by_address(&self, address: &str) -> Option<IdentityRecord> {
        self.by_address
            .get(address)
            .and_then(|keys| keys.iter().next())
            .and_then(|key| self.rows.get(key))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
