//! The identity service: lock state, selection and addition.
//!
//! [`IdentityService`] owns the in-memory passphrase and the current
//! identity. It is Locked until [`set_passphrase`](IdentityService::set_passphrase)
//! succeeds and returns to Locked when the current identity is cleared with
//! `set_identity(None)`.
//!
//! Secrets cross the encryption boundary only here: they are sealed before
//! a record is handed to the store, and opened only when an identity is
//! promoted to the current identity. Identities returned from
//! [`get_identities`](IdentityService::get_identities) and
//! [`get_identity_by_address`](IdentityService::get_identity_by_address)
//! carry their secrets exactly as stored.

use serde::Serialize;
use zeroize::Zeroizing;

use crate::broadcast::StateBroadcaster;
use crate::config::VaultConfig;
use crate::crypto::encryption::{encrypt_with, try_decrypt, KdfParams};
use crate::error::{Result, VaultError};
use crate::identity::{Identity, IdentityKind};
use crate::storage::{FileIdentityStore, IdentityRecord, IdentityStore};

/// Snapshot returned by [`IdentityService::get_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStatus {
    pub unlocked: bool,
    pub current_identity: Option<Identity>,
}

/// Orchestrates the identity store, the passphrase, and the current
/// identity. One instance is expected per application session.
pub struct IdentityService<S, B> {
    store: S,
    broadcaster: B,
    kdf: KdfParams,
    passphrase: Option<Zeroizing<String>>,
    current_identity: Option<Identity>,
}

impl<S, B> IdentityService<S, B>
where
    S: IdentityStore,
    B: StateBroadcaster,
{
    /// Create a Locked service. Call [`start`](Self::start) before use.
    pub fn new(store: S, broadcaster: B) -> Self {
        Self {
            store,
            broadcaster,
            kdf: KdfParams::default(),
            passphrase: None,
            current_identity: None,
        }
    }

    /// Use `kdf` when sealing new secrets.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Open the underlying store.
    pub async fn start(&self) -> Result<()> {
        self.store.open().await
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    pub fn is_unlocked(&self) -> bool {
        self.passphrase.is_some()
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.current_identity.as_ref()
    }

    /// Lock state and current identity.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotInitialized` if the store is not open.
    pub async fn get_status(&self) -> Result<IdentityStatus> {
        self.store.ensure_open().await?;
        Ok(IdentityStatus {
            unlocked: self.is_unlocked(),
            current_identity: self.current_identity.clone(),
        })
    }

    /// Unlock the vault with `passphrase`.
    ///
    /// Every stored keypair identity must open to a non-empty private key
    /// under `passphrase`. With no keypairs stored, any non-empty passphrase
    /// is accepted and becomes the passphrase new secrets are sealed with.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::InvalidPassphrase` if the passphrase is empty or
    /// any stored keypair fails to open; the vault stays Locked.
    pub async fn set_passphrase(&mut self, passphrase: &str) -> Result<()> {
        self.store.ensure_open().await?;
        if passphrase.is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }

        let passphrase = Zeroizing::new(passphrase.to_string());
        let records = self.store.get_all().await?;
        for record in records.iter().filter(|r| r.kind == IdentityKind::Keypair) {
            let opened = open_secret(record.private_key.clone(), &passphrase).await?;
            if !matches!(opened, Some(plaintext) if !plaintext.is_empty()) {
                log::warn!(
                    "passphrase rejected: keypair {} did not open",
                    record.public_key
                );
                return Err(VaultError::InvalidPassphrase);
            }
        }

        self.passphrase = Some(passphrase);
        log::info!("identity vault unlocked");
        self.broadcaster.unlocked_changed(true).await;
        Ok(())
    }

    /// Replace the current identity. No decryption is performed.
    ///
    /// Passing `None` also forgets the passphrase and locks the vault.
    pub async fn set_identity(&mut self, identity: Option<Identity>) {
        let locking = identity.is_none();
        self.replace_current(identity);
        self.broadcaster
            .selected_identity_changed(self.current_identity.clone())
            .await;

        if locking {
            self.passphrase = None;
            log::info!("identity vault locked");
            self.broadcaster.unlocked_changed(false).await;
        }
    }

    /// Make the identity with public key or commitment `key` current,
    /// opening its secret with the held passphrase.
    ///
    /// While Locked the identity is still selected but its secret is empty.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotFound` if no stored identity matches.
    pub async fn select_identity(&mut self, key: &str) -> Result<Identity> {
        self.store.ensure_open().await?;

        let stored = self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(IdentityRecord::into_identity)
            .find(|id| id.lookup_key() == key)
            .ok_or_else(|| VaultError::NotFound(key.to_string()))?;

        let identity = self.reveal(&stored).await?;
        log::debug!("selected {} identity {}", identity.kind(), key);

        self.replace_current(Some(identity.clone()));
        self.broadcaster
            .selected_identity_changed(self.current_identity.clone())
            .await;
        Ok(identity)
    }

    /// Seal and persist a new identity, or overwrite one with the same
    /// public key / commitment.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Locked` while Locked, `VaultError::Validation`
    /// naming the first missing field, or any store error. Nothing is
    /// persisted on failure.
    pub async fn add_identity(&mut self, identity: Identity) -> Result<()> {
        self.store.ensure_open().await?;
        let passphrase = self.passphrase.clone().ok_or(VaultError::Locked)?;
        identity.validate()?;

        let plaintext = Zeroizing::new(identity.secret().to_string());
        let sealed = seal_secret(plaintext, passphrase, self.kdf).await?;
        let record = IdentityRecord::from_identity(&identity.with_secret(sealed));
        self.store.put(record).await?;
        log::info!(
            "added {} identity {} for {}",
            identity.kind(),
            identity.lookup_key(),
            identity.address()
        );

        let identities = self.get_identities().await?;
        self.broadcaster.identities_changed(identities).await;
        Ok(())
    }

    /// The first stored identity with `address`, secrets as stored.
    pub async fn get_identity_by_address(&self, address: &str) -> Result<Option<Identity>> {
        self.store.ensure_open().await?;
        let found = self.store.get_by_address(address).await?;
        log::debug!("lookup by address {address}: found={}", found.is_some());
        Ok(found.map(IdentityRecord::into_identity))
    }

    /// Every stored identity, secrets as stored.
    pub async fn get_identities(&self) -> Result<Vec<Identity>> {
        self.store.ensure_open().await?;
        Ok(self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(IdentityRecord::into_identity)
            .collect())
    }

    /// Copy of `identity` with its secret opened, or emptied when Locked or
    /// when the secret does not open.
    async fn reveal(&self, identity: &Identity) -> Result<Identity> {
        let opened = match &self.passphrase {
            Some(passphrase) => open_secret(identity.secret().to_string(), passphrase).await?,
            None => None,
        };
        let secret = opened.map(|s| s.as_str().to_owned()).unwrap_or_default();
        Ok(identity.with_secret(secret))
    }

    /// Swap in `next` as the current identity, wiping the opened secret of
    /// the outgoing one.
    fn replace_current(&mut self, next: Option<Identity>) {
        if let Some(mut previous) = std::mem::replace(&mut self.current_identity, next) {
            previous.zeroize_secret();
        }
    }
}

// ── Off-runtime crypto ────────────────────────────────────────────────────────

/// Seal `plaintext` on the blocking pool.
async fn seal_secret(
    plaintext: Zeroizing<String>,
    passphrase: Zeroizing<String>,
    kdf: KdfParams,
) -> Result<String> {
    tokio::task::spawn_blocking(move || encrypt_with(&plaintext, &passphrase, &kdf))
        .await
        .map_err(|e| VaultError::TaskFailed(format!("seal task: {e}")))?
}

/// Open `ciphertext` on the blocking pool. `None` when it does not open.
async fn open_secret(
    ciphertext: String,
    passphrase: &Zeroizing<String>,
) -> Result<Option<Zeroizing<String>>> {
    let passphrase = passphrase.clone();
    tokio::task::spawn_blocking(move || try_decrypt(&ciphertext, &passphrase).map(Zeroizing::new))
        .await
        .map_err(|e| VaultError::TaskFailed(format!("open task: {e}")))
}

impl<B: StateBroadcaster> IdentityService<FileIdentityStore, B> {
    /// File-backed service built from a [`VaultConfig`].
    pub fn from_config(config: &VaultConfig, broadcaster: B) -> Self {
        Self::new(FileIdentityStore::new(&config.store_path), broadcaster).with_kdf(config.kdf)
    }
}
