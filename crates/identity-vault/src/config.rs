//! Vault configuration.
//!
//! By convention the default root is `~/.identity-vault/`, overridable with
//! the `IDENTITY_VAULT_DIR` environment variable:
//!
//! ```text
//! ~/.identity-vault/
//! ├── config.json        (optional)
//! └── identities.json
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::error::{Result, VaultError};

/// Environment variable overriding the vault directory.
pub const VAULT_DIR_ENV: &str = "IDENTITY_VAULT_DIR";

const DEFAULT_DIR_NAME: &str = ".identity-vault";
const STORE_FILE_NAME: &str = "identities.json";
const CONFIG_FILE_NAME: &str = "config.json";

/// Runtime configuration for an identity vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultConfig {
    /// Location of the identity store file.
    pub store_path: PathBuf,
    /// Argon2id parameters for newly sealed secrets.
    pub kdf: KdfParams,
}

impl VaultConfig {
    /// Configuration rooted at an explicit directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            store_path: dir.as_ref().join(STORE_FILE_NAME),
            kdf: KdfParams::default(),
        }
    }

    /// Configuration for `dir`, with any `config.json` found there
    /// applied on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Io` if the config file exists but cannot be
    /// read, or `VaultError::InvalidFileFormat` if it is not valid JSON.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut config = Self::in_dir(dir);

        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(config);
        }

        let bytes = std::fs::read(&path)?;
        let file: ConfigFile = serde_json::from_slice(&bytes).map_err(|e| {
            VaultError::InvalidFileFormat(format!("failed to parse config {}: {e}", path.display()))
        })?;
        if let Some(store_path) = file.store_path {
            config.store_path = if store_path.is_relative() {
                dir.join(store_path)
            } else {
                store_path
            };
        }
        if let Some(kdf) = file.kdf {
            config.kdf = kdf;
        }
        Ok(config)
    }

    /// Configuration for [`default_dir`].
    pub fn load_default() -> Result<Self> {
        Self::load_from_dir(default_dir())
    }
}

/// On-disk `config.json`; every field is optional.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    store_path: Option<PathBuf>,
    kdf: Option<KdfParams>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self::in_dir(default_dir())
    }
}

/// `$IDENTITY_VAULT_DIR`, else `$HOME/.identity-vault`, else
/// `./.identity-vault`.
pub fn default_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(VAULT_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}
