//! Error types for the identity vault.
//!
//! All errors are strongly typed and propagated without panicking.
//! Passphrases and secret identity material are never included in error
//! messages.

/// Vault error types covering every store and service operation.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Identity store is not initialized")]
    NotInitialized,

    #[error("Identity store is locked")]
    Locked,

    #[error("Missing or invalid field: {0}")]
    Validation(String),

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Crypto task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported store version: {0}")]
    UnsupportedVersion(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, VaultError>;
