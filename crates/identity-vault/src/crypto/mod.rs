//! Cryptographic primitives for the identity vault.
//!
//! This module provides:
//! - Argon2id passphrase-based key derivation
//! - ChaCha20-Poly1305 sealing of secret identity fields
//! - Ed25519 key pair generation for new keypair identities
//! - Cryptographically secure random number generation

pub mod encryption;
pub mod keys;
pub mod random;

pub use encryption::{decrypt, encrypt, try_decrypt, KdfParams, SealedSecret};
