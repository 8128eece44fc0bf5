//! Resilience tests: corrupted store files, wrong passphrases, tampered
//! secrets.

use std::time::Duration;

use identity_vault::crypto::encryption::{decrypt, encrypt_with, try_decrypt};
use identity_vault::{
    FileIdentityStore, IdentityService, IdentityStore, KdfParams, KeypairIdentity,
    NoopBroadcaster, VaultConfig, VaultError,
};

async fn populated_store(dir: &std::path::Path) -> std::path::PathBuf {
    let mut config = VaultConfig::in_dir(dir);
    config.kdf = KdfParams::fast();
    let mut vault = IdentityService::from_config(&config, NoopBroadcaster);
    vault.start().await.unwrap();
    vault.set_passphrase("test_pass").await.unwrap();
    vault
        .add_identity(KeypairIdentity::generate("0xres", 0).into())
        .await
        .unwrap();
    config.store_path
}

#[tokio::test]
async fn resilience_corrupted_store_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = populated_store(tmp.path()).await;

    {
        let mut data = std::fs::read(&path).unwrap();
        for item in data.iter_mut().take(50).skip(10) {
            *item ^= 0xFF;
        }
        std::fs::write(&path, data).unwrap();
    }

    let store = FileIdentityStore::new(&path);
    assert!(store.open().await.is_err(), "Corrupted file should fail to open");
    assert!(!store.is_open().await);
}

#[tokio::test]
async fn resilience_truncated_store_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = populated_store(tmp.path()).await;

    {
        let data = std::fs::read(&path).unwrap();
        let half = data.len() / 2;
        std::fs::write(&path, &data[..half]).unwrap();
    }

    let store = FileIdentityStore::new(&path);
    assert!(matches!(
        store.open().await,
        Err(VaultError::InvalidFileFormat(_))
    ));
}

#[tokio::test]
async fn resilience_empty_store_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("identities.json");
    std::fs::write(&path, b"").unwrap();

    let store = FileIdentityStore::new(&path);
    assert!(store.open().await.is_err(), "Empty file should fail to open");
}

#[tokio::test]
async fn resilience_tampered_secret_blocks_unlock() {
    let tmp = tempfile::tempdir().unwrap();
    let path = populated_store(tmp.path()).await;

    // Swap the sealed private key for one sealed under another passphrase.
    let raw = std::fs::read_to_string(&path).unwrap();
    let mut file: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let foreign = encrypt_with("00", "someone-else", &KdfParams::fast()).unwrap();
    file["records"][0]["private_key"] = serde_json::Value::String(foreign);
    std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

    let mut vault = IdentityService::new(FileIdentityStore::new(&path), NoopBroadcaster);
    vault.start().await.unwrap();
    assert!(matches!(
        vault.set_passphrase("test_pass").await,
        Err(VaultError::InvalidPassphrase)
    ));
    assert!(!vault.is_unlocked());
}

#[tokio::test]
async fn resilience_legacy_secret_format_blocks_unlock() {
    let tmp = tempfile::tempdir().unwrap();
    let path = populated_store(tmp.path()).await;

    let raw = std::fs::read_to_string(&path).unwrap();
    let mut file: serde_json::Value = serde_json::from_str(&raw).unwrap();
    file["records"][0]["private_key"] =
        serde_json::Value::String("U2FsdGVkX1+not-an-envelope".to_string());
    std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

    let mut vault = IdentityService::new(FileIdentityStore::new(&path), NoopBroadcaster);
    vault.start().await.unwrap();
    assert!(matches!(
        vault.set_passphrase("test_pass").await,
        Err(VaultError::InvalidPassphrase)
    ));
}

#[tokio::test]
async fn resilience_inflated_kdf_cost_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let path = populated_store(tmp.path()).await;

    let raw = std::fs::read_to_string(&path).unwrap();
    let mut file: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let sealed = file["records"][0]["private_key"].as_str().unwrap().to_string();
    let mut envelope: serde_json::Value = serde_json::from_str(&sealed).unwrap();
    envelope["params"]["t_cost"] = serde_json::json!(u32::MAX);
    file["records"][0]["private_key"] = serde_json::Value::String(envelope.to_string());
    std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

    let mut vault = IdentityService::new(FileIdentityStore::new(&path), NoopBroadcaster);
    vault.start().await.unwrap();
    let unlock = vault.set_passphrase("test_pass");
    let attempt = tokio::time::timeout(Duration::from_secs(10), unlock)
        .await
        .expect("unlock should not stall on an inflated iteration count");
    assert!(matches!(attempt, Err(VaultError::InvalidPassphrase)));
}

#[test]
fn resilience_random_text_not_a_sealed_secret() {
    let random: String = (0..256).map(|i| ((i * 17 + 31) % 94 + 33) as u8 as char).collect();
    assert!(decrypt(&random, "pass").is_err());
    assert_eq!(try_decrypt(&random, "pass"), None);
}

#[test]
fn resilience_seal_open_50_times() {
    for i in 0..50 {
        let secret = format!("secret-{i}");
        let sealed = encrypt_with(&secret, "pass", &KdfParams::fast()).unwrap();
        assert_eq!(decrypt(&sealed, "pass").unwrap(), secret, "Round trip {i} failed");
    }
}
