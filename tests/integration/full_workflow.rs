//! Integration test: full end-to-end vault workflow on a file-backed store.
//!
//! Tests the complete lifecycle:
//! 1. Open a fresh vault and unlock it
//! 2. Add keypair and group identities
//! 3. Lock, reopen from disk, and unlock again
//! 4. Select identities and check that secrets open
//! 5. Check that nothing on disk is plaintext

use identity_vault::crypto::encryption::encrypt_with;
use identity_vault::{
    ChannelBroadcaster, FileIdentityStore, GroupIdentity, Identity, IdentityPath,
    IdentityService, IdentityStore, KdfParams, KeypairIdentity, StateEvent, VaultConfig,
    VaultError,
};

fn config_in(dir: &std::path::Path) -> VaultConfig {
    let mut config = VaultConfig::in_dir(dir);
    config.kdf = KdfParams::fast();
    config
}

fn group(commitment: &str, address: &str) -> GroupIdentity {
    GroupIdentity {
        address: address.to_string(),
        nonce: 1,
        provider: "github".to_string(),
        name: "silver".to_string(),
        identity_commitment: commitment.to_string(),
        identity_path: Some(IdentityPath {
            path_elements: vec!["a1".to_string(), "b2".to_string(), "c3".to_string()],
            path_index: vec![0, 1, 1],
            root: "0xroot".to_string(),
        }),
        serialized_identity: format!("{{\"trapdoor\":\"{commitment}-t\",\"nullifier\":\"n\"}}"),
    }
}

#[tokio::test]
async fn full_workflow_add_lock_reopen_select() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let passphrase = "correct-horse-battery-staple";

    let alice = KeypairIdentity::generate("0xalice", 0);
    let bob = KeypairIdentity::generate("0xbob", 0);
    let alice_group = group("commit-alice", "0xalice");

    // ── Step 1: open and unlock ─────────────────────────────────────────
    {
        let broadcaster = ChannelBroadcaster::default();
        let mut rx = broadcaster.subscribe();
        let mut vault = IdentityService::from_config(&config, broadcaster);
        vault.start().await.expect("vault should open");
        vault.set_passphrase(passphrase).await.expect("first unlock accepts any passphrase");
        assert_eq!(rx.recv().await.unwrap(), StateEvent::UnlockedChanged(true));

        // ── Step 2: add identities ──────────────────────────────────────
        vault.add_identity(alice.clone().into()).await.unwrap();
        vault.add_identity(bob.clone().into()).await.unwrap();
        vault.add_identity(alice_group.clone().into()).await.unwrap();

        let mut last = None;
        for _ in 0..3 {
            last = Some(rx.recv().await.unwrap());
        }
        match last {
            Some(StateEvent::IdentitiesChanged(list)) => assert_eq!(list.len(), 3),
            other => panic!("expected identities_changed, got {other:?}"),
        }

        // ── Step 3: lock ────────────────────────────────────────────────
        vault.set_identity(None).await;
        let status = vault.get_status().await.unwrap();
        assert!(!status.unlocked);
        assert!(status.current_identity.is_none());
    }

    // ── Step 3b: reopen from disk ───────────────────────────────────────
    let mut vault = IdentityService::from_config(&config, ChannelBroadcaster::default());
    vault.start().await.unwrap();
    assert_eq!(vault.get_identities().await.unwrap().len(), 3);

    assert!(matches!(
        vault.set_passphrase("not-it").await,
        Err(VaultError::InvalidPassphrase)
    ));
    vault.set_passphrase(passphrase).await.expect("unlock after reopen");

    // ── Step 4: select ──────────────────────────────────────────────────
    let selected = vault.select_identity(&bob.public_key).await.unwrap();
    assert_eq!(selected, Identity::Keypair(bob.clone()));

    let selected = vault.select_identity("commit-alice").await.unwrap();
    assert_eq!(selected.secret(), alice_group.serialized_identity);
    assert_eq!(
        vault.get_status().await.unwrap().current_identity,
        Some(selected)
    );

    // Address lookups return ciphertext.
    let by_address = vault
        .get_identity_by_address("0xbob")
        .await
        .unwrap()
        .expect("bob is stored");
    assert_eq!(by_address.lookup_key(), bob.public_key);
    assert_ne!(by_address.secret(), bob.private_key);

    // ── Step 5: at-rest confidentiality ─────────────────────────────────
    let raw = std::fs::read_to_string(&config.store_path).unwrap();
    assert!(!raw.contains(&alice.private_key));
    assert!(!raw.contains(&bob.private_key));
    assert!(!raw.contains("commit-alice-t"));
    assert!(raw.contains("commit-alice"));
    assert!(raw.contains(&alice.public_key));

    for row in vault.store().get_all().await.unwrap() {
        assert_ne!(row.private_key, alice.private_key);
        assert_ne!(row.private_key, bob.private_key);
        assert_ne!(row.serialized_identity, alice_group.serialized_identity);
    }
}

#[tokio::test]
async fn workflow_store_not_started() {
    let dir = tempfile::tempdir().unwrap();
    let mut vault =
        IdentityService::from_config(&config_in(dir.path()), ChannelBroadcaster::default());

    assert!(matches!(
        vault.get_status().await,
        Err(VaultError::NotInitialized)
    ));
    assert!(matches!(
        vault.set_passphrase("p").await,
        Err(VaultError::NotInitialized)
    ));
    assert!(matches!(
        vault.get_identities().await,
        Err(VaultError::NotInitialized)
    ));
    assert!(matches!(
        vault.select_identity("x").await,
        Err(VaultError::NotInitialized)
    ));
}

#[tokio::test]
async fn workflow_upgrade_from_version_1() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    // Produce a sealed key the way an older release would have stored it.
    let legacy = KeypairIdentity::generate("0xlegacy", 3);
    let sealed = encrypt_with(&legacy.private_key, "old-pass", &KdfParams::fast()).unwrap();
    let v1 = serde_json::json!({
        "version": 1,
        "records": [{
            "address": legacy.address,
            "nonce": legacy.nonce,
            "public_key": legacy.public_key,
            "private_key": sealed,
        }]
    });
    std::fs::write(&config.store_path, serde_json::to_vec(&v1).unwrap()).unwrap();

    let mut vault = IdentityService::from_config(&config, ChannelBroadcaster::default());
    vault.start().await.unwrap();
    vault.set_passphrase("old-pass").await.unwrap();

    let selected = vault.select_identity(&legacy.public_key).await.unwrap();
    assert_eq!(selected, Identity::Keypair(legacy));

    // New group identities can live alongside migrated keypairs.
    vault
        .add_identity(group("c-new", "0xlegacy").into())
        .await
        .unwrap();
    assert_eq!(vault.get_identities().await.unwrap().len(), 2);

    let file = FileIdentityStore::new(&config.store_path);
    file.open().await.unwrap();
    assert_eq!(file.get_all().await.unwrap().len(), 2);
}
