//! Stress test: store 100 identities of both kinds, verify all keys are
//! unique, every identity can be selected, and unlock still verifies every
//! keypair.

use std::collections::HashSet;

use identity_vault::{
    GroupIdentity, Identity, IdentityService, KdfParams, KeypairIdentity, MemoryIdentityStore,
    NoopBroadcaster,
};

fn group(i: usize) -> GroupIdentity {
    GroupIdentity {
        address: format!("0x{:04x}", i % 10),
        nonce: i as u64,
        provider: "twitter".to_string(),
        name: "gold".to_string(),
        identity_commitment: format!("commitment-{i}"),
        identity_path: None,
        serialized_identity: format!("serialized-{i}"),
    }
}

#[tokio::test]
async fn stress_100_identities_select_each() {
    let mut vault = IdentityService::new(MemoryIdentityStore::new(), NoopBroadcaster)
        .with_kdf(KdfParams::fast());
    vault.start().await.unwrap();
    vault.set_passphrase("stress-pass").await.unwrap();

    let mut originals: Vec<Identity> = Vec::with_capacity(100);
    for i in 0..100 {
        let identity: Identity = if i % 2 == 0 {
            KeypairIdentity::generate(format!("0x{:04x}", i % 10), i as u64).into()
        } else {
            group(i).into()
        };
        vault.add_identity(identity.clone()).await.unwrap();
        originals.push(identity);
    }

    let stored = vault.get_identities().await.unwrap();
    assert_eq!(stored.len(), 100);

    let keys: HashSet<&str> = stored.iter().map(|id| id.lookup_key()).collect();
    assert_eq!(keys.len(), 100, "Duplicate lookup key found");

    for original in &originals {
        let selected = vault.select_identity(original.lookup_key()).await.unwrap();
        assert_eq!(&selected, original);
    }

    vault.set_identity(None).await;
    vault.set_passphrase("stress-pass").await.unwrap();
    assert!(vault.is_unlocked());
}

#[tokio::test]
async fn stress_shared_addresses_resolve() {
    let mut vault = IdentityService::new(MemoryIdentityStore::new(), NoopBroadcaster)
        .with_kdf(KdfParams::fast());
    vault.start().await.unwrap();
    vault.set_passphrase("pass").await.unwrap();

    for i in 0..30 {
        vault.add_identity(group(i).into()).await.unwrap();
    }

    for a in 0..10 {
        let address = format!("0x{a:04x}");
        let found = vault
            .get_identity_by_address(&address)
            .await
            .unwrap()
            .expect("every address has identities");
        assert_eq!(found.address(), address);
    }
    assert!(vault.get_identity_by_address("0xffff").await.unwrap().is_none());
}
