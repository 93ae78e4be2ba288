//! Save and retrieve workflows, end to end over the in-process transport.

use keeper::{
    DataType, KdfParams,
    client::{KeeperClient, Secret},
    crypto::{NONCE_LENGTH, TAG_LENGTH, decrypt, derive_key},
    transport::LocalTransport,
};

use crate::helpers::TestContext;

#[tokio::test]
async fn test_save_and_retrieve_each_secret_type() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    let secrets = [
        (Secret::credentials("alice@example.com", "hunter2"), "mail"),
        (Secret::text("the quick brown fox"), "note"),
        (Secret::binary("id_ed25519", vec![0, 1, 2, 254, 255]), "ssh key"),
        (Secret::card("4111111111111111", "12/30", "123"), "visa"),
    ];
    for (secret, label) in &secrets {
        ctx.client.save(&session, secret, *label).await.unwrap();
    }

    for (secret, label) in &secrets {
        let items = ctx
            .client
            .retrieve(&session, secret.data_type())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].metadata, *label);
        assert_eq!(&items[0].secret().unwrap(), secret);
    }
}

#[tokio::test]
async fn test_server_only_holds_ciphertext() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    ctx.client
        .save(&session, &Secret::text("top secret"), "label")
        .await
        .unwrap();

    let user = ctx.backend().get_user_by_login("alice").await.unwrap();
    let entries = ctx
        .backend()
        .retrieve_entries(user.id, DataType::Text)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    let stored = &entries[0].data;
    assert!(
        !stored
            .windows(b"top secret".len())
            .any(|w| w == b"top secret")
    );
    // Metadata is a plaintext label
    assert_eq!(entries[0].metadata, "label");

    // The stored bytes open with the key derived from the user's seed
    let key = derive_key("seed-alice", &KdfParams::default()).unwrap();
    let plaintext = decrypt(stored, &key).unwrap();
    let secret = Secret::from_plaintext(DataType::Text, &plaintext).unwrap();
    assert_eq!(secret, Secret::text("top secret"));
}

#[tokio::test]
async fn test_explicit_workflow_steps() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    let pending = ctx
        .client
        .begin_save(&session)
        .await
        .unwrap()
        .seal(&Secret::text("hello"), "note")
        .unwrap();
    assert_eq!(pending.data_type(), DataType::Text);
    assert_eq!(pending.metadata(), "note");
    assert!(pending.ciphertext().len() > NONCE_LENGTH + TAG_LENGTH);

    // Nothing is stored until commit
    assert!(
        ctx.client
            .retrieve(&session, DataType::Text)
            .await
            .unwrap()
            .is_empty()
    );
    pending.commit().await.unwrap();

    let items = ctx
        .client
        .begin_retrieve(&session)
        .await
        .unwrap()
        .fetch(DataType::Text)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].secret().unwrap(), Secret::text("hello"));
}

#[tokio::test]
async fn test_token_expiring_mid_save_stores_nothing() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    let workflow = ctx.client.begin_save(&session).await.unwrap();
    let pending = workflow.seal(&Secret::text("late"), "late").unwrap();

    // The token lapses between the seed fetch and the store call
    ctx.clock.advance(24 * 60 * 60 * 1000);
    let err = pending.commit().await.unwrap_err();
    assert!(err.is_unauthorized());

    let user = ctx.backend().get_user_by_login("alice").await.unwrap();
    let entries = ctx
        .backend()
        .retrieve_entries(user.id, DataType::Text)
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_token_expiring_mid_retrieve_is_unauthorized() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;
    ctx.client
        .save(&session, &Secret::text("x"), "")
        .await
        .unwrap();

    let workflow = ctx.client.begin_retrieve(&session).await.unwrap();
    ctx.clock.advance(24 * 60 * 60 * 1000);
    let err = workflow.fetch(DataType::Text).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_invalid_secret_is_rejected_before_any_call() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    let err = ctx
        .client
        .save(&session, &Secret::card("", "12/30", "123"), "")
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert!(
        ctx.client
            .retrieve(&session, DataType::Card)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_mismatched_kdf_params_cannot_read_entries() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;
    ctx.client
        .save(&session, &Secret::text("hello"), "")
        .await
        .unwrap();

    let other = KeeperClient::new(LocalTransport::new(ctx.service.clone()))
        .with_kdf_params(KdfParams::new("another-salt", 4096));
    let err = other.retrieve(&session, DataType::Text).await.unwrap_err();
    assert!(err.is_authentication_failure());
}

#[tokio::test]
async fn test_tampered_entry_aborts_retrieval() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    ctx.client
        .save(&session, &Secret::text("good"), "first")
        .await
        .unwrap();
    // An entry that was not sealed with this user's key
    ctx.client
        .store_raw(&session, DataType::Text, vec![0u8; 40], "garbage")
        .await
        .unwrap();

    let err = ctx
        .client
        .retrieve(&session, DataType::Text)
        .await
        .unwrap_err();
    assert!(err.is_authentication_failure());
}

#[tokio::test]
async fn test_same_seed_opens_entries_from_another_session() {
    let ctx = TestContext::new().await;
    ctx.register("alice").await;

    let first = ctx.client.authenticate("alice", "pw").await.unwrap();
    ctx.client
        .save(&first, &Secret::credentials("root", "toor"), "server")
        .await
        .unwrap();

    let second = ctx.client.authenticate("alice", "pw").await.unwrap();
    let items = ctx
        .client
        .retrieve(&second, DataType::Credentials)
        .await
        .unwrap();
    assert_eq!(
        items[0].secret().unwrap(),
        Secret::credentials("root", "toor")
    );
}
