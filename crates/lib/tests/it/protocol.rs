//! The RPC surface as seen by a client, over the in-process transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keeper::{
    DataType, KdfParams, Result, User, UserId, VaultEntry,
    backend::{BackendError, VaultBackend},
    client::{ClientError, KeeperClient, Session},
    crypto::{decrypt, derive_key, encrypt},
    protocol::{KeeperRequest, KeeperResponse},
    service::KeeperService,
    transport::{KeeperTransport, LocalTransport},
    types::{NewUser, NewVaultEntry},
};

use crate::helpers::{TestContext, test_security_config};

#[tokio::test]
async fn test_store_then_retrieve_ciphertext() {
    let ctx = TestContext::new().await;
    let session = ctx
        .client
        .register("alice", "pw", "seedA")
        .await
        .unwrap();

    let key = derive_key("seedA", &KdfParams::default()).unwrap();
    let sealed = encrypt(b"hello", &key).unwrap();
    ctx.client
        .store_raw(&session, DataType::Text, sealed.clone(), "note")
        .await
        .unwrap();

    let items = ctx
        .client
        .retrieve_raw(&session, DataType::Text)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].metadata, "note");
    assert_eq!(items[0].data_type, DataType::Text);
    assert_eq!(items[0].data, sealed);

    let key = derive_key("seedA", &KdfParams::default()).unwrap();
    assert_eq!(decrypt(&items[0].data, &key).unwrap().as_slice(), b"hello");
}

#[tokio::test]
async fn test_retrieve_with_no_matches_is_empty() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;
    for data_type in DataType::ALL {
        let items = ctx.client.retrieve_raw(&session, data_type).await.unwrap();
        assert!(items.is_empty());
    }
}

#[tokio::test]
async fn test_store_with_bad_token_is_unauthorized() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    let forged = Session::new(format!("{}x", session.token())).unwrap();
    let err = ctx
        .client
        .store_raw(&forged, DataType::Text, vec![1, 2, 3], "")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Unauthorized");

    let err = ctx
        .client
        .retrieve_raw(&forged, DataType::Text)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    assert!(
        ctx.client
            .retrieve_raw(&session, DataType::Text)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_owners_only_see_their_own_entries() {
    let ctx = TestContext::new().await;
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;

    ctx.client
        .store_raw(&alice, DataType::Credentials, vec![1], "alice-login")
        .await
        .unwrap();
    ctx.client
        .store_raw(&bob, DataType::Credentials, vec![2], "bob-login")
        .await
        .unwrap();

    let alice_items = ctx
        .client
        .retrieve_raw(&alice, DataType::Credentials)
        .await
        .unwrap();
    let bob_items = ctx
        .client
        .retrieve_raw(&bob, DataType::Credentials)
        .await
        .unwrap();
    assert_eq!(alice_items.len(), 1);
    assert_eq!(alice_items[0].metadata, "alice-login");
    assert_eq!(bob_items.len(), 1);
    assert_eq!(bob_items[0].metadata, "bob-login");
}

#[tokio::test]
async fn test_master_seed_belongs_to_the_token_owner() {
    let ctx = TestContext::new().await;
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;

    assert_eq!(*ctx.client.master_seed(&alice).await.unwrap(), "seed-alice");
    assert_eq!(*ctx.client.master_seed(&bob).await.unwrap(), "seed-bob");
}

#[tokio::test]
async fn test_sign_up_checks_existence_first() {
    let ctx = TestContext::new().await;
    ctx.register("alice").await;

    let err = ctx
        .client
        .sign_up("alice", "pw2", "seedB")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "User already exists. Please Log in");

    let session = ctx.client.sign_up("bob", "pw", "seedB").await.unwrap();
    assert_eq!(*ctx.client.master_seed(&session).await.unwrap(), "seedB");
}

/// Fails the test if any RPC is attempted.
struct NoCalls;

#[async_trait]
impl KeeperTransport for NoCalls {
    async fn call(&self, request: KeeperRequest) -> Result<KeeperResponse> {
        panic!("unexpected call: {request:?}");
    }
}

#[tokio::test]
async fn test_empty_fields_fail_before_any_call() {
    let client = KeeperClient::new(NoCalls);

    for (username, password, seed) in [("", "pw", "s"), ("u", "", "s"), ("u", "pw", "")] {
        let err = client.sign_up(username, password, seed).await.unwrap_err();
        assert!(err.is_validation_error());
        let err = client.register(username, password, seed).await.unwrap_err();
        assert!(err.is_validation_error());
    }
    assert!(
        client
            .authenticate("", "pw")
            .await
            .unwrap_err()
            .is_validation_error()
    );
    assert!(
        client
            .user_exists("")
            .await
            .unwrap_err()
            .is_validation_error()
    );
}

/// A backend whose every call fails (or stalls) like a broken store.
struct BrokenBackend {
    stall: Option<Duration>,
}

impl BrokenBackend {
    async fn fail<T>(&self) -> Result<T> {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        Err(BackendError::LockPoisoned.into())
    }
}

#[async_trait]
impl VaultBackend for BrokenBackend {
    async fn user_exists(&self, _login: &str) -> Result<bool> {
        self.fail().await
    }
    async fn create_user(&self, _user: NewUser) -> Result<UserId> {
        self.fail().await
    }
    async fn get_user_by_login(&self, _login: &str) -> Result<User> {
        self.fail().await
    }
    async fn store_entry(&self, _entry: NewVaultEntry) -> Result<VaultEntry> {
        self.fail().await
    }
    async fn retrieve_entries(&self, _owner: UserId, _data_type: DataType) -> Result<Vec<VaultEntry>> {
        self.fail().await
    }
    async fn get_master_seed(&self, _user_id: UserId) -> Result<String> {
        self.fail().await
    }
}

#[tokio::test]
async fn test_store_failure_is_internal_not_conflict() {
    let service = Arc::new(KeeperService::new(
        Arc::new(BrokenBackend { stall: None }),
        &test_security_config(),
    ));
    let client = KeeperClient::new(LocalTransport::new(service.clone()));

    let err = client.register("alice", "pw", "seedA").await.unwrap_err();
    assert!(!err.is_conflict());
    assert!(matches!(
        err,
        keeper::Error::Client(ClientError::Server { .. })
    ));

    // A valid token still cannot get past a broken store
    let token = service.identity().issue_token(UserId(1)).unwrap();
    let session = Session::new(token).unwrap();
    let err = client
        .store_raw(&session, DataType::Text, vec![1], "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), keeper::ErrorKind::Internal);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let service = Arc::new(KeeperService::new(
        Arc::new(BrokenBackend {
            stall: Some(Duration::from_secs(30)),
        }),
        &test_security_config(),
    ));
    let transport = LocalTransport::new(service).with_timeout(Duration::from_millis(50));
    let client = KeeperClient::new(transport);

    let err = client.user_exists("alice").await.unwrap_err();
    assert!(err.is_transport_error());
    assert!(matches!(
        err,
        keeper::Error::Client(ClientError::Timeout { .. })
    ));
}
