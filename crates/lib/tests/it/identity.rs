//! Registration, authentication and token lifetime through the service.

use std::sync::Arc;
use std::time::Duration;

use keeper::{
    Clock, SecurityConfig, SigningKeys,
    identity::Claims,
    protocol::{
        AuthenticateUserRequest, ErrorCode, MasterSeedRetrieveRequest, RegisterUserRequest,
        UserExistsRequest, messages,
    },
    service::KeeperService,
};

use crate::helpers::{TEST_SECRET, TestContext};

fn register_request(login: &str, password: &str, seed: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        username: login.to_string(),
        password: password.to_string(),
        seed: seed.to_string(),
    }
}

fn login_request(login: &str, password: &str) -> AuthenticateUserRequest {
    AuthenticateUserRequest {
        username: login.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_then_authenticate() {
    let ctx = TestContext::new().await;

    let registered = ctx
        .service
        .register_user(register_request("alice", "pw", "seedA"))
        .await
        .unwrap();
    assert!(registered.status.success);
    assert_eq!(registered.status.message, messages::USER_REGISTERED);
    let user_id = ctx
        .service
        .identity()
        .verify_token(&registered.token)
        .unwrap();

    let authenticated = ctx
        .service
        .authenticate_user(login_request("alice", "pw"))
        .await
        .unwrap();
    assert!(authenticated.status.success);
    assert_eq!(authenticated.status.message, messages::AUTHENTICATED);
    assert_eq!(
        ctx.service
            .identity()
            .verify_token(&authenticated.token)
            .unwrap(),
        user_id
    );
}

#[tokio::test]
async fn test_failed_logins_share_one_message() {
    let ctx = TestContext::new().await;
    ctx.register("alice").await;

    let wrong_password = ctx
        .service
        .authenticate_user(login_request("alice", "wrong"))
        .await
        .unwrap();
    let unknown_user = ctx
        .service
        .authenticate_user(login_request("nobody", "x"))
        .await
        .unwrap();

    for response in [&wrong_password, &unknown_user] {
        assert!(!response.status.success);
        assert!(response.token.is_empty());
        assert_eq!(response.status.message, messages::INVALID_CREDENTIALS);
        assert_eq!(response.status.error, Some(ErrorCode::Unauthorized));
    }
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let ctx = TestContext::new().await;
    ctx.register("alice").await;

    let response = ctx
        .service
        .register_user(register_request("alice", "other", "seedB"))
        .await
        .unwrap();
    assert!(!response.status.success);
    assert_eq!(response.status.message, messages::USER_EXISTS);
    assert_eq!(response.status.error, Some(ErrorCode::Conflict));

    // The original account is untouched
    let seed = ctx
        .backend()
        .get_user_by_login("alice")
        .await
        .unwrap()
        .master_seed;
    assert_eq!(seed, "seed-alice");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_has_one_winner() {
    let ctx = TestContext::new().await;

    let attempts: Vec<_> = (0..2)
        .map(|i| {
            let service = ctx.service.clone();
            tokio::spawn(async move {
                service
                    .register_user(register_request("alice", "pw", &format!("seed-{i}")))
                    .await
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for attempt in attempts {
        outcomes.push(attempt.await.unwrap().unwrap());
    }

    let winners = outcomes.iter().filter(|r| r.status.success).count();
    assert_eq!(winners, 1);
    let loser = outcomes.iter().find(|r| !r.status.success).unwrap();
    assert_eq!(loser.status.error, Some(ErrorCode::Conflict));
    assert_eq!(loser.status.message, messages::USER_EXISTS);
}

#[tokio::test]
async fn test_user_exists_reports_registration() {
    let ctx = TestContext::new().await;
    let before = ctx
        .service
        .user_exists(UserExistsRequest {
            username: "alice".to_string(),
        })
        .await
        .unwrap();
    assert!(before.status.success);
    assert!(!before.exists);

    ctx.register("alice").await;
    let after = ctx
        .service
        .user_exists(UserExistsRequest {
            username: "alice".to_string(),
        })
        .await
        .unwrap();
    assert!(after.exists);
}

#[tokio::test]
async fn test_empty_registration_fields_are_rejected() {
    let ctx = TestContext::new().await;
    let response = ctx
        .service
        .register_user(register_request("alice", "", "seedA"))
        .await
        .unwrap();
    assert!(!response.status.success);
    assert_eq!(response.status.error, Some(ErrorCode::Validation));
}

#[tokio::test]
async fn test_token_expires_after_one_day() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    ctx.clock.advance(23 * 60 * 60 * 1000);
    assert!(
        ctx.service
            .identity()
            .verify_token(session.token())
            .is_ok()
    );

    ctx.clock.advance(60 * 60 * 1000);
    let response = ctx
        .service
        .master_seed_retrieve(MasterSeedRetrieveRequest {
            token: session.token().to_string(),
        })
        .await
        .unwrap();
    assert!(!response.status.success);
    assert_eq!(response.status.message, messages::UNAUTHORIZED);
    assert!(response.master_seed.is_empty());
}

#[tokio::test]
async fn test_token_with_past_expiry_is_rejected() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;
    let identity = ctx.service.identity();
    let user_id = identity.verify_token(session.token()).unwrap();

    let stale = identity
        .signer()
        .sign(&Claims {
            user_id,
            exp: ctx.clock.now_secs() - 1,
        })
        .unwrap();
    let err = identity.verify_token(&stale).unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_rotated_secret_keeps_outstanding_tokens_valid() {
    let ctx = TestContext::new().await;
    let session = ctx.register("alice").await;

    let new_secret = [0x5Au8; 32];
    let rotated = KeeperService::with_clock(
        ctx.backend().clone(),
        &SecurityConfig::new(
            SigningKeys::new(new_secret)
                .unwrap()
                .with_previous(TEST_SECRET)
                .unwrap(),
        ),
        ctx.clock.clone(),
    );

    let response = rotated
        .master_seed_retrieve(MasterSeedRetrieveRequest {
            token: session.token().to_string(),
        })
        .await
        .unwrap();
    assert!(response.status.success);
    assert_eq!(response.master_seed, "seed-alice");

    // After the old secret is dropped, the old token stops working
    let retired = KeeperService::with_clock(
        ctx.backend().clone(),
        &SecurityConfig::new(SigningKeys::new(new_secret).unwrap()),
        ctx.clock.clone(),
    );
    let response = retired
        .master_seed_retrieve(MasterSeedRetrieveRequest {
            token: session.token().to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.status.error, Some(ErrorCode::Unauthorized));
}

#[tokio::test]
async fn test_custom_token_ttl() {
    let ctx = TestContext::new().await;
    ctx.register("alice").await;

    let short_lived = Arc::new(KeeperService::with_clock(
        ctx.backend().clone(),
        &crate::helpers::test_security_config().with_token_ttl(Duration::from_secs(60)),
        ctx.clock.clone(),
    ));
    let response = short_lived
        .authenticate_user(login_request("alice", "pw"))
        .await
        .unwrap();
    assert!(response.status.success);

    ctx.clock.advance(61_000);
    assert!(
        short_lived
            .identity()
            .verify_token(&response.token)
            .is_err()
    );
}
