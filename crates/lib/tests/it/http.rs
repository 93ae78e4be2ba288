//! The same flows over a real HTTP server bound to an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use keeper::{
    DataType,
    client::{ClientError, KeeperClient, Secret},
    protocol::{ErrorCode, KeeperRequest, KeeperResponse, UserExistsRequest},
    service::KeeperService,
    transport::{HttpServer, HttpTransport, KeeperTransport, http::API_PATH},
};

use crate::helpers::{TestContext, test_backend, test_security_config};

async fn start_server() -> (HttpServer, KeeperClient<HttpTransport>) {
    let clock = Arc::new(keeper::FixedClock::default());
    let backend = test_backend(clock.clone()).await;
    let service = Arc::new(KeeperService::with_clock(
        backend,
        &test_security_config(),
        clock,
    ));
    let server = HttpServer::start("127.0.0.1:0", service)
        .await
        .expect("bind ephemeral port");
    let transport = HttpTransport::new(server.url()).unwrap();
    (server, KeeperClient::new(transport))
}

#[tokio::test]
async fn test_health_probe() {
    let (server, client) = start_server().await;
    assert!(client.transport().health().await.unwrap());
    server.shutdown().await;
}

#[tokio::test]
async fn test_register_save_retrieve_over_http() {
    let (server, client) = start_server().await;

    assert!(!client.user_exists("alice").await.unwrap());
    let session = client.register("alice", "pw", "seedA").await.unwrap();
    assert!(client.user_exists("alice").await.unwrap());

    client
        .save(&session, &Secret::text("hello"), "note")
        .await
        .unwrap();
    client
        .save(
            &session,
            &Secret::binary("blob.bin", (0u8..=255).collect()),
            "all bytes",
        )
        .await
        .unwrap();

    let texts = client.retrieve(&session, DataType::Text).await.unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].secret().unwrap(), Secret::text("hello"));

    let binaries = client.retrieve(&session, DataType::Binary).await.unwrap();
    assert_eq!(
        binaries[0].secret().unwrap(),
        Secret::binary("blob.bin", (0u8..=255).collect())
    );

    let relogin = client.authenticate("alice", "pw").await.unwrap();
    assert_eq!(*client.master_seed(&relogin).await.unwrap(), "seedA");

    server.shutdown().await;
}

#[tokio::test]
async fn test_failures_keep_their_kind_over_http() {
    let (server, client) = start_server().await;
    client.register("alice", "pw", "seedA").await.unwrap();

    let err = client.authenticate("alice", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid username or password");

    let err = client.register("alice", "pw", "seedA").await.unwrap_err();
    assert!(err.is_conflict());

    let forged = keeper::client::Session::new("not-a-token").unwrap();
    let err = client.retrieve_raw(&forged, DataType::Text).await.unwrap_err();
    assert!(err.is_unauthorized());

    server.shutdown().await;
}

#[tokio::test]
async fn test_http_and_local_transports_agree() {
    let ctx = TestContext::new().await;
    let server = HttpServer::start("127.0.0.1:0", ctx.service.clone())
        .await
        .unwrap();
    let http = HttpTransport::new(server.url()).unwrap();

    ctx.register("alice").await;
    let request = KeeperRequest::UserExists(UserExistsRequest {
        username: "alice".to_string(),
    });
    let over_http = http.call(request.clone()).await.unwrap();
    let in_process = ctx.client.transport().call(request).await.unwrap();
    match (over_http, in_process) {
        (KeeperResponse::UserExists(a), KeeperResponse::UserExists(b)) => {
            assert!(a.exists);
            assert_eq!(a.exists, b.exists);
            assert_eq!(a.status, b.status);
        }
        other => panic!("unexpected responses: {other:?}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_error_code_is_on_the_wire() {
    let (server, _client) = start_server().await;

    let body = serde_json::json!({
        "AuthenticateUser": { "username": "nobody", "password": "pw" }
    });
    let response: serde_json::Value = reqwest::Client::new()
        .post(format!("{}{API_PATH}", server.url()))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let reply = &response["AuthenticateUser"];
    assert_eq!(reply["success"], false);
    assert_eq!(reply["message"], "Invalid username or password");
    assert_eq!(
        serde_json::from_value::<ErrorCode>(reply["error"].clone()).unwrap(),
        ErrorCode::Unauthorized
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_malformed_body_is_a_transport_level_rejection() {
    let (server, _client) = start_server().await;

    let response = reqwest::Client::new()
        .post(format!("{}{API_PATH}", server.url()))
        .header("content-type", "application/json")
        .body("{\"no_such_rpc\":{}}")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    server.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let transport =
        HttpTransport::with_timeout(format!("http://{address}"), Duration::from_secs(2)).unwrap();
    let client = KeeperClient::new(transport);
    let err = client.user_exists("alice").await.unwrap_err();
    assert!(err.is_transport_error(), "unexpected error: {err}");
    assert!(matches!(
        err,
        keeper::Error::Client(ClientError::Transport { .. } | ClientError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_server_stops_after_shutdown() {
    let (server, client) = start_server().await;
    assert!(client.user_exists("alice").await.is_ok());

    server.shutdown().await;
    let err = client.user_exists("alice").await.unwrap_err();
    assert!(err.is_transport_error());
}

#[tokio::test]
async fn test_trailing_slash_in_base_url_is_ignored() {
    let (server, _client) = start_server().await;
    let transport = HttpTransport::new(format!("{}/", server.url())).unwrap();
    assert_eq!(transport.base_url(), server.url());
    assert!(transport.health().await.unwrap());
    server.shutdown().await;
}
