//! Mock API tests for the session gateway.
//!
//! These tests use wiremock to simulate the TecBook API and check the
//! refresh, retry and invalidation behavior end to end over HTTP.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use tecbook_core::error::AuthError;
use tecbook_core::{
    AccessToken, ApiUrl, CredentialStore, Error, LoginCredentials, PendingRequest, RefreshToken,
};
use tecbook_http::{ClientConfig, InvalidationReason, SessionEvent, TecbookClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Helper to create a client against the mock server, with an `/api` prefix.
fn mock_client(server: &MockServer) -> TecbookClient {
    // For tests, we need to allow HTTP localhost
    let api = ApiUrl::new(format!("http://127.0.0.1:{}/api", server.address().port())).unwrap();
    let config = ClientConfig::new(api).with_request_timeout(Duration::from_millis(500));
    TecbookClient::new(config, CredentialStore::in_memory()).unwrap()
}

fn signed_in(server: &MockServer) -> TecbookClient {
    let client = mock_client(server);
    client
        .adopt_token(AccessToken::new("A1"), Some(RefreshToken::new("R1")))
        .unwrap();
    client
}

/// `path` answers 200 to `Bearer <token>` and 401 to anything else.
async fn mount_protected(server: &MockServer, route: &str, token: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})))
        .with_priority(10)
        .mount(server)
        .await;
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "correoInstitucional": "ana@tecsup.edu.pe",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "A1",
            "refresh": "R1",
            "user": {
                "id": 12,
                "nombre": "Ana",
                "apellidos": "Quispe",
                "correoInstitucional": "ana@tecsup.edu.pe",
                "rol": "ESTUDIANTE"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let outcome = client
        .login(&LoginCredentials::new("ana@tecsup.edu.pe", "secret123"))
        .await
        .unwrap();

    assert_eq!(outcome.identity.unwrap().display_name, "Ana Quispe");
    assert!(client.store().is_authenticated());
}

#[tokio::test]
async fn test_login_invalid_credentials_leaves_store_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Credenciales inválidas"
        })))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let result = client
        .login(&LoginCredentials::new("ana@tecsup.edu.pe", "wrong"))
        .await;

    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::InvalidCredentials(_)))
    ));
    assert_eq!(
        client.store().credential().unwrap().access_token.as_str(),
        "A1"
    );
}

#[tokio::test]
async fn test_login_with_google() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/google"))
        .and(body_json(json!({"idToken": "google-id-token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "G1",
            "refresh": "GR1",
            "requiresCompletion": true,
            "redirectTo": "/completar-perfil"
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let outcome = client.login_with_google("google-id-token").await.unwrap();

    assert!(outcome.requires_completion);
    assert_eq!(outcome.redirect_to.as_deref(), Some("/completar-perfil"));
    assert_eq!(
        client.store().credential().unwrap().access_token.as_str(),
        "G1"
    );
}

// ============================================================================
// Refresh & Retry Tests
// ============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_retried() {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/aulas", "A2").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let response = client.call(PendingRequest::get("/aulas")).await.unwrap();

    assert!(response.is_success());
    let stored = client.store().credential().unwrap();
    assert_eq!(stored.access_token.as_str(), "A2");
    assert_eq!(stored.refresh_token.unwrap().as_str(), "R1");
}

#[tokio::test]
async fn test_failed_refresh_expires_session() {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/aulas", "A2").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "InvalidToken"})))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let notices = Arc::new(AtomicUsize::new(0));
    let counter = notices.clone();
    client.on_session_invalidated(move |reason| {
        assert_eq!(reason, InvalidationReason::RefreshFailed);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = client.call(PendingRequest::get("/aulas")).await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
    assert!(!matches!(err, Error::Network(_)));
    assert!(!client.store().is_authenticated());
    assert_eq!(notices.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_public_endpoint_never_carries_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/departamentos/activos"))
        .respond_with(|request: &Request| {
            if request.headers.contains_key("authorization") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1}]))
            }
        })
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let response = client
        .call(PendingRequest::get("/departamentos/activos"))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_share_a_single_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/aulas", "A2").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A2", "refresh": "R2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let mut events = client.subscribe();

    let calls = (0..10).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.call(PendingRequest::get("/aulas")).await })
    });
    let results = futures_util::future::join_all(calls).await;

    for result in results {
        assert!(result.unwrap().unwrap().is_success());
    }
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Refreshed);
    assert!(events.try_recv().is_err());
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_401s_share_a_single_failed_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/aulas", "A2").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "InvalidToken"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let notices = Arc::new(AtomicUsize::new(0));
    let counter = notices.clone();
    client.on_session_invalidated(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let calls = (0..10).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.call(PendingRequest::get("/aulas")).await })
    });
    let results = futures_util::future::join_all(calls).await;

    for result in results {
        let err = result.unwrap().unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
    }
    assert!(!client.store().is_authenticated());
    assert_eq!(notices.load(Ordering::SeqCst), 1);
    server.verify().await;
}

#[tokio::test]
async fn test_retry_happens_at_most_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/aulas"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let mut events = client.subscribe();

    let err = client.call(PendingRequest::get("/aulas")).await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::Unauthorized)));
    assert!(!client.store().is_authenticated());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Refreshed);
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Invalidated {
            reason: InvalidationReason::RejectedAfterRefresh
        }
    );
    server.verify().await;
}

#[tokio::test]
async fn test_subsequent_calls_use_refreshed_token() {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/aulas", "A2").await;
    mount_protected(&server, "/api/anuncios", "A2").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    client.call(PendingRequest::get("/aulas")).await.unwrap();
    client.call(PendingRequest::get("/anuncios")).await.unwrap();

    let anuncios: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/api/anuncios")
        .collect();
    assert_eq!(anuncios.len(), 1);
    assert_eq!(anuncios[0].headers["authorization"], "Bearer A2");
    server.verify().await;
}

#[tokio::test]
async fn test_no_refresh_token_means_no_refresh_call() {
    let server = MockServer::start().await;
    mount_protected(&server, "/api/aulas", "A2").await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    client.adopt_token(AccessToken::new("A1"), None).unwrap();

    let err = client.call(PendingRequest::get("/aulas")).await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::NotAuthenticated)));
    assert!(!client.store().is_authenticated());
    server.verify().await;
}

#[tokio::test]
async fn test_current_user_is_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "nombre": "Luis",
            "email": "luis@tecsup.edu.pe",
            "role": "admin"
        })))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let identity = client.current_user().await.unwrap();

    assert_eq!(identity.user_id, 4);
    assert_eq!(client.store().identity().unwrap(), identity);
}

// ============================================================================
// Logout Tests
// ============================================================================

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer A1"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    client.logout().await;

    assert!(!client.store().is_authenticated());
    server.verify().await;
}

#[tokio::test]
async fn test_logout_survives_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    client.logout().await;

    assert!(!client.store().is_authenticated());
}

#[tokio::test]
async fn test_logout_survives_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let mut events = client.subscribe();
    client.logout().await;

    assert!(!client.store().is_authenticated());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    // Nothing listens on this port once the server is dropped.
    let client = {
        let server = MockServer::start().await;
        signed_in(&server)
    };

    let err = client.call(PendingRequest::get("/aulas")).await.unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    assert!(err.is_retryable());
    assert!(client.store().is_authenticated());
}
