//! HTTP server for the festival pass service.
//!
//! Issues tamper-evident donation passes, verifies them for gate staff,
//! guards the admin console behind a throttled shared-secret login, and
//! proxies the visitor chat assistant.

pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod donations;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AdminBearer, Credentials};
pub use chat::{ChatBackend, ChatError, ChatProxy, GeminiBackend};
pub use client::ClientKey;
pub use config::{ChatConfig, Secrets, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::AcfServer;
pub use state::{AppState, Backends};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use acf_crypto::{hash_password_with, Argon2Cost};
    use acf_gate::ManualClock;
    use acf_ledger::field;
    use acf_store::{InMemoryBlobStore, InMemoryDocumentStore};

    const NOW_MS: u64 = 1_732_082_400_000;

    struct EchoChat;

    #[async_trait]
    impl ChatBackend for EchoChat {
        async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
            let message = prompt.rsplit("User: ").next().unwrap_or_default();
            Ok(format!("echo: {message}"))
        }
    }

    struct Harness {
        app: Router,
        store: Arc<InMemoryDocumentStore>,
        clock: Arc<ManualClock>,
    }

    fn harness_with(admin_hash: Option<String>, chat: Arc<dyn ChatBackend>) -> Harness {
        let mut config = ServerConfig::default();
        config.secrets.verification_secret = Some("test-verification-secret".into());
        config.secrets.admin_password_hash = admin_hash;
        config.ledger.sequencer.backoff_base_ms = 0;

        let store = Arc::new(InMemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(NOW_MS));
        let backends = Backends {
            store: store.clone(),
            blobs: Arc::new(InMemoryBlobStore::new()),
            chat,
            clock: clock.clone(),
        };
        let server = AcfServer::new(config, backends).unwrap();
        Harness {
            app: server.router(),
            store,
            clock,
        }
    }

    fn harness() -> Harness {
        let hash = hash_password_with("hunter2", Argon2Cost::TESTING).unwrap();
        harness_with(Some(hash), Arc::new(EchoChat))
    }

    async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn donate(app: &Router, donor: &str, amount: f64) -> Value {
        let response = send(
            app,
            post_json("/api/donations", json!({ "donorName": donor, "amount": amount })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    async fn login(app: &Router, password: &str) -> Response<Body> {
        send(app, post_json("/api/admin-auth", json!({ "password": password }))).await
    }

    // -----------------------------------------------------------------------
    // Service info
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint() {
        let h = harness();
        let response = send(&h.app, get("/api/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let h = harness();
        let body = json_body(send(&h.app, get("/api/info")).await).await;
        assert_eq!(body["name"], "acf-server");
        assert_eq!(body["receiptPrefix"], "ACF");
    }

    // -----------------------------------------------------------------------
    // Donations and verification
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn issue_then_verify_scenario() {
        let h = harness();

        let jane = donate(&h.app, "Jane Doe", 501.0).await;
        assert_eq!(jane["receiptId"], 10_001);
        assert_eq!(jane["displayTransactionId"], "ACF-10001");
        assert_eq!(jane["amount"], 501.0);
        assert_eq!(jane["scanPayload"], jane["securePassId"]);
        assert_eq!(jane["imageFileName"], "Pass_ACF-10001.png");

        let second = donate(&h.app, "Ravi", 1100.0).await;
        assert_eq!(second["receiptId"], 10_002);

        let body = json_body(send(&h.app, get("/api/verify?id=ACF-10001")).await).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["reason"], "verified");
        assert_eq!(body["message"], "Pass verified successfully");
        assert_eq!(body["record"]["donorName"], "Jane Doe");

        let uri = format!("/api/verify?id={}", jane["securePassId"].as_str().unwrap());
        let by_scan = json_body(send(&h.app, get(&uri)).await).await;
        assert_eq!(by_scan["record"], body["record"]);
    }

    #[tokio::test]
    async fn unknown_pass_is_not_found() {
        let h = harness();
        let response = send(&h.app, get("/api/verify?id=does-not-exist")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["reason"], "not found");
        assert_eq!(body["record"], Value::Null);
    }

    #[tokio::test]
    async fn tampered_amount_is_reported() {
        let h = harness();
        donate(&h.app, "Jane Doe", 501.0).await;
        let doc_id = h.store.all()[0].id.clone();
        h.store.patch(&doc_id, field::AMOUNT, json!(5001.0)).unwrap();

        let body = json_body(send(&h.app, get("/api/verify?id=ACF-10001")).await).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["reason"], "tampered");
        assert_eq!(body["record"]["amount"], 5001.0);
    }

    #[tokio::test]
    async fn out_of_range_amount_is_tampered_with_stored_record() {
        let h = harness();
        donate(&h.app, "Jane Doe", 501.0).await;
        let doc_id = h.store.all()[0].id.clone();
        h.store.patch(&doc_id, field::AMOUNT, json!(2_000_000.0)).unwrap();

        let body = json_body(send(&h.app, get("/api/verify?id=ACF-10001")).await).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["reason"], "tampered");
        assert_eq!(body["record"]["amount"], 2_000_000.0);
        assert_eq!(body["record"]["donorName"], "Jane Doe");
    }

    #[tokio::test]
    async fn invalid_donations_are_rejected() {
        let h = harness();
        for body in [
            json!({ "donorName": "Jane", "amount": 0 }),
            json!({ "donorName": "Jane", "amount": 1_000_000.5 }),
            json!({ "donorName": "Jane" }),
        ] {
            let response = send(&h.app, post_json("/api/donations", body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn offline_store_is_service_unavailable() {
        let h = harness();
        h.store.set_offline(true);
        let response = send(
            &h.app,
            post_json("/api/donations", json!({ "donorName": "Jane", "amount": 5 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = send(&h.app, get("/api/verify?id=ACF-10001")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn pass_image_upload() {
        let h = harness();
        let pass = donate(&h.app, "Jane Doe", 501.0).await;
        let uri = format!("/api/passes/{}/image", pass["securePassId"].as_str().unwrap());
        let request = Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(&b"\x89PNG\r\n"[..]))
            .unwrap();
        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["sync"]["status"], "synced");

        let request = Request::builder()
            .method("PUT")
            .uri("/api/passes/ACF-424242/image")
            .body(Body::from("png"))
            .unwrap();
        assert_eq!(send(&h.app, request).await.status(), StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // Admin authentication
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn admin_login_unlocks_ledger() {
        let h = harness();
        donate(&h.app, "Jane Doe", 501.0).await;
        donate(&h.app, "Ravi", 1100.0).await;

        let response = send(&h.app, get("/api/admin/donations")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = login(&h.app, " hunter2 ").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Authentication successful");
        let token = body["sessionToken"].as_str().unwrap().to_string();
        assert_eq!(token.len(), 64);

        let request = Request::builder()
            .uri("/api/admin/donations")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["summary"]["count"], 2);
        assert_eq!(body["summary"]["total"], "1601.00");
        assert_eq!(body["donations"][0]["displayTransactionId"], "ACF-10002");
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let h = harness();
        let body = json_body(login(&h.app, "hunter2").await).await;
        let token = body["sessionToken"].as_str().unwrap().to_string();

        h.clock.advance(Duration::from_secs(12 * 60 * 60 + 1));
        let request = Request::builder()
            .uri("/api/admin/donations")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&h.app, request).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_and_empty_passwords() {
        let h = harness();
        let response = login(&h.app, "letmein").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid password");
        assert_eq!(body["remaining"], 9);

        let response = login(&h.app, "   ").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn eleventh_login_attempt_is_throttled() {
        let h = harness();
        for _ in 0..10 {
            login(&h.app, "letmein").await;
        }
        let response = login(&h.app, "hunter2").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "900");
        let body = json_body(response).await;
        assert_eq!(body["error"], "Too many authentication attempts");
        assert_eq!(body["retryAfter"], 15);
        assert_eq!(body["message"], "Please try again in 15 minutes");

        h.clock.advance(Duration::from_secs(15 * 60 + 1));
        assert_eq!(login(&h.app, "hunter2").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_auth_without_hash_is_not_configured() {
        let h = harness_with(None, Arc::new(EchoChat));
        let response = login(&h.app, "hunter2").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Authentication not configured");
    }

    // -----------------------------------------------------------------------
    // Chat proxy
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn chat_replies_with_rate_limit_headers() {
        let h = harness();
        let response = send(&h.app, post_json("/api/chat", json!({ "message": "  hello " }))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "10");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "9");
        assert_eq!(response.headers()["x-ratelimit-reset"], "2024-11-20T06:01:00.000Z");
        assert_eq!(json_body(response).await["response"], "echo: hello");
    }

    #[tokio::test]
    async fn chat_validation_errors() {
        let h = harness();
        let response = send(&h.app, post_json("/api/chat", json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));

        let long = "a".repeat(501);
        let response = send(&h.app, post_json("/api/chat", json!({ "message": long }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_is_throttled_per_client() {
        let h = harness();
        let from = |ip: &'static str| {
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", ip)
                .body(Body::from(json!({ "message": "hi" }).to_string()))
                .unwrap()
        };
        for _ in 0..10 {
            assert_eq!(send(&h.app, from("203.0.113.7")).await.status(), StatusCode::OK);
        }
        let response = send(&h.app, from("203.0.113.7")).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert_eq!(json_body(response).await["retryAfter"], 60);

        assert_eq!(send(&h.app, from("198.51.100.2")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_without_api_key_is_not_configured() {
        let config = ServerConfig::default();
        let h = harness_with(None, Arc::new(GeminiBackend::new(&config.chat, None)));
        let response = send(&h.app, post_json("/api/chat", json!({ "message": "hi" }))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "API key not configured");
    }
}
