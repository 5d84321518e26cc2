use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

use jobboard_backend::middleware::auth::{require_bearer_auth, Claims};
use jobboard_backend::utils::token::issue_token;

const TEST_SECRET: &str = "test_secret_key";

fn init() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("DATABASE_URL", "postgres://localhost/unused");
    env::set_var("JWT_SECRET", TEST_SECRET);
    env::set_var("TOKEN_TTL_HOURS", "24");
    env::set_var("CLOUDINARY_CLOUD_NAME", "test-cloud");
    env::set_var("CLOUDINARY_API_KEY", "key");
    env::set_var("CLOUDINARY_API_SECRET", "secret");
    let _ = jobboard_backend::config::init_config();
}

async fn whoami(claims: Claims) -> String {
    claims.sub
}

fn guarded_app() -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn(require_bearer_auth))
}

fn extractor_app() -> Router {
    Router::new().route("/whoami", get(whoami))
}

#[tokio::test]
async fn missing_token_is_rejected() {
    init();
    let req = Request::builder()
        .uri("/whoami")
        .body(Body::empty())
        .unwrap();
    let resp = guarded_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "missing_authorization");
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    init();
    let req = Request::builder()
        .uri("/whoami")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let resp = guarded_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "unsupported_scheme");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    init();
    let req = Request::builder()
        .uri("/whoami")
        .header("authorization", "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let resp = guarded_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    init();
    let token = issue_token(Uuid::new_v4(), "candidate", "some-other-secret", 24).expect("token");
    let req = Request::builder()
        .uri("/whoami")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = guarded_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn valid_token_reaches_handler_with_claims() {
    init();
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, "employer", TEST_SECRET, 24).expect("token");

    let req = Request::builder()
        .uri("/whoami")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = guarded_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    assert_eq!(bytes, user_id.to_string().as_bytes());
}

#[tokio::test]
async fn claims_extractor_decodes_without_middleware() {
    init();
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, "candidate", TEST_SECRET, 24).expect("token");

    let req = Request::builder()
        .uri("/whoami")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = extractor_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    assert_eq!(bytes, user_id.to_string().as_bytes());
}

#[tokio::test]
async fn claims_extractor_rejects_anonymous_request() {
    init();
    let req = Request::builder()
        .uri("/whoami")
        .body(Body::empty())
        .unwrap();
    let resp = extractor_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
