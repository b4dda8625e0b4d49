//! Turnstile verifier against a local siteverify stub.
//!
//! Each test binds an ephemeral port, serves a canned siteverify handler
//! and points `verify_url` at it.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};

use gacha_domain::config::ChallengeConfig;
use gacha_gateway::runtime::{
    ChallengeContext, ChallengeVerifier, TurnstileVerifier, VerificationError,
};

const SECRET: &str = "test-secret";

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/siteverify")
}

fn verifier(url: String, timeout_ms: u64) -> TurnstileVerifier {
    let cfg = ChallengeConfig {
        verify_url: url,
        timeout_ms,
        ..ChallengeConfig::default()
    };
    TurnstileVerifier::new(&cfg, SECRET.into()).unwrap()
}

/// Accepts token "good" with the right secret; echoes a rejection otherwise.
/// Requires `remoteip` when the token is "needs-ip".
async fn siteverify(Form(form): Form<HashMap<String, String>>) -> Json<serde_json::Value> {
    let secret_ok = form.get("secret").map(String::as_str) == Some(SECRET);
    let accepted = match form.get("response").map(String::as_str) {
        Some("good") => secret_ok,
        Some("needs-ip") => {
            secret_ok && form.get("remoteip").map(String::as_str) == Some("198.51.100.4")
        }
        _ => false,
    };
    if accepted {
        Json(serde_json::json!({ "success": true }))
    } else {
        Json(serde_json::json!({
            "success": false,
            "error-codes": ["invalid-input-response"],
        }))
    }
}

#[tokio::test]
async fn valid_token_is_accepted() {
    let url = spawn_stub(Router::new().route("/siteverify", post(siteverify))).await;
    let v = verifier(url, 2_000);

    assert_eq!(v.verify("good", &ChallengeContext::default()).await, Ok(()));
}

#[tokio::test]
async fn caller_ip_is_forwarded() {
    let url = spawn_stub(Router::new().route("/siteverify", post(siteverify))).await;
    let v = verifier(url, 2_000);

    let ctx = ChallengeContext {
        ip: Some("198.51.100.4"),
    };
    assert_eq!(v.verify("needs-ip", &ctx).await, Ok(()));
    assert!(v
        .verify("needs-ip", &ChallengeContext::default())
        .await
        .is_err());
}

#[tokio::test]
async fn rejected_token_carries_error_codes() {
    let url = spawn_stub(Router::new().route("/siteverify", post(siteverify))).await;
    let v = verifier(url, 2_000);

    assert_eq!(
        v.verify("forged", &ChallengeContext::default()).await,
        Err(VerificationError::Rejected {
            codes: vec!["invalid-input-response".into()],
        })
    );
}

#[tokio::test]
async fn empty_token_never_reaches_upstream() {
    // Nothing listens here; a network call would fail differently.
    let v = verifier("http://127.0.0.1:9/siteverify".into(), 2_000);

    assert_eq!(
        v.verify("", &ChallengeContext::default()).await,
        Err(VerificationError::MissingToken)
    );
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let router = Router::new().route(
        "/siteverify",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(serde_json::json!({ "success": true }))
        }),
    );
    let url = spawn_stub(router).await;
    let v = verifier(url, 100);

    match v.verify("good", &ChallengeContext::default()).await {
        Err(VerificationError::UpstreamUnavailable(reason)) => assert_eq!(reason, "timed out"),
        other => panic!("expected upstream timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn upstream_error_status_is_unavailable() {
    let router = Router::new().route(
        "/siteverify",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let url = spawn_stub(router).await;
    let v = verifier(url, 2_000);

    assert!(matches!(
        v.verify("good", &ChallengeContext::default()).await,
        Err(VerificationError::UpstreamUnavailable(_))
    ));
}
