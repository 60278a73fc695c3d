mod common;

use axum::http::StatusCode;
use common::{token_of, TestApp, PASSWORD};
use rental_service::services::TotpVerifier;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

fn current_code(app: &TestApp, secret: &str, email: &str) -> String {
    TotpVerifier::new(&app.state.config.mfa)
        .totp(secret, email)
        .unwrap()
        .generate_current()
        .unwrap()
}

/// A six-digit code guaranteed to fall outside the accepted window.
fn wrong_code(app: &TestApp, secret: &str, email: &str) -> String {
    let totp = TotpVerifier::new(&app.state.config.mfa)
        .totp(secret, email)
        .unwrap();
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let window: Vec<String> = [now - 60, now - 30, now, now + 30, now + 60]
        .iter()
        .map(|t| totp.generate(*t))
        .collect();
    (0..10)
        .map(|d| d.to_string().repeat(6))
        .find(|c| !window.contains(c))
        .unwrap()
}

async fn enable_mfa(app: &TestApp, email: &str) -> (String, String) {
    let (_, token) = app.register(email, "tenant").await;

    let setup = app.post("/auth/mfa/setup", Some(&token), json!({})).await;
    assert_eq!(setup.status, StatusCode::OK);
    let secret = setup.body["secret"].as_str().unwrap().to_string();
    assert!(setup.body["otpauth_url"]
        .as_str()
        .unwrap()
        .starts_with("otpauth://totp/"));
    assert!(setup.body["qr_code"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    let verify = app
        .post(
            "/auth/mfa/verify",
            Some(&token),
            json!({ "code": current_code(app, &secret, email) }),
        )
        .await;
    assert_eq!(verify.status, StatusCode::OK, "{}", verify.body);

    (token, secret)
}

#[tokio::test]
async fn test_wrong_code_does_not_enable_mfa() {
    let app = TestApp::new();
    let email = "mfa-wrong@example.com";
    let (_, token) = app.register(email, "tenant").await;

    let setup = app.post("/auth/mfa/setup", Some(&token), json!({})).await;
    let secret = setup.body["secret"].as_str().unwrap().to_string();

    let verify = app
        .post(
            "/auth/mfa/verify",
            Some(&token),
            json!({ "code": wrong_code(&app, &secret, email) }),
        )
        .await;
    assert_eq!(verify.status, StatusCode::UNAUTHORIZED);

    let me = app.get("/users/me", Some(&token)).await;
    assert_eq!(me.body["mfa_enabled"], false);
}

#[tokio::test]
async fn test_verify_without_setup_fails() {
    let app = TestApp::new();
    let (_, token) = app.register("nosetup@example.com", "tenant").await;

    let res = app
        .post("/auth/mfa/verify", Some(&token), json!({ "code": "123456" }))
        .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_requires_second_factor_once_enabled() {
    let app = TestApp::new();
    let email = "mfa@example.com";
    let (_, secret) = enable_mfa(&app, email).await;

    let first = app.login(email, PASSWORD).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["mfa_required"], true);
    assert!(first.body.get("token").is_none());
    let user_id = first.body["user_id"].as_str().unwrap().to_string();

    let rejected = app
        .post(
            "/auth/mfa/login",
            None,
            json!({ "user_id": user_id, "code": wrong_code(&app, &secret, email) }),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);

    let accepted = app
        .post(
            "/auth/mfa/login",
            None,
            json!({ "user_id": user_id, "code": current_code(&app, &secret, email) }),
        )
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["mfa_required"], false);

    let token = token_of(&accepted.body);
    let me = app.get("/users/me", Some(&token)).await;
    assert_eq!(me.body["mfa_enabled"], true);
}

#[tokio::test]
async fn test_second_factor_failures_lock_the_account() {
    let app = TestApp::new();
    let email = "mfa-lock@example.com";
    let (_, secret) = enable_mfa(&app, email).await;

    let first = app.login(email, PASSWORD).await;
    assert_eq!(first.body["mfa_required"], true);
    let user_id = first.body["user_id"].as_str().unwrap().to_string();

    let (_, admin_token) = app.admin().await;
    let failures_uri = format!(
        "/admin/security/logs?user_id={}&action=LOGIN&status=FAILURE",
        user_id
    );

    for attempt in 1..=5 {
        let res = app
            .post(
                "/auth/mfa/login",
                None,
                json!({ "user_id": user_id, "code": wrong_code(&app, &secret, email) }),
            )
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);

        let failures = app.get(&failures_uri, Some(&admin_token)).await;
        assert_eq!(failures.body["total"], attempt);
    }

    // A correct code no longer helps once the window holds five failures.
    let locked = app
        .post(
            "/auth/mfa/login",
            None,
            json!({ "user_id": user_id, "code": current_code(&app, &secret, email) }),
        )
        .await;
    assert_eq!(locked.status, StatusCode::LOCKED);

    let blocked = app
        .get(
            &format!(
                "/admin/security/logs?user_id={}&action=LOGIN&status=BLOCKED",
                user_id
            ),
            Some(&admin_token),
        )
        .await;
    assert_eq!(blocked.body["total"], 1);
}

#[tokio::test]
async fn test_setup_conflicts_when_already_enabled() {
    let app = TestApp::new();
    let (token, _) = enable_mfa(&app, "twice@example.com").await;

    let res = app.post("/auth/mfa/setup", Some(&token), json!({})).await;

    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_disable_restores_single_factor_login() {
    let app = TestApp::new();
    let email = "disable@example.com";
    let (token, _) = enable_mfa(&app, email).await;

    let res = app.post("/auth/mfa/disable", Some(&token), json!({})).await;
    assert_eq!(res.status, StatusCode::OK);

    let login = app.login(email, PASSWORD).await;
    assert_eq!(login.body["mfa_required"], false);
    assert!(login.body["token"]["access_token"].is_string());
}

#[tokio::test]
async fn test_malformed_code_is_a_validation_error() {
    let app = TestApp::new();
    let (_, token) = app.register("format@example.com", "tenant").await;

    let res = app
        .post("/auth/mfa/verify", Some(&token), json!({ "code": "12ab" }))
        .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}
