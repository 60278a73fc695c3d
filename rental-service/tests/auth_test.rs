mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{TestApp, PASSWORD};
use rental_service::models::{ActivityAction, ActivityLog, ActivityStatus, RequestOrigin};
use rental_service::services::ActivityRepository;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_user_and_token() {
    let app = TestApp::new();

    let res = app
        .post(
            "/auth/register",
            None,
            json!({
                "email": "Tenant@Example.com",
                "password": PASSWORD,
                "name": "Tina Tenant",
                "role": "tenant",
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["user"]["email"], "tenant@example.com");
    assert_eq!(res.body["user"]["role"], "TENANT");
    assert_eq!(res.body["user"]["mfa_enabled"], false);
    assert!(res.body["user"].get("password_hash").is_none());
    assert_eq!(res.body["token"]["token_type"], "Bearer");
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = TestApp::new();
    app.register("dup@example.com", "tenant").await;

    let res = app
        .post(
            "/auth/register",
            None,
            json!({
                "email": "DUP@example.com",
                "password": PASSWORD,
                "name": "Again",
                "role": "landlord",
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_admin_role_and_short_password() {
    let app = TestApp::new();

    let admin = app
        .post(
            "/auth/register",
            None,
            json!({
                "email": "admin@example.com",
                "password": PASSWORD,
                "name": "Sneaky",
                "role": "admin",
            }),
        )
        .await;
    assert_eq!(admin.status, StatusCode::UNPROCESSABLE_ENTITY);

    let short = app
        .post(
            "/auth/register",
            None,
            json!({
                "email": "short@example.com",
                "password": "short",
                "name": "Shorty",
                "role": "tenant",
            }),
        )
        .await;
    assert_eq!(short.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(short.body["error"], "Validation error");
}

#[tokio::test]
async fn test_login_success_and_wrong_password() {
    let app = TestApp::new();
    let (user_id, _) = app.register("login@example.com", "tenant").await;

    let ok = app.login("login@example.com", PASSWORD).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["mfa_required"], false);
    assert_eq!(ok.body["user_id"], user_id.to_string());
    assert!(ok.body["token"]["access_token"].is_string());

    let bad = app.login("login@example.com", "wrong-password").await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad.body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_unknown_email_is_indistinguishable_from_wrong_password() {
    let app = TestApp::new();

    let res = app.login("ghost@example.com", PASSWORD).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_account_locks_after_five_failures() {
    let app = TestApp::new();
    app.register("victim@example.com", "tenant").await;

    for _ in 0..5 {
        let res = app.login("victim@example.com", "wrong-password").await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while the window is open.
    let locked = app.login("victim@example.com", PASSWORD).await;
    assert_eq!(locked.status, StatusCode::LOCKED);

    let (_, admin_token) = app.admin().await;
    let alerts = app
        .get("/admin/security/alerts?resolved=false", Some(&admin_token))
        .await;
    assert_eq!(alerts.status, StatusCode::OK);
    assert_eq!(alerts.body["total"], 1);
    assert_eq!(alerts.body["items"][0]["kind"], "BRUTE_FORCE");

    let blocked = app
        .get(
            "/admin/security/logs?action=LOGIN&status=BLOCKED",
            Some(&admin_token),
        )
        .await;
    assert_eq!(blocked.status, StatusCode::OK);
    assert_eq!(blocked.body["total"], 1);
}

#[tokio::test]
async fn test_failures_outside_the_window_do_not_lock() {
    let app = TestApp::new();
    let (user_id, _) = app.register("returning@example.com", "tenant").await;

    let origin = RequestOrigin::new(Some("198.51.100.10"), Some("test-agent/1.0"));
    for _ in 0..5 {
        let mut log = ActivityLog::new(
            Some(user_id),
            ActivityAction::Login,
            ActivityStatus::Failure,
            &origin,
            None,
        );
        log.created_at = Utc::now() - Duration::minutes(16);
        app.store.insert_activity(&log).await.unwrap();
    }

    let res = app.login("returning@example.com", PASSWORD).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["token"]["access_token"].is_string());

    // One more failure inside the window is not enough on its own.
    let res = app.login("returning@example.com", "wrong-password").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    let res = app.login("returning@example.com", PASSWORD).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = TestApp::new();

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let res = app.send(req).await;

    assert!(res.status.is_client_error());
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let (_, token) = app.register("pw@example.com", "tenant").await;

    let wrong = app
        .post(
            "/users/me/password",
            Some(&token),
            json!({ "current_password": "not-it-at-all", "new_password": "new-password-123" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .post(
            "/users/me/password",
            Some(&token),
            json!({ "current_password": PASSWORD, "new_password": "new-password-123" }),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);

    assert_eq!(
        app.login("pw@example.com", "new-password-123").await.status,
        StatusCode::OK
    );
}
