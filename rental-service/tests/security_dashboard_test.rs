mod common;

use axum::http::StatusCode;
use common::{TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_dashboard_is_admin_only() {
    let app = TestApp::new();
    let (_, tenant_token) = app.register("t@example.com", "tenant").await;
    let (_, landlord_token) = app.register("l@example.com", "landlord").await;

    for token in [&tenant_token, &landlord_token] {
        let res = app.get("/admin/security/summary", Some(token)).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN);
    }
    assert_eq!(
        app.get("/admin/security/logs", None).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_summary_counts_recent_activity() {
    let app = TestApp::new();
    app.register("busy@example.com", "tenant").await;

    app.login("busy@example.com", PASSWORD).await;
    app.login("busy@example.com", "wrong-password").await;
    app.login("busy@example.com", "wrong-password").await;
    app.login("nobody@example.com", PASSWORD).await;

    let (_, admin_token) = app.admin().await;
    let res = app
        .get("/admin/security/summary?hours=1", Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["window_hours"], 1);
    assert_eq!(res.body["login_success"], 1);
    assert_eq!(res.body["login_failure"], 3);
    assert_eq!(res.body["login_blocked"], 0);
    assert_eq!(res.body["alerts_raised"], 0);

    let clamped = app
        .get("/admin/security/summary?hours=100000", Some(&admin_token))
        .await;
    assert_eq!(clamped.body["window_hours"], 720);

    let default = app.get("/admin/security/summary", Some(&admin_token)).await;
    assert_eq!(default.body["window_hours"], 24);
}

#[tokio::test]
async fn test_logs_filter_by_action() {
    let app = TestApp::new();
    let (user_id, _) = app.register("logged@example.com", "tenant").await;
    app.login("logged@example.com", "wrong-password").await;

    let (_, admin_token) = app.admin().await;
    let failures = app
        .get(
            &format!(
                "/admin/security/logs?user_id={}&action=LOGIN&status=FAILURE",
                user_id
            ),
            Some(&admin_token),
        )
        .await;
    assert_eq!(failures.status, StatusCode::OK);
    assert_eq!(failures.body["total"], 1);
    assert_eq!(failures.body["items"][0]["ip_address"], "198.51.100.10");

    let registrations = app
        .get("/admin/security/logs?action=REGISTER", Some(&admin_token))
        .await;
    assert_eq!(registrations.body["total"], 1);
}

#[tokio::test]
async fn test_resolving_an_alert() {
    let app = TestApp::new();
    app.register("target@example.com", "tenant").await;
    for _ in 0..5 {
        app.login("target@example.com", "wrong-password").await;
    }

    let (admin_id, admin_token) = app.admin().await;
    let open = app
        .get("/admin/security/alerts?resolved=false", Some(&admin_token))
        .await;
    assert_eq!(open.body["total"], 1);
    let alert_id = open.body["items"][0]["id"].as_str().unwrap().to_string();

    let resolved = app
        .post(
            &format!("/admin/security/alerts/{}/resolve", alert_id),
            Some(&admin_token),
            json!({}),
        )
        .await;
    assert_eq!(resolved.status, StatusCode::OK);
    assert_eq!(resolved.body["resolved"], true);
    assert_eq!(resolved.body["resolved_by"], admin_id.to_string());

    let open = app
        .get("/admin/security/alerts?resolved=false", Some(&admin_token))
        .await;
    assert_eq!(open.body["total"], 0);

    let summary = app.get("/admin/security/summary", Some(&admin_token)).await;
    assert_eq!(summary.body["alerts_raised"], 1);
    assert_eq!(summary.body["unresolved_alerts"], 0);

    let missing = app
        .post(
            &format!("/admin/security/alerts/{}/resolve", uuid::Uuid::new_v4()),
            Some(&admin_token),
            json!({}),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
