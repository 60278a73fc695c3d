mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn test_health_reports_store_status() {
    let app = TestApp::new();

    let res = app.get("/health", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "healthy");
    assert_eq!(res.body["service"], "rental-service");
    assert_eq!(res.body["checks"]["store"], "up");
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();

    let res = app.get("/health", None).await;

    assert!(res.headers.contains_key("x-request-id"));
    assert_eq!(
        res.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();

    let res = app.get("/.well-known/openapi.json", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["paths"]["/auth/login"].is_object());
    assert!(res.body["paths"]["/leases/{id}/sign"].is_object());
}

#[tokio::test]
async fn test_metrics_unavailable_without_recorder() {
    let app = TestApp::new();

    let res = app.get("/metrics", None).await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
}
