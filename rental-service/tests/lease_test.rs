mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_lease(app: &TestApp, landlord_token: &str, tenant_id: Uuid) -> Value {
    let res = app
        .post(
            "/leases",
            Some(landlord_token),
            json!({
                "tenant_id": tenant_id,
                "monthly_rent_cents": 145_000,
                "start_date": "2026-02-01",
                "end_date": "2027-01-31",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    res.body
}

#[tokio::test]
async fn test_lease_becomes_fully_signed_after_both_parties_sign() {
    let app = TestApp::new();
    let (tenant_id, tenant_token) = app.register("tenant@example.com", "tenant").await;
    let (landlord_id, landlord_token) = app.register("landlord@example.com", "landlord").await;

    let lease = create_lease(&app, &landlord_token, tenant_id).await;
    assert_eq!(lease["status"], "PENDING");
    assert_eq!(lease["landlord_id"], landlord_id.to_string());
    let lease_id = lease["id"].as_str().unwrap();

    let signed = app
        .post(
            &format!("/leases/{}/sign", lease_id),
            Some(&tenant_token),
            json!({ "signature": "Tina Tenant" }),
        )
        .await;
    assert_eq!(signed.status, StatusCode::OK);
    assert_eq!(signed.body["status"], "TENANT_SIGNED");
    assert_eq!(signed.body["tenant_signature"], "Tina Tenant");

    let inbox = app
        .get("/users/me/notifications", Some(&landlord_token))
        .await;
    assert_eq!(inbox.body["total"], 1);
    assert_eq!(inbox.body["items"][0]["kind"], "LEASE_SIGNED");
    assert_eq!(inbox.body["items"][0]["read"], false);

    let done = app
        .post(
            &format!("/leases/{}/sign", lease_id),
            Some(&landlord_token),
            json!({ "signature": "Larry Landlord" }),
        )
        .await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.body["status"], "FULLY_SIGNED");

    let tenant_view = app
        .get(&format!("/leases/{}", lease_id), Some(&tenant_token))
        .await;
    assert_eq!(tenant_view.body["status"], "FULLY_SIGNED");
}

#[tokio::test]
async fn test_landlord_may_sign_first() {
    let app = TestApp::new();
    let (tenant_id, _) = app.register("t@example.com", "tenant").await;
    let (_, landlord_token) = app.register("l@example.com", "landlord").await;
    let lease = create_lease(&app, &landlord_token, tenant_id).await;

    let res = app
        .post(
            &format!("/leases/{}/sign", lease["id"].as_str().unwrap()),
            Some(&landlord_token),
            json!({ "signature": "L" }),
        )
        .await;

    assert_eq!(res.body["status"], "LANDLORD_SIGNED");
}

#[tokio::test]
async fn test_outsider_cannot_view_or_sign() {
    let app = TestApp::new();
    let (tenant_id, _) = app.register("t@example.com", "tenant").await;
    let (_, landlord_token) = app.register("l@example.com", "landlord").await;
    let (_, outsider_token) = app.register("o@example.com", "tenant").await;
    let lease = create_lease(&app, &landlord_token, tenant_id).await;
    let lease_id = lease["id"].as_str().unwrap();

    let view = app
        .get(&format!("/leases/{}", lease_id), Some(&outsider_token))
        .await;
    assert_eq!(view.status, StatusCode::FORBIDDEN);

    let sign = app
        .post(
            &format!("/leases/{}/sign", lease_id),
            Some(&outsider_token),
            json!({ "signature": "Mallory" }),
        )
        .await;
    assert_eq!(sign.status, StatusCode::FORBIDDEN);

    let (_, admin_token) = app.admin().await;
    let admin_view = app
        .get(&format!("/leases/{}", lease_id), Some(&admin_token))
        .await;
    assert_eq!(admin_view.status, StatusCode::OK);
}

#[tokio::test]
async fn test_blank_signature_and_missing_lease() {
    let app = TestApp::new();
    let (_, token) = app.register("t@example.com", "tenant").await;

    let blank = app
        .post(
            &format!("/leases/{}/sign", Uuid::new_v4()),
            Some(&token),
            json!({ "signature": "   " }),
        )
        .await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing = app
        .post(
            &format!("/leases/{}/sign", Uuid::new_v4()),
            Some(&token),
            json!({ "signature": "Tina" }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_landlords_create_leases() {
    let app = TestApp::new();
    let (tenant_id, tenant_token) = app.register("t@example.com", "tenant").await;
    let (_, other_tenant_token) = app.register("t2@example.com", "tenant").await;
    let (_, landlord_token) = app.register("l@example.com", "landlord").await;

    let res = app
        .post(
            "/leases",
            Some(&other_tenant_token),
            json!({
                "tenant_id": tenant_id,
                "monthly_rent_cents": 100_000,
                "start_date": "2026-02-01",
                "end_date": "2027-01-31",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let backwards = app
        .post(
            "/leases",
            Some(&landlord_token),
            json!({
                "tenant_id": tenant_id,
                "monthly_rent_cents": 100_000,
                "start_date": "2027-01-31",
                "end_date": "2026-02-01",
            }),
        )
        .await;
    assert_eq!(backwards.status, StatusCode::UNPROCESSABLE_ENTITY);

    let listed = app.get("/leases", Some(&tenant_token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total"], 0);
}
