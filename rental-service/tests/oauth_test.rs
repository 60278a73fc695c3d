mod common;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
};
use common::{request, TestApp};
use rental_service::services::OAuthProfile;
use serde_json::json;

fn profile(subject: &str, email: &str, verified: bool) -> OAuthProfile {
    OAuthProfile {
        subject: subject.to_string(),
        email: email.to_string(),
        email_verified: verified,
        name: Some("Olivia Auth".to_string()),
    }
}

fn location(headers: &HeaderMap) -> String {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string()
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Replays the signed flow cookies the way a browser would.
fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

async fn callback(app: &TestApp, cookies: &str, code: &str, state: &str) -> common::TestResponse {
    let req = Request::builder()
        .method(Method::GET)
        .uri(format!(
            "/auth/oauth/google/callback?code={}&state={}",
            code, state
        ))
        .header(header::COOKIE, cookies)
        .body(Body::empty())
        .unwrap();
    app.send(req).await
}

async fn start(app: &TestApp) -> (String, String) {
    let res = app.get("/auth/oauth/google", None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);

    let target = location(&res.headers);
    assert!(target.starts_with("https://accounts.google.com/"));
    assert_eq!(
        query_param(&target, "code_challenge_method").as_deref(),
        Some("S256")
    );
    (query_param(&target, "state").unwrap(), cookie_header(&res.headers))
}

#[tokio::test]
async fn test_first_sign_in_creates_a_tenant_account() {
    let app = TestApp::new();
    app.oauth
        .register_code("code-1", profile("g-123", "Olivia@Example.com", true));

    let (state, cookies) = start(&app).await;
    let res = callback(&app, &cookies, "code-1", &state).await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let target = location(&res.headers);
    assert!(target.starts_with("http://localhost:3000/oauth/callback?token="));

    let token = query_param(&target, "token").unwrap();
    let me = app.get("/users/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "olivia@example.com");
    assert_eq!(me.body["role"], "TENANT");
    assert_eq!(me.body["google_linked"], true);
    assert_eq!(me.body["has_password"], false);
}

#[tokio::test]
async fn test_sign_in_with_existing_email_links_the_account() {
    let app = TestApp::new();
    let (user_id, _) = app.register("known@example.com", "landlord").await;
    app.oauth
        .register_code("code-2", profile("g-456", "known@example.com", true));

    let (state, cookies) = start(&app).await;
    let res = callback(&app, &cookies, "code-2", &state).await;

    let token = query_param(&location(&res.headers), "token").unwrap();
    let me = app.get("/users/me", Some(&token)).await;
    assert_eq!(me.body["id"], user_id.to_string());
    assert_eq!(me.body["role"], "LANDLORD");
    assert_eq!(me.body["google_linked"], true);
}

#[tokio::test]
async fn test_state_mismatch_is_rejected() {
    let app = TestApp::new();
    app.oauth
        .register_code("code-3", profile("g-789", "x@example.com", true));

    let (_, cookies) = start(&app).await;
    let res = callback(&app, &cookies, "code-3", "forged-state").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let (state, _) = start(&app).await;
    let no_cookies = callback(&app, "", "code-3", &state).await;
    assert_eq!(no_cookies.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unverified_email_and_bad_code() {
    let app = TestApp::new();
    app.oauth
        .register_code("code-4", profile("g-000", "unverified@example.com", false));

    let (state, cookies) = start(&app).await;
    let unverified = callback(&app, &cookies, "code-4", &state).await;
    assert_eq!(unverified.status, StatusCode::UNPROCESSABLE_ENTITY);

    let (state, cookies) = start(&app).await;
    let unknown = callback(&app, &cookies, "never-issued", &state).await;
    assert_eq!(unknown.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_unknown_or_unconfigured_provider() {
    let app = TestApp::new();

    assert_eq!(
        app.get("/auth/oauth/myspace", None).await.status,
        StatusCode::NOT_FOUND
    );
    // GitHub is not configured in the test environment.
    assert_eq!(
        app.get("/auth/oauth/github", None).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_link_then_unlink_provider() {
    let app = TestApp::new();
    let (_, token) = app.register("linker@example.com", "tenant").await;
    app.oauth
        .register_code("code-5", profile("g-link", "other-address@example.com", true));

    let link = app
        .post("/auth/oauth/google/link", Some(&token), json!({}))
        .await;
    assert_eq!(link.status, StatusCode::OK);
    let url = link.body["authorization_url"].as_str().unwrap().to_string();
    let state = query_param(&url, "state").unwrap();

    let res = callback(&app, &cookie_header(&link.headers), "code-5", &state).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res.headers),
        "http://localhost:3000/oauth/callback?linked=google"
    );

    let me = app.get("/users/me", Some(&token)).await;
    assert_eq!(me.body["google_linked"], true);
    assert_eq!(me.body["email"], "linker@example.com");

    let unlink = app
        .send(request(Method::DELETE, "/auth/oauth/google", Some(&token), None))
        .await;
    assert_eq!(unlink.status, StatusCode::OK);
    assert_eq!(unlink.body["google_linked"], false);

    let again = app
        .send(request(Method::DELETE, "/auth/oauth/google", Some(&token), None))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cannot_unlink_the_only_sign_in_method() {
    let app = TestApp::new();
    app.oauth
        .register_code("code-6", profile("g-only", "only@example.com", true));

    let (state, cookies) = start(&app).await;
    let res = callback(&app, &cookies, "code-6", &state).await;
    let token = query_param(&location(&res.headers), "token").unwrap();

    let unlink = app
        .send(request(Method::DELETE, "/auth/oauth/google", Some(&token), None))
        .await;
    assert_eq!(unlink.status, StatusCode::UNPROCESSABLE_ENTITY);
}
