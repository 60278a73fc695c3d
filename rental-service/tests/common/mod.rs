//! Shared setup for rental-service integration tests.
//!
//! Every test gets its own in-memory store and router; nothing touches
//! PostgreSQL or a real identity provider.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rental_service::{
    build_router,
    config::{
        AccountSecurityConfig, DatabaseConfig, Environment, JwtConfig, MfaConfig, OAuthConfig,
        OAuthProviderConfig, RateLimitConfig, RentalConfig, SecurityConfig, SwaggerConfig,
        SwaggerMode,
    },
    models::{User, UserRole},
    services::{InMemoryStore, MockOAuthClient, UserRepository},
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> RentalConfig {
    RentalConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "rental-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-jwt-secret-that-is-at-least-32-bytes".to_string(),
            issuer: "rental-service".to_string(),
            expiry_minutes: 60,
        },
        mfa: MfaConfig {
            issuer: "RentalTest".to_string(),
            skew_steps: 1,
            step_seconds: 30,
        },
        account_security: AccountSecurityConfig::default(),
        oauth: OAuthConfig {
            frontend_url: "http://localhost:3000".to_string(),
            google: Some(OAuthProviderConfig {
                client_id: "google-client".to_string(),
                client_secret: "google-secret".to_string(),
                redirect_uri: "http://localhost:8080/auth/oauth/google/callback".to_string(),
            }),
            github: None,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            cookie_secret: "test-cookie-secret-that-is-at-least-32-bytes".to_string(),
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Public,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            register_attempts: 1000,
            register_window_seconds: 60,
            global_ip_limit: 10_000,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub oauth: Arc<MockOAuthClient>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: RentalConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let oauth = Arc::new(MockOAuthClient::new());
        let state = AppState::new(config, store.clone(), oauth.clone(), None)
            .expect("Failed to build app state");
        Self {
            router: build_router(state.clone()),
            state,
            store,
            oauth,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::PATCH, uri, token, Some(body))).await
    }

    /// Register through the API and return (user id, access token).
    pub async fn register(&self, email: &str, role: &str) -> (Uuid, String) {
        let res = self
            .post(
                "/auth/register",
                None,
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "name": "Test User",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);
        (user_id_of(&res.body["user"]), token_of(&res.body))
    }

    /// Password login from a given IP and user agent.
    pub async fn login_from(
        &self,
        email: &str,
        password: &str,
        ip: &str,
        user_agent: &str,
    ) -> TestResponse {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .header(header::USER_AGENT, user_agent)
            .body(Body::from(
                json!({ "email": email, "password": password }).to_string(),
            ))
            .unwrap();
        self.send(req).await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.login_from(email, password, "198.51.100.10", "test-agent/1.0")
            .await
    }

    /// Admins cannot self-register; seed one and mint its token.
    pub async fn admin(&self) -> (Uuid, String) {
        let admin = User::new("admin@example.com", None, "Admin".into(), UserRole::Admin);
        self.store.insert_user(&admin).await.unwrap();
        let token = self.state.jwt.issue(&admin).unwrap();
        (admin.id, token.access_token)
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn token_of(body: &Value) -> String {
    body["token"]["access_token"]
        .as_str()
        .expect("response carries no access token")
        .to_string()
}

pub fn user_id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("no id in response")
}
