pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{FromRef, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::Key;
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Environment, RentalConfig, SwaggerMode};
use crate::services::{
    AccountService, ActivityMonitor, AuthService, BookingService, JwtService, LeaseService,
    MfaService, OAuthClient, OAuthService, PropertyService, SecurityService, Store, TotpVerifier,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::metrics::metrics,
        handlers::auth::registration::register,
        handlers::auth::session::login,
        handlers::auth::session::mfa_login,
        handlers::auth::mfa::setup,
        handlers::auth::mfa::verify,
        handlers::auth::mfa::disable,
        handlers::auth::oauth::oauth_start,
        handlers::auth::oauth::oauth_link,
        handlers::auth::oauth::oauth_callback,
        handlers::auth::oauth::oauth_unlink,
        handlers::user::get_me,
        handlers::user::update_me,
        handlers::user::change_password,
        handlers::user::list_notifications,
        handlers::user::mark_notification_read,
        handlers::user::my_activity,
        handlers::user::get_user,
        handlers::lease::create_lease,
        handlers::lease::list_leases,
        handlers::lease::get_lease,
        handlers::lease::sign_lease,
        handlers::property::search_properties,
        handlers::property::get_property,
        handlers::property::create_property,
        handlers::property::update_property,
        handlers::booking::create_booking,
        handlers::booking::list_bookings,
        handlers::booking::confirm_booking,
        handlers::booking::reject_booking,
        handlers::booking::cancel_booking,
        handlers::security::list_logs,
        handlers::security::list_alerts,
        handlers::security::resolve_alert,
        handlers::security::summary,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::AuthResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::MfaLoginRequest,
            dtos::auth::MfaVerifyRequest,
            dtos::auth::MessageResponse,
            dtos::auth::AuthorizationUrlResponse,
            dtos::user::UpdateProfileRequest,
            dtos::user::ChangePasswordRequest,
            dtos::lease::CreateLeaseRequest,
            dtos::lease::SignLeaseRequest,
            dtos::property::CreatePropertyRequest,
            dtos::property::UpdatePropertyRequest,
            dtos::booking::CreateBookingRequest,
            services::TokenResponse,
            services::MfaSetupResponse,
            services::SecuritySummary,
            models::UserRole,
            models::UserResponse,
            models::PublicProfile,
            models::ActivityAction,
            models::ActivityStatus,
            models::ActivityLog,
            models::AlertKind,
            models::AlertSeverity,
            models::SecurityAlert,
            models::NotificationKind,
            models::Notification,
            models::LeaseStatus,
            models::Lease,
            models::Property,
            models::BookingStatus,
            models::Booking,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and password login"),
        (name = "MFA", description = "TOTP enrolment and MFA login"),
        (name = "OAuth", description = "Google and GitHub sign-in and account linking"),
        (name = "User", description = "Profile, notifications and own activity"),
        (name = "Leases", description = "Lease creation and two-party signing"),
        (name = "Properties", description = "Property listings and search"),
        (name = "Bookings", description = "Booking requests and decisions"),
        (name = "Security", description = "Admin security dashboard"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: RentalConfig,
    pub store: Arc<dyn Store>,
    pub jwt: JwtService,
    pub cookie_key: Key,
    pub auth_service: AuthService,
    pub mfa_service: MfaService,
    pub oauth_service: OAuthService,
    pub account_service: AccountService,
    pub lease_service: LeaseService,
    pub property_service: PropertyService,
    pub booking_service: BookingService,
    pub security_service: SecurityService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire every service over one store.
    pub fn new(
        config: RentalConfig,
        store: Arc<dyn Store>,
        oauth_client: Arc<dyn OAuthClient>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;
        let cookie_key = Key::from(Sha512::digest(config.security.cookie_secret.as_bytes()).as_slice());

        let monitor = ActivityMonitor::new(store.clone(), config.account_security.clone());
        let mfa_service = MfaService::new(
            store.clone(),
            monitor.clone(),
            TotpVerifier::new(&config.mfa),
        );
        let auth_service = AuthService::new(
            store.clone(),
            jwt.clone(),
            monitor.clone(),
            mfa_service.clone(),
        );
        let oauth_service = OAuthService::new(
            store.clone(),
            auth_service.clone(),
            monitor.clone(),
            oauth_client,
            config.oauth.clone(),
        );

        let rate_limit = &config.rate_limit;
        let login_rate_limiter =
            create_ip_rate_limiter(rate_limit.login_attempts, rate_limit.login_window_seconds);
        let register_rate_limiter = create_ip_rate_limiter(
            rate_limit.register_attempts,
            rate_limit.register_window_seconds,
        );
        let ip_rate_limiter = create_ip_rate_limiter(
            rate_limit.global_ip_limit,
            rate_limit.global_ip_window_seconds,
        );

        Ok(Self {
            account_service: AccountService::new(store.clone(), monitor.clone()),
            lease_service: LeaseService::new(store.clone(), monitor.clone()),
            property_service: PropertyService::new(store.clone()),
            booking_service: BookingService::new(store.clone(), monitor),
            security_service: SecurityService::new(store.clone()),
            config,
            store,
            jwt,
            cookie_key,
            auth_service,
            mfa_service,
            oauth_service,
            login_rate_limiter,
            register_rate_limiter,
            ip_rate_limiter,
            metrics,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    // Credential endpoints share the per-IP login budget.
    let login_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/mfa/login", post(handlers::auth::mfa_login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let admin_routes = Router::new()
        .route("/admin/security/logs", get(handlers::security::list_logs))
        .route("/admin/security/alerts", get(handlers::security::list_alerts))
        .route(
            "/admin/security/alerts/:id/resolve",
            post(handlers::security::resolve_alert),
        )
        .route("/admin/security/summary", get(handlers::security::summary))
        .layer(from_fn(middleware::admin_middleware));

    let protected_routes = Router::new()
        .route("/auth/mfa/setup", post(handlers::auth::mfa::setup))
        .route("/auth/mfa/verify", post(handlers::auth::mfa::verify))
        .route("/auth/mfa/disable", post(handlers::auth::mfa::disable))
        .route("/auth/oauth/:provider/link", post(handlers::auth::oauth_link))
        .route(
            "/auth/oauth/:provider",
            axum::routing::delete(handlers::auth::oauth_unlink),
        )
        .route(
            "/users/me",
            get(handlers::user::get_me).patch(handlers::user::update_me),
        )
        .route("/users/me/password", post(handlers::user::change_password))
        .route(
            "/users/me/notifications",
            get(handlers::user::list_notifications),
        )
        .route(
            "/users/me/notifications/:id/read",
            post(handlers::user::mark_notification_read),
        )
        .route("/users/me/activity", get(handlers::user::my_activity))
        .route("/users/:id", get(handlers::user::get_user))
        .route(
            "/leases",
            get(handlers::lease::list_leases).post(handlers::lease::create_lease),
        )
        .route("/leases/:id", get(handlers::lease::get_lease))
        .route("/leases/:id/sign", post(handlers::lease::sign_lease))
        .route("/properties", post(handlers::property::create_property))
        .route(
            "/properties/:id",
            axum::routing::patch(handlers::property::update_property),
        )
        .route(
            "/bookings",
            get(handlers::booking::list_bookings).post(handlers::booking::create_booking),
        )
        .route(
            "/bookings/:id/confirm",
            post(handlers::booking::confirm_booking),
        )
        .route("/bookings/:id/reject", post(handlers::booking::reject_booking))
        .route("/bookings/:id/cancel", post(handlers::booking::cancel_booking))
        .merge(admin_routes)
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    let swagger_enabled = match state.config.environment {
        Environment::Dev => true,
        Environment::Prod => state.config.swagger.enabled == SwaggerMode::Public,
    };

    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    app.route("/auth/oauth/:provider", get(handlers::auth::oauth_start))
        .route(
            "/auth/oauth/:provider/callback",
            get(handlers::auth::oauth_callback),
        )
        .route("/properties", get(handlers::property::search_properties))
        .route("/properties/:id", get(handlers::property::get_property))
        .merge(login_routes)
        .merge(register_route)
        .merge(protected_routes)
        .with_state(state.clone())
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
