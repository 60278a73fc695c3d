use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{AuthResponse, RegisterRequest},
    models::{RequestOrigin, UserRole},
    utils::{Password, ValidatedJson},
    AppState,
};

/// Register a tenant or landlord account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Malformed JSON", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    origin: RequestOrigin,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = req
        .role
        .parse::<UserRole>()
        .map_err(|e| AppError::ValidationFailed(anyhow::anyhow!(e)))?;

    let (user, token) = state
        .auth_service
        .register(&req.email, &Password::new(req.password), &req.name, role, &origin)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::new(&user, token))))
}
