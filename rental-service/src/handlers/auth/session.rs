use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginRequest, LoginResponse, MfaLoginRequest},
    models::RequestOrigin,
    services::LoginOutcome,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Login with email and password
///
/// Accounts with MFA enabled get `mfa_required: true` and their `user_id`
/// instead of a token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued or MFA challenge", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 423, description = "Account temporarily locked", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    origin: RequestOrigin,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .auth_service
        .login(&req.email, &Password::new(req.password), &origin)
        .await?;

    let body = match outcome {
        LoginOutcome::Authenticated { user, token } => LoginResponse::authenticated(&user, token),
        LoginOutcome::MfaRequired { user_id } => LoginResponse::mfa_required(user_id),
    };
    Ok(Json(body))
}

/// Exchange a TOTP code for a token after an MFA challenge
#[utoipa::path(
    post,
    path = "/auth/mfa/login",
    request_body = MfaLoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid code", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 423, description = "Account temporarily locked", body = ErrorResponse)
    ),
    tag = "MFA"
)]
pub async fn mfa_login(
    State(state): State<AppState>,
    origin: RequestOrigin,
    ValidatedJson(req): ValidatedJson<MfaLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = state
        .auth_service
        .complete_mfa_login(req.user_id, &req.code, &origin)
        .await?;
    Ok(Json(LoginResponse::authenticated(&user, token)))
}
