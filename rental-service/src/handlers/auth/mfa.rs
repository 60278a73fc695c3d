use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{MessageResponse, MfaVerifyRequest},
    middleware::AuthUser,
    models::RequestOrigin,
    utils::ValidatedJson,
    AppState,
};

/// Start MFA enrolment
///
/// Returns a fresh secret with its otpauth URL and QR code. MFA stays off
/// until a code is verified.
#[utoipa::path(
    post,
    path = "/auth/mfa/setup",
    responses(
        (status = 200, description = "Secret generated", body = MfaSetupResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "MFA already enabled", body = ErrorResponse)
    ),
    tag = "MFA",
    security(("bearer_auth" = []))
)]
pub async fn setup(
    State(state): State<AppState>,
    user: AuthUser,
    origin: RequestOrigin,
) -> Result<impl IntoResponse, AppError> {
    let res = state.mfa_service.setup(user.user_id, &origin).await?;
    Ok(Json(res))
}

/// Confirm MFA enrolment with a code from the authenticator app
#[utoipa::path(
    post,
    path = "/auth/mfa/verify",
    request_body = MfaVerifyRequest,
    responses(
        (status = 200, description = "MFA enabled", body = MessageResponse),
        (status = 401, description = "Invalid code", body = ErrorResponse),
        (status = 409, description = "MFA already enabled", body = ErrorResponse),
        (status = 422, description = "No pending MFA setup", body = ErrorResponse)
    ),
    tag = "MFA",
    security(("bearer_auth" = []))
)]
pub async fn verify(
    State(state): State<AppState>,
    user: AuthUser,
    origin: RequestOrigin,
    ValidatedJson(req): ValidatedJson<MfaVerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .mfa_service
        .enable(user.user_id, &req.code, &origin)
        .await?;
    Ok(Json(MessageResponse::new("MFA enabled")))
}

/// Turn MFA off and discard the secret
#[utoipa::path(
    post,
    path = "/auth/mfa/disable",
    responses(
        (status = 200, description = "MFA disabled", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "MFA",
    security(("bearer_auth" = []))
)]
pub async fn disable(
    State(state): State<AppState>,
    user: AuthUser,
    origin: RequestOrigin,
) -> Result<impl IntoResponse, AppError> {
    state.mfa_service.disable(user.user_id, &origin).await?;
    Ok(Json(MessageResponse::new("MFA disabled")))
}
