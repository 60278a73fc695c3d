use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        auth::MessageResponse,
        user::{ChangePasswordRequest, UpdateProfileRequest},
    },
    middleware::AuthUser,
    models::{RequestOrigin, UserResponse},
    utils::{PageParams, Password, ValidatedJson},
    AppState,
};

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.account_service.get(user.user_id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Update name and phone
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    origin: RequestOrigin,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .account_service
        .update_profile(user.user_id, req.name, req.phone, &origin)
        .await?;
    Ok(Json(UserResponse::from(&updated)))
}

/// Change (or, for provider-only accounts, set) the password
#[utoipa::path(
    post,
    path = "/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password incorrect", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    origin: RequestOrigin,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = req.current_password.map(Password::new);
    state
        .auth_service
        .change_password(
            user.user_id,
            current.as_ref(),
            &Password::new(req.new_password),
            &origin,
        )
        .await?;
    Ok(Json(MessageResponse::new("Password changed")))
}

/// List the current user's notifications, newest first
#[utoipa::path(
    get,
    path = "/users/me/notifications",
    params(PageParams),
    responses(
        (status = 200, description = "Page of notifications"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .account_service
        .notifications(user.user_id, &page)
        .await?;
    Ok(Json(page))
}

/// Mark one of the current user's notifications as read
#[utoipa::path(
    post,
    path = "/users/me/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read", body = MessageResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .account_service
        .mark_notification_read(user.user_id, notification_id)
        .await?;
    Ok(Json(MessageResponse::new("Notification marked as read")))
}

/// The current user's own activity log
#[utoipa::path(
    get,
    path = "/users/me/activity",
    params(PageParams),
    responses(
        (status = 200, description = "Page of activity entries"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn my_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.account_service.activity(user.user_id, &page).await?;
    Ok(Json(page))
}

/// Public profile of another user
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.account_service.public_profile(user_id).await?;
    Ok(Json(profile))
}
