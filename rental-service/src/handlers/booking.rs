use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::booking::CreateBookingRequest,
    middleware::AuthUser,
    utils::{PageParams, ValidatedJson},
    AppState,
};

/// Request a booking (tenants)
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking requested", body = Booking),
        (status = 403, description = "Only tenants can book", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 422, description = "Invalid dates or property unavailable", body = ErrorResponse)
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_service
        .create(user.user_id, user.role, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Own bookings (tenants) or bookings on own properties (landlords)
#[utoipa::path(
    get,
    path = "/bookings",
    params(PageParams),
    responses((status = 200, description = "Page of bookings")),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .booking_service
        .list(user.user_id, user.role, &page)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/confirm",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking confirmed", body = Booking),
        (status = 403, description = "Not the property owner", body = ErrorResponse),
        (status = 422, description = "Booking is not pending", body = ErrorResponse)
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.confirm(booking_id, user.user_id).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/reject",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking rejected", body = Booking),
        (status = 403, description = "Not the property owner", body = ErrorResponse),
        (status = 422, description = "Booking is not pending", body = ErrorResponse)
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
pub async fn reject_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.reject(booking_id, user.user_id).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 403, description = "Not the requesting tenant", body = ErrorResponse),
        (status = 422, description = "Booking already closed", body = ErrorResponse)
    ),
    tag = "Bookings",
    security(("bearer_auth" = []))
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.cancel(booking_id, user.user_id).await?;
    Ok(Json(booking))
}
