use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::lease::{CreateLeaseRequest, SignLeaseRequest},
    middleware::AuthUser,
    models::RequestOrigin,
    utils::{PageParams, ValidatedJson},
    AppState,
};

/// Create a lease for a tenant (landlords only)
#[utoipa::path(
    post,
    path = "/leases",
    request_body = CreateLeaseRequest,
    responses(
        (status = 201, description = "Lease created", body = Lease),
        (status = 403, description = "Caller is not a landlord", body = ErrorResponse),
        (status = 404, description = "Tenant or property not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Leases",
    security(("bearer_auth" = []))
)]
pub async fn create_lease(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateLeaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lease = state
        .lease_service
        .create(user.user_id, user.role, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(lease)))
}

/// Leases where the caller is tenant or landlord
#[utoipa::path(
    get,
    path = "/leases",
    params(PageParams),
    responses((status = 200, description = "Page of leases")),
    tag = "Leases",
    security(("bearer_auth" = []))
)]
pub async fn list_leases(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.lease_service.list_for_user(user.user_id, &page).await?;
    Ok(Json(page))
}

/// Get a lease (parties and admins)
#[utoipa::path(
    get,
    path = "/leases/{id}",
    params(("id" = Uuid, Path, description = "Lease id")),
    responses(
        (status = 200, description = "Lease", body = Lease),
        (status = 403, description = "Not a party", body = ErrorResponse),
        (status = 404, description = "Lease not found", body = ErrorResponse)
    ),
    tag = "Leases",
    security(("bearer_auth" = []))
)]
pub async fn get_lease(
    State(state): State<AppState>,
    user: AuthUser,
    Path(lease_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lease = state
        .lease_service
        .get(lease_id, user.user_id, user.role)
        .await?;
    Ok(Json(lease))
}

/// Sign a lease as whichever party the caller is
#[utoipa::path(
    post,
    path = "/leases/{id}/sign",
    params(("id" = Uuid, Path, description = "Lease id")),
    request_body = SignLeaseRequest,
    responses(
        (status = 200, description = "Signature recorded", body = Lease),
        (status = 403, description = "Not a party", body = ErrorResponse),
        (status = 404, description = "Lease not found", body = ErrorResponse),
        (status = 422, description = "Empty signature", body = ErrorResponse)
    ),
    tag = "Leases",
    security(("bearer_auth" = []))
)]
pub async fn sign_lease(
    State(state): State<AppState>,
    user: AuthUser,
    origin: RequestOrigin,
    Path(lease_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SignLeaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lease = state
        .lease_service
        .sign(lease_id, user.user_id, &req.signature, &origin)
        .await?;
    Ok(Json(lease))
}
