use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::property::{CreatePropertyRequest, UpdatePropertyRequest},
    middleware::AuthUser,
    models::PropertyFilter,
    utils::{PageParams, ValidatedJson},
    AppState,
};

/// Search available properties
#[utoipa::path(
    get,
    path = "/properties",
    params(PropertyFilter, PageParams),
    responses((status = 200, description = "Page of available properties")),
    tag = "Properties"
)]
pub async fn search_properties(
    State(state): State<AppState>,
    Query(filter): Query<PropertyFilter>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.property_service.search(&filter, &page).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/properties/{id}",
    params(("id" = Uuid, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property", body = Property),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "Properties"
)]
pub async fn get_property(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let property = state.property_service.get(property_id).await?;
    Ok(Json(property))
}

/// List a property (landlords and admins)
#[utoipa::path(
    post,
    path = "/properties",
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Property listed", body = Property),
        (status = 403, description = "Tenants cannot list properties", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Properties",
    security(("bearer_auth" = []))
)]
pub async fn create_property(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let property = state
        .property_service
        .create(user.user_id, user.role, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// Edit a property (owning landlord)
#[utoipa::path(
    patch,
    path = "/properties/{id}",
    params(("id" = Uuid, Path, description = "Property id")),
    request_body = UpdatePropertyRequest,
    responses(
        (status = 200, description = "Property updated", body = Property),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "Properties",
    security(("bearer_auth" = []))
)]
pub async fn update_property(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let property = state
        .property_service
        .update(property_id, user.user_id, user.role, req.into())
        .await?;
    Ok(Json(property))
}
