//! Admin security dashboard.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::security::{AlertQuery, SummaryQuery},
    middleware::AuthUser,
    models::ActivityFilter,
    utils::PageParams,
    AppState,
};

#[utoipa::path(
    get,
    path = "/admin/security/logs",
    params(ActivityFilter, PageParams),
    responses(
        (status = 200, description = "Page of activity entries, newest first"),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "Security",
    security(("bearer_auth" = []))
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(filter): Query<ActivityFilter>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.security_service.logs(&filter, &page).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/admin/security/alerts",
    params(AlertQuery, PageParams),
    responses(
        (status = 200, description = "Page of security alerts, newest first"),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "Security",
    security(("bearer_auth" = []))
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.security_service.alerts(query.resolved, &page).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/admin/security/alerts/{id}/resolve",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert resolved", body = SecurityAlert),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse)
    ),
    tag = "Security",
    security(("bearer_auth" = []))
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(alert_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let alert = state
        .security_service
        .resolve_alert(alert_id, admin.user_id)
        .await?;
    Ok(Json(alert))
}

/// Login outcome counts and alert totals over a trailing window
#[utoipa::path(
    get,
    path = "/admin/security/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Dashboard summary", body = SecuritySummary),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "Security",
    security(("bearer_auth" = []))
)]
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.security_service.summary(query.hours).await?;
    Ok(Json(summary))
}
