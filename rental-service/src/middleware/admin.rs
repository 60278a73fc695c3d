use axum::{extract::Request, middleware::Next, response::Response};
use service_core::error::AppError;

use super::auth::AuthUser;
use crate::models::UserRole;

/// Must run inside [`super::auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.role == UserRole::Admin => Ok(next.run(request).await),
        Some(user) => {
            tracing::warn!(user_id = %user.user_id, "Non-admin attempted admin access");
            Err(AppError::Forbidden(anyhow::anyhow!("Admin role required")))
        }
        None => Err(AppError::Unauthorized(anyhow::anyhow!(
            "Authentication required"
        ))),
    }
}
