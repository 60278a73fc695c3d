use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] AppError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account temporarily locked due to repeated failed logins")]
    AccountLocked,

    #[error("Invalid verification code")]
    InvalidMfaCode,

    #[error("MFA is already enabled")]
    MfaAlreadyEnabled,

    #[error("MFA setup has not been started")]
    MfaNotConfigured,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => e,
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountLocked => AppError::Locked(anyhow::anyhow!(
                "Account temporarily locked due to repeated failed logins"
            )),
            ServiceError::InvalidMfaCode => {
                AppError::AuthError(anyhow::anyhow!("Invalid verification code"))
            }
            ServiceError::MfaAlreadyEnabled => {
                AppError::Conflict(anyhow::anyhow!("MFA is already enabled"))
            }
            ServiceError::MfaNotConfigured => {
                AppError::ValidationFailed(anyhow::anyhow!("MFA setup has not been started"))
            }
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::Forbidden(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ServiceError::AlreadyExists(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::Validation(msg) => AppError::ValidationFailed(anyhow::anyhow!(msg)),
            ServiceError::Provider(msg) => AppError::BadGateway(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::AccountLocked, StatusCode::LOCKED),
            (ServiceError::NotFound("Lease"), StatusCode::NOT_FOUND),
            (ServiceError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ServiceError::EmailAlreadyRegistered, StatusCode::CONFLICT),
            (ServiceError::Validation("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }
}
