use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{User, UserResponse, UserRole};
use crate::services::TokenResponse;
use crate::utils::{validate_not_blank, validate_totp_code};

fn validate_registration_role(role: &str) -> Result<(), ValidationError> {
    match role.parse::<UserRole>() {
        Ok(UserRole::Tenant) | Ok(UserRole::Landlord) => Ok(()),
        _ => Err(ValidationError::new("role")
            .with_message("Role must be either tenant or landlord".into())),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "tenant@example.com")]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,

    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Jane Doe")]
    pub name: String,

    #[validate(custom(function = "validate_registration_role"))]
    #[schema(example = "tenant")]
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: TokenResponse,
}

impl AuthResponse {
    pub fn new(user: &User, token: TokenResponse) -> Self {
        Self {
            user: UserResponse::from(user),
            token,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "tenant@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

/// Either a token or an MFA challenge carrying the user id.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub mfa_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenResponse>,
}

impl LoginResponse {
    pub fn authenticated(user: &User, token: TokenResponse) -> Self {
        Self {
            mfa_required: false,
            user_id: Some(user.id),
            user: Some(UserResponse::from(user)),
            token: Some(token),
        }
    }

    pub fn mfa_required(user_id: Uuid) -> Self {
        Self {
            mfa_required: true,
            user_id: Some(user_id),
            user: None,
            token: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MfaLoginRequest {
    pub user_id: Uuid,

    #[validate(custom(function = "validate_totp_code"))]
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MfaVerifyRequest {
    #[validate(custom(function = "validate_totp_code"))]
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "MFA enabled")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizationUrlResponse {
    #[schema(example = "https://accounts.google.com/o/oauth2/v2/auth?client_id=...")]
    pub authorization_url: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
