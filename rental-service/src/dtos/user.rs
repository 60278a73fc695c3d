use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::validate_not_blank;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,

    /// An empty string clears the phone number.
    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    #[schema(example = "+351 912 345 678")]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    /// Omitted only by accounts that have never had a password.
    pub current_password: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "newpassword123", min_length = 8)]
    pub new_password: String,
}
