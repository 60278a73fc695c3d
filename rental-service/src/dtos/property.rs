use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::services::{NewProperty, PropertyChanges};
use crate::utils::validate_not_blank;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePropertyRequest {
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    #[schema(example = "Bright two-bedroom flat")]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,

    #[validate(length(max = 300), custom(function = "validate_not_blank"))]
    #[schema(example = "12 Rua Augusta")]
    pub address: String,

    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    #[schema(example = "Lisbon")]
    pub city: String,

    #[validate(range(min = 1, message = "Rent must be positive"))]
    #[schema(example = 110000)]
    pub monthly_rent_cents: i64,

    #[validate(range(min = 0, max = 50))]
    pub bedrooms: i32,

    #[validate(range(min = 0, max = 50))]
    pub bathrooms: i32,
}

impl From<CreatePropertyRequest> for NewProperty {
    fn from(req: CreatePropertyRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            address: req.address,
            city: req.city,
            monthly_rent_cents: req.monthly_rent_cents,
            bedrooms: req.bedrooms,
            bathrooms: req.bathrooms,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePropertyRequest {
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 300), custom(function = "validate_not_blank"))]
    pub address: Option<String>,
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub city: Option<String>,
    #[validate(range(min = 1, message = "Rent must be positive"))]
    pub monthly_rent_cents: Option<i64>,
    #[validate(range(min = 0, max = 50))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0, max = 50))]
    pub bathrooms: Option<i32>,
    pub available: Option<bool>,
}

impl From<UpdatePropertyRequest> for PropertyChanges {
    fn from(req: UpdatePropertyRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            address: req.address,
            city: req.city,
            monthly_rent_cents: req.monthly_rent_cents,
            bedrooms: req.bedrooms,
            bathrooms: req.bathrooms,
            available: req.available,
        }
    }
}
