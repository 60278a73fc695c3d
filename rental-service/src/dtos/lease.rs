use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::services::NewLease;
use crate::utils::validate_not_blank;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLeaseRequest {
    pub property_id: Option<Uuid>,
    pub tenant_id: Uuid,

    #[validate(range(min = 1, message = "Rent must be positive"))]
    #[schema(example = 120000)]
    pub monthly_rent_cents: i64,

    #[schema(value_type = String, format = Date, example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-12-31")]
    pub end_date: NaiveDate,
}

impl From<CreateLeaseRequest> for NewLease {
    fn from(req: CreateLeaseRequest) -> Self {
        Self {
            property_id: req.property_id,
            tenant_id: req.tenant_id,
            monthly_rent_cents: req.monthly_rent_cents,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignLeaseRequest {
    #[validate(
        length(max = 200, message = "Signature must be at most 200 characters"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Jane Doe")]
    pub signature: String,
}
