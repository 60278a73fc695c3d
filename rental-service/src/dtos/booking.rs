use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::services::NewBooking;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub property_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2026-03-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2026-03-15")]
    pub end_date: NaiveDate,

    #[validate(length(max = 1000, message = "Message must be at most 1000 characters"))]
    #[schema(example = "We'd love to visit on Saturday.")]
    pub message: Option<String>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            property_id: req.property_id,
            start_date: req.start_date,
            end_date: req.end_date,
            message: req.message,
        }
    }
}
