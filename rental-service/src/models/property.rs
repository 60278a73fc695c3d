use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Property {
    pub id: Uuid,
    pub landlord_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub monthly_rent_cents: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public search filter. Only available properties are ever returned.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PropertyFilter {
    /// Case-insensitive exact city match.
    pub city: Option<String>,
    pub min_rent: Option<i64>,
    pub max_rent: Option<i64>,
    /// Minimum number of bedrooms.
    pub bedrooms: Option<i32>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        property.available
            && self
                .city
                .as_deref()
                .is_none_or(|c| property.city.eq_ignore_ascii_case(c))
            && self.min_rent.is_none_or(|r| property.monthly_rent_cents >= r)
            && self.max_rent.is_none_or(|r| property.monthly_rent_cents <= r)
            && self.bedrooms.is_none_or(|b| property.bedrooms >= b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(city: &str, rent: i64, bedrooms: i32) -> Property {
        let now = Utc::now();
        Property {
            id: Uuid::new_v4(),
            landlord_id: Uuid::new_v4(),
            title: "Flat".into(),
            description: String::new(),
            address: "1 Main St".into(),
            city: city.into(),
            monthly_rent_cents: rent,
            bedrooms,
            bathrooms: 1,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_filter_by_city_and_rent() {
        let filter = PropertyFilter {
            city: Some("lisbon".into()),
            max_rent: Some(120_000),
            ..Default::default()
        };
        assert!(filter.matches(&property("Lisbon", 100_000, 2)));
        assert!(!filter.matches(&property("Porto", 100_000, 2)));
        assert!(!filter.matches(&property("Lisbon", 150_000, 2)));
    }

    #[test]
    fn test_unavailable_never_matches() {
        let mut p = property("Lisbon", 100_000, 2);
        p.available = false;
        assert!(!PropertyFilter::default().matches(&p));
    }
}
