use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ServiceError;
use super::store::Store;
use crate::models::{Property, PropertyFilter, UserRole};
use crate::utils::{Page, PageParams};

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub monthly_rent_cents: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub monthly_rent_cents: Option<i64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub available: Option<bool>,
}

#[derive(Clone)]
pub struct PropertyService {
    store: Arc<dyn Store>,
}

impl PropertyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        role: UserRole,
        input: NewProperty,
    ) -> Result<Property, ServiceError> {
        if role == UserRole::Tenant {
            return Err(ServiceError::Forbidden(
                "Only landlords can list properties".to_string(),
            ));
        }

        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            landlord_id: owner_id,
            title: input.title.trim().to_string(),
            description: input.description,
            address: input.address.trim().to_string(),
            city: input.city.trim().to_string(),
            monthly_rent_cents: input.monthly_rent_cents,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            available: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_property(&property).await?;
        tracing::info!(property_id = %property.id, "Property listed");
        Ok(property)
    }

    pub async fn get(&self, property_id: Uuid) -> Result<Property, ServiceError> {
        self.store
            .find_property(property_id)
            .await?
            .ok_or(ServiceError::NotFound("Property"))
    }

    pub async fn search(
        &self,
        filter: &PropertyFilter,
        page: &PageParams,
    ) -> Result<Page<Property>, ServiceError> {
        let (items, total) = self.store.search_properties(filter, page).await?;
        Ok(Page::new(items, page, total))
    }

    #[tracing::instrument(skip(self, changes))]
    pub async fn update(
        &self,
        property_id: Uuid,
        user_id: Uuid,
        role: UserRole,
        changes: PropertyChanges,
    ) -> Result<Property, ServiceError> {
        let mut property = self.get(property_id).await?;
        if property.landlord_id != user_id && role != UserRole::Admin {
            return Err(ServiceError::Forbidden(
                "Only the owning landlord can edit this property".to_string(),
            ));
        }

        if let Some(title) = changes.title {
            property.title = title.trim().to_string();
        }
        if let Some(description) = changes.description {
            property.description = description;
        }
        if let Some(address) = changes.address {
            property.address = address.trim().to_string();
        }
        if let Some(city) = changes.city {
            property.city = city.trim().to_string();
        }
        if let Some(rent) = changes.monthly_rent_cents {
            property.monthly_rent_cents = rent;
        }
        if let Some(bedrooms) = changes.bedrooms {
            property.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = changes.bathrooms {
            property.bathrooms = bathrooms;
        }
        if let Some(available) = changes.available {
            property.available = available;
        }
        property.updated_at = Utc::now();

        self.store.update_property(&property).await?;
        Ok(property)
    }
}
