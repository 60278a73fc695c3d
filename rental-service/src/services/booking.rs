//! Booking requests and landlord decisions.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::activity::ActivityMonitor;
use super::error::ServiceError;
use super::store::Store;
use crate::models::{Booking, BookingStatus, Notification, NotificationKind, Property, UserRole};
use crate::utils::{Page, PageParams};

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
    monitor: ActivityMonitor,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>, monitor: ActivityMonitor) -> Self {
        Self { store, monitor }
    }

    async fn load(&self, booking_id: Uuid) -> Result<(Booking, Property), ServiceError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or(ServiceError::NotFound("Booking"))?;
        let property = self
            .store
            .find_property(booking.property_id)
            .await?
            .ok_or(ServiceError::NotFound("Property"))?;
        Ok((booking, property))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        role: UserRole,
        request: NewBooking,
    ) -> Result<Booking, ServiceError> {
        if role != UserRole::Tenant {
            return Err(ServiceError::Forbidden(
                "Only tenants can request bookings".to_string(),
            ));
        }
        if request.end_date <= request.start_date {
            return Err(ServiceError::Validation(
                "end_date must be after start_date".to_string(),
            ));
        }

        let property = self
            .store
            .find_property(request.property_id)
            .await?
            .ok_or(ServiceError::NotFound("Property"))?;
        if !property.available {
            return Err(ServiceError::Validation(
                "Property is not available".to_string(),
            ));
        }

        let booking = Booking::new(
            property.id,
            tenant_id,
            request.start_date,
            request.end_date,
            request.message.filter(|m| !m.trim().is_empty()),
        );
        self.store.insert_booking(&booking).await?;

        self.monitor
            .notify(Notification::new(
                property.landlord_id,
                NotificationKind::BookingUpdate,
                "New booking request",
                format!(
                    "A booking was requested for \"{}\" from {} to {}.",
                    property.title, booking.start_date, booking.end_date
                ),
            ))
            .await;

        tracing::info!(booking_id = %booking.id, property_id = %property.id, "Booking requested");
        Ok(booking)
    }

    /// Tenants see their own requests; landlords and admins see requests on
    /// properties they own.
    pub async fn list(
        &self,
        user_id: Uuid,
        role: UserRole,
        page: &PageParams,
    ) -> Result<Page<Booking>, ServiceError> {
        let (items, total) = match role {
            UserRole::Tenant => self.store.list_bookings_for_tenant(user_id, page).await?,
            UserRole::Landlord | UserRole::Admin => {
                self.store.list_bookings_for_landlord(user_id, page).await?
            }
        };
        Ok(Page::new(items, page, total))
    }

    pub async fn confirm(&self, booking_id: Uuid, user_id: Uuid) -> Result<Booking, ServiceError> {
        self.decide(booking_id, user_id, BookingStatus::Confirmed).await
    }

    pub async fn reject(&self, booking_id: Uuid, user_id: Uuid) -> Result<Booking, ServiceError> {
        self.decide(booking_id, user_id, BookingStatus::Rejected).await
    }

    #[tracing::instrument(skip(self))]
    async fn decide(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        next: BookingStatus,
    ) -> Result<Booking, ServiceError> {
        let (mut booking, property) = self.load(booking_id).await?;
        if property.landlord_id != user_id {
            return Err(ServiceError::Forbidden(
                "Only the property owner can decide on this booking".to_string(),
            ));
        }
        self.transition(&mut booking, next).await?;

        self.monitor
            .notify(Notification::new(
                booking.tenant_id,
                NotificationKind::BookingUpdate,
                "Booking updated",
                format!(
                    "Your booking for \"{}\" is now {}.",
                    property.title,
                    booking.status.as_str()
                ),
            ))
            .await;
        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, booking_id: Uuid, user_id: Uuid) -> Result<Booking, ServiceError> {
        let (mut booking, property) = self.load(booking_id).await?;
        if booking.tenant_id != user_id {
            return Err(ServiceError::Forbidden(
                "Only the requesting tenant can cancel this booking".to_string(),
            ));
        }
        self.transition(&mut booking, BookingStatus::Cancelled).await?;

        self.monitor
            .notify(Notification::new(
                property.landlord_id,
                NotificationKind::BookingUpdate,
                "Booking cancelled",
                format!("A booking for \"{}\" was cancelled.", property.title),
            ))
            .await;
        Ok(booking)
    }

    async fn transition(
        &self,
        booking: &mut Booking,
        next: BookingStatus,
    ) -> Result<(), ServiceError> {
        if !booking.status.can_transition_to(next) {
            return Err(ServiceError::Validation(format!(
                "Cannot move booking from {} to {}",
                booking.status.as_str(),
                next.as_str()
            )));
        }
        booking.status = next;
        booking.updated_at = Utc::now();
        self.store.update_booking(booking).await?;
        tracing::info!(booking_id = %booking.id, status = next.as_str(), "Booking status changed");
        Ok(())
    }
}
