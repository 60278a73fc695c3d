//! Persistence seams. `Database` implements these against PostgreSQL and
//! `InMemoryStore` against process memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    ActivityAction, ActivityFilter, ActivityLog, ActivityStatus, Booking, IdentProvider, Lease,
    Notification, Property, PropertyFilter, SecurityAlert, User,
};
use crate::utils::PageParams;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `AppError::Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
    /// Case-insensitive.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_provider(
        &self,
        provider: IdentProvider,
        subject: &str,
    ) -> Result<Option<User>, AppError>;
    async fn update_user(&self, user: &User) -> Result<(), AppError>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn insert_activity(&self, log: &ActivityLog) -> Result<(), AppError>;

    async fn count_activity(
        &self,
        user_id: Uuid,
        action: ActivityAction,
        status: ActivityStatus,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Newest first, at most `limit` rows, skipping `exclude`.
    async fn recent_activity(
        &self,
        user_id: Uuid,
        action: ActivityAction,
        status: ActivityStatus,
        since: DateTime<Utc>,
        limit: i64,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ActivityLog>, AppError>;

    /// Newest first, with the total number of matching rows.
    async fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: &PageParams,
    ) -> Result<(Vec<ActivityLog>, i64), AppError>;

    async fn count_activity_by_status(
        &self,
        action: ActivityAction,
        since: DateTime<Utc>,
    ) -> Result<Vec<(ActivityStatus, i64)>, AppError>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert_alert(&self, alert: &SecurityAlert) -> Result<(), AppError>;
    async fn find_alert(&self, alert_id: Uuid) -> Result<Option<SecurityAlert>, AppError>;
    async fn update_alert(&self, alert: &SecurityAlert) -> Result<(), AppError>;
    async fn list_alerts(
        &self,
        resolved: Option<bool>,
        page: &PageParams,
    ) -> Result<(Vec<SecurityAlert>, i64), AppError>;
    async fn count_alerts(
        &self,
        resolved: Option<bool>,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError>;
    async fn list_notifications(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Notification>, i64), AppError>;
    /// Returns false when no such notification belongs to the user.
    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait LeaseRepository: Send + Sync {
    async fn insert_lease(&self, lease: &Lease) -> Result<(), AppError>;
    async fn find_lease(&self, lease_id: Uuid) -> Result<Option<Lease>, AppError>;
    async fn update_lease(&self, lease: &Lease) -> Result<(), AppError>;
    /// Leases where the user is tenant or landlord.
    async fn list_leases_for_user(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Lease>, i64), AppError>;
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn insert_property(&self, property: &Property) -> Result<(), AppError>;
    async fn find_property(&self, property_id: Uuid) -> Result<Option<Property>, AppError>;
    async fn update_property(&self, property: &Property) -> Result<(), AppError>;
    async fn search_properties(
        &self,
        filter: &PropertyFilter,
        page: &PageParams,
    ) -> Result<(Vec<Property>, i64), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError>;
    async fn find_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, AppError>;
    async fn update_booking(&self, booking: &Booking) -> Result<(), AppError>;
    async fn list_bookings_for_tenant(
        &self,
        tenant_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Booking>, i64), AppError>;
    /// Bookings on properties owned by the landlord.
    async fn list_bookings_for_landlord(
        &self,
        landlord_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Booking>, i64), AppError>;
}

/// Everything the service needs from persistence, injected as `Arc<dyn Store>`.
#[async_trait]
pub trait Store:
    UserRepository
    + ActivityRepository
    + AlertRepository
    + NotificationRepository
    + LeaseRepository
    + PropertyRepository
    + BookingRepository
{
    async fn health_check(&self) -> Result<(), AppError>;
}
