//! Process-local `Store` used by tests and by local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::{
    ActivityRepository, AlertRepository, BookingRepository, LeaseRepository,
    NotificationRepository, PropertyRepository, Store, UserRepository,
};
use crate::models::{
    normalize_email, ActivityAction, ActivityFilter, ActivityLog, ActivityStatus, Booking,
    IdentProvider, Lease, Notification, Property, PropertyFilter, SecurityAlert, User,
};
use crate::utils::PageParams;

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    activity: Mutex<Vec<ActivityLog>>,
    alerts: Mutex<Vec<SecurityAlert>>,
    notifications: Mutex<Vec<Notification>>,
    leases: Mutex<HashMap<Uuid, Lease>>,
    properties: Mutex<HashMap<Uuid, Property>>,
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("In-memory store mutex poisoned: {}", e)))
}

/// Sort newest first, then slice out the requested page.
fn paginate<T: Clone>(
    mut items: Vec<T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
    page: &PageParams,
) -> (Vec<T>, i64) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    let total = items.len() as i64;
    (page.apply(&items), total)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(anyhow::anyhow!("Email already registered")));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(lock(&self.users)?.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        Ok(lock(&self.users)?.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_provider(
        &self,
        provider: IdentProvider,
        subject: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.provider_id(provider) == Some(subject))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AppError::Conflict(anyhow::anyhow!("Email already registered")));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("User not found"))),
        }
    }
}

#[async_trait]
impl ActivityRepository for InMemoryStore {
    async fn insert_activity(&self, log: &ActivityLog) -> Result<(), AppError> {
        lock(&self.activity)?.push(log.clone());
        Ok(())
    }

    async fn count_activity(
        &self,
        user_id: Uuid,
        action: ActivityAction,
        status: ActivityStatus,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count = lock(&self.activity)?
            .iter()
            .filter(|l| {
                l.user_id == Some(user_id)
                    && l.action == action
                    && l.status == status
                    && l.created_at >= since
            })
            .count();
        Ok(count as i64)
    }

    async fn recent_activity(
        &self,
        user_id: Uuid,
        action: ActivityAction,
        status: ActivityStatus,
        since: DateTime<Utc>,
        limit: i64,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ActivityLog>, AppError> {
        let mut logs: Vec<ActivityLog> = lock(&self.activity)?
            .iter()
            .filter(|l| {
                l.user_id == Some(user_id)
                    && l.action == action
                    && l.status == status
                    && l.created_at >= since
                    && Some(l.id) != exclude
            })
            .cloned()
            .collect();
        logs.sort_by_key(|l| std::cmp::Reverse(l.created_at));
        logs.truncate(limit.max(0) as usize);
        Ok(logs)
    }

    async fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: &PageParams,
    ) -> Result<(Vec<ActivityLog>, i64), AppError> {
        let logs: Vec<ActivityLog> = lock(&self.activity)?
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        Ok(paginate(logs, |l| l.created_at, page))
    }

    async fn count_activity_by_status(
        &self,
        action: ActivityAction,
        since: DateTime<Utc>,
    ) -> Result<Vec<(ActivityStatus, i64)>, AppError> {
        let mut counts: HashMap<ActivityStatus, i64> = HashMap::new();
        for log in lock(&self.activity)?
            .iter()
            .filter(|l| l.action == action && l.created_at >= since)
        {
            *counts.entry(log.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl AlertRepository for InMemoryStore {
    async fn insert_alert(&self, alert: &SecurityAlert) -> Result<(), AppError> {
        lock(&self.alerts)?.push(alert.clone());
        Ok(())
    }

    async fn find_alert(&self, alert_id: Uuid) -> Result<Option<SecurityAlert>, AppError> {
        Ok(lock(&self.alerts)?.iter().find(|a| a.id == alert_id).cloned())
    }

    async fn update_alert(&self, alert: &SecurityAlert) -> Result<(), AppError> {
        let mut alerts = lock(&self.alerts)?;
        match alerts.iter_mut().find(|a| a.id == alert.id) {
            Some(existing) => {
                *existing = alert.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("Alert not found"))),
        }
    }

    async fn list_alerts(
        &self,
        resolved: Option<bool>,
        page: &PageParams,
    ) -> Result<(Vec<SecurityAlert>, i64), AppError> {
        let alerts: Vec<SecurityAlert> = lock(&self.alerts)?
            .iter()
            .filter(|a| resolved.is_none_or(|r| a.resolved == r))
            .cloned()
            .collect();
        Ok(paginate(alerts, |a| a.created_at, page))
    }

    async fn count_alerts(
        &self,
        resolved: Option<bool>,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let count = lock(&self.alerts)?
            .iter()
            .filter(|a| resolved.is_none_or(|r| a.resolved == r))
            .filter(|a| since.is_none_or(|s| a.created_at >= s))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        lock(&self.notifications)?.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        let notifications: Vec<Notification> = lock(&self.notifications)?
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(notifications, |n| n.created_at, page))
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut notifications = lock(&self.notifications)?;
        match notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LeaseRepository for InMemoryStore {
    async fn insert_lease(&self, lease: &Lease) -> Result<(), AppError> {
        lock(&self.leases)?.insert(lease.id, lease.clone());
        Ok(())
    }

    async fn find_lease(&self, lease_id: Uuid) -> Result<Option<Lease>, AppError> {
        Ok(lock(&self.leases)?.get(&lease_id).cloned())
    }

    async fn update_lease(&self, lease: &Lease) -> Result<(), AppError> {
        match lock(&self.leases)?.get_mut(&lease.id) {
            Some(existing) => {
                *existing = lease.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("Lease not found"))),
        }
    }

    async fn list_leases_for_user(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Lease>, i64), AppError> {
        let leases: Vec<Lease> = lock(&self.leases)?
            .values()
            .filter(|l| l.tenant_id == user_id || l.landlord_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(leases, |l| l.created_at, page))
    }
}

#[async_trait]
impl PropertyRepository for InMemoryStore {
    async fn insert_property(&self, property: &Property) -> Result<(), AppError> {
        lock(&self.properties)?.insert(property.id, property.clone());
        Ok(())
    }

    async fn find_property(&self, property_id: Uuid) -> Result<Option<Property>, AppError> {
        Ok(lock(&self.properties)?.get(&property_id).cloned())
    }

    async fn update_property(&self, property: &Property) -> Result<(), AppError> {
        match lock(&self.properties)?.get_mut(&property.id) {
            Some(existing) => {
                *existing = property.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("Property not found"))),
        }
    }

    async fn search_properties(
        &self,
        filter: &PropertyFilter,
        page: &PageParams,
    ) -> Result<(Vec<Property>, i64), AppError> {
        let properties: Vec<Property> = lock(&self.properties)?
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(paginate(properties, |p| p.created_at, page))
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        lock(&self.bookings)?.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(lock(&self.bookings)?.get(&booking_id).cloned())
    }

    async fn update_booking(&self, booking: &Booking) -> Result<(), AppError> {
        match lock(&self.bookings)?.get_mut(&booking.id) {
            Some(existing) => {
                *existing = booking.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("Booking not found"))),
        }
    }

    async fn list_bookings_for_tenant(
        &self,
        tenant_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        let bookings: Vec<Booking> = lock(&self.bookings)?
            .values()
            .filter(|b| b.tenant_id == tenant_id)
            .cloned()
            .collect();
        Ok(paginate(bookings, |b| b.created_at, page))
    }

    async fn list_bookings_for_landlord(
        &self,
        landlord_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        let owned: Vec<Uuid> = lock(&self.properties)?
            .values()
            .filter(|p| p.landlord_id == landlord_id)
            .map(|p| p.id)
            .collect();
        let bookings: Vec<Booking> = lock(&self.bookings)?
            .values()
            .filter(|b| owned.contains(&b.property_id))
            .cloned()
            .collect();
        Ok(paginate(bookings, |b| b.created_at, page))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
