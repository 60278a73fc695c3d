use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::activity::ActivityMonitor;
use super::error::ServiceError;
use super::store::Store;
use crate::models::{
    ActivityAction, ActivityFilter, ActivityLog, ActivityStatus, Notification, PublicProfile,
    RequestOrigin, User,
};
use crate::utils::{Page, PageParams};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    monitor: ActivityMonitor,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, monitor: ActivityMonitor) -> Self {
        Self { store, monitor }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    pub async fn public_profile(&self, user_id: Uuid) -> Result<PublicProfile, ServiceError> {
        let user = self.get(user_id).await?;
        if !user.is_active {
            return Err(ServiceError::NotFound("User"));
        }
        Ok(PublicProfile::from(&user))
    }

    /// `phone: Some("")` clears the phone number.
    #[tracing::instrument(skip(self, name, phone, origin))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        phone: Option<String>,
        origin: &RequestOrigin,
    ) -> Result<User, ServiceError> {
        let mut user = self.get(user_id).await?;

        if let Some(name) = name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = phone {
            let phone = phone.trim();
            user.phone = (!phone.is_empty()).then(|| phone.to_string());
        }
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::ProfileUpdate,
                ActivityStatus::Success,
                origin,
                None,
            )
            .await;
        Ok(user)
    }

    pub async fn notifications(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<Page<Notification>, ServiceError> {
        let (items, total) = self.store.list_notifications(user_id, page).await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<(), ServiceError> {
        if self
            .store
            .mark_notification_read(user_id, notification_id)
            .await?
        {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Notification"))
        }
    }

    pub async fn activity(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<Page<ActivityLog>, ServiceError> {
        let filter = ActivityFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        let (items, total) = self.store.list_activity(&filter, page).await?;
        Ok(Page::new(items, page, total))
    }
}
