//! Read side of the activity log and alert queue for administrators.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::ServiceError;
use super::store::Store;
use crate::models::{ActivityAction, ActivityFilter, ActivityLog, ActivityStatus, SecurityAlert};
use crate::utils::{Page, PageParams};

pub const DEFAULT_SUMMARY_HOURS: i64 = 24;
pub const MAX_SUMMARY_HOURS: i64 = 720;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SecuritySummary {
    pub window_hours: i64,
    pub since: DateTime<Utc>,
    pub login_success: i64,
    pub login_failure: i64,
    pub login_blocked: i64,
    pub alerts_raised: i64,
    pub unresolved_alerts: i64,
}

#[derive(Clone)]
pub struct SecurityService {
    store: Arc<dyn Store>,
}

impl SecurityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn logs(
        &self,
        filter: &ActivityFilter,
        page: &PageParams,
    ) -> Result<Page<ActivityLog>, ServiceError> {
        let (items, total) = self.store.list_activity(filter, page).await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn alerts(
        &self,
        resolved: Option<bool>,
        page: &PageParams,
    ) -> Result<Page<SecurityAlert>, ServiceError> {
        let (items, total) = self.store.list_alerts(resolved, page).await?;
        Ok(Page::new(items, page, total))
    }

    /// Resolving an already resolved alert keeps the first resolver.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_alert(
        &self,
        alert_id: Uuid,
        admin_id: Uuid,
    ) -> Result<SecurityAlert, ServiceError> {
        let mut alert = self
            .store
            .find_alert(alert_id)
            .await?
            .ok_or(ServiceError::NotFound("Alert"))?;

        if !alert.resolved {
            alert.resolve(admin_id);
            self.store.update_alert(&alert).await?;
            tracing::info!(alert_id = %alert.id, "Security alert resolved");
        }
        Ok(alert)
    }

    pub async fn summary(&self, hours: Option<i64>) -> Result<SecuritySummary, ServiceError> {
        let window_hours = hours
            .unwrap_or(DEFAULT_SUMMARY_HOURS)
            .clamp(1, MAX_SUMMARY_HOURS);
        let since = Utc::now() - Duration::hours(window_hours);

        let counts = self
            .store
            .count_activity_by_status(ActivityAction::Login, since)
            .await?;
        let count_of = |status: ActivityStatus| {
            counts
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, n)| *n)
        };

        Ok(SecuritySummary {
            window_hours,
            since,
            login_success: count_of(ActivityStatus::Success),
            login_failure: count_of(ActivityStatus::Failure),
            login_blocked: count_of(ActivityStatus::Blocked),
            alerts_raised: self.store.count_alerts(None, Some(since)).await?,
            unresolved_alerts: self.store.count_alerts(Some(false), None).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestOrigin;
    use crate::services::store::{ActivityRepository, AlertRepository};
    use crate::services::InMemoryStore;

    #[tokio::test]
    async fn test_summary_counts_logins_and_alerts() {
        let store = Arc::new(InMemoryStore::new());
        let service = SecurityService::new(store.clone());
        let user_id = Uuid::new_v4();
        let origin = RequestOrigin::default();

        for status in [
            ActivityStatus::Success,
            ActivityStatus::Failure,
            ActivityStatus::Failure,
            ActivityStatus::Blocked,
        ] {
            let log = ActivityLog::new(Some(user_id), ActivityAction::Login, status, &origin, None);
            store.insert_activity(&log).await.unwrap();
        }
        store
            .insert_alert(&SecurityAlert::brute_force(user_id, None, 5))
            .await
            .unwrap();

        let summary = service.summary(None).await.unwrap();
        assert_eq!(summary.window_hours, 24);
        assert_eq!(summary.login_success, 1);
        assert_eq!(summary.login_failure, 2);
        assert_eq!(summary.login_blocked, 1);
        assert_eq!(summary.alerts_raised, 1);
        assert_eq!(summary.unresolved_alerts, 1);
    }

    #[tokio::test]
    async fn test_summary_window_is_clamped() {
        let service = SecurityService::new(Arc::new(InMemoryStore::new()));
        assert_eq!(service.summary(Some(0)).await.unwrap().window_hours, 1);
        assert_eq!(service.summary(Some(10_000)).await.unwrap().window_hours, 720);
    }

    #[tokio::test]
    async fn test_resolve_keeps_first_resolver() {
        let store = Arc::new(InMemoryStore::new());
        let service = SecurityService::new(store.clone());
        let alert = SecurityAlert::brute_force(Uuid::new_v4(), None, 5);
        store.insert_alert(&alert).await.unwrap();

        let first = Uuid::new_v4();
        service.resolve_alert(alert.id, first).await.unwrap();
        let again = service.resolve_alert(alert.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(again.resolved_by, Some(first));

        let summary = service.summary(None).await.unwrap();
        assert_eq!(summary.unresolved_alerts, 0);
    }
}
