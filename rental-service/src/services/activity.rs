//! Activity recording, brute-force lockout and new-device detection.
//!
//! Writes made here are monitoring side effects: failures are logged and
//! swallowed so they never fail the request that triggered them. Reads that
//! gate a decision (the lockout count) do propagate.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::error::ServiceError;
use super::store::Store;
use crate::config::AccountSecurityConfig;
use crate::models::{
    ActivityAction, ActivityLog, ActivityStatus, Notification, NotificationKind, RequestOrigin,
    SecurityAlert,
};

#[derive(Clone)]
pub struct ActivityMonitor {
    store: Arc<dyn Store>,
    policy: AccountSecurityConfig,
}

impl ActivityMonitor {
    pub fn new(store: Arc<dyn Store>, policy: AccountSecurityConfig) -> Self {
        Self { store, policy }
    }

    /// Append an activity entry. Returns its id when the write succeeded.
    pub async fn record(
        &self,
        user_id: Option<Uuid>,
        action: ActivityAction,
        status: ActivityStatus,
        origin: &RequestOrigin,
        details: Option<String>,
    ) -> Option<Uuid> {
        let log = ActivityLog::new(user_id, action, status, origin, details);
        match self.store.insert_activity(&log).await {
            Ok(()) => Some(log.id),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = ?user_id,
                    action = action.as_str(),
                    status = status.as_str(),
                    "Failed to write activity log"
                );
                None
            }
        }
    }

    /// Failed logins inside the trailing lockout window. Blocked attempts are not counted.
    pub async fn recent_failures(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        let since = Utc::now() - Duration::minutes(self.policy.lockout_window_minutes);
        Ok(self
            .store
            .count_activity(user_id, ActivityAction::Login, ActivityStatus::Failure, since)
            .await?)
    }

    pub async fn is_locked(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.recent_failures(user_id).await? >= self.policy.lockout_threshold)
    }

    /// Record a refused attempt against a locked account.
    pub async fn record_blocked(&self, user_id: Uuid, origin: &RequestOrigin) {
        tracing::warn!(user_id = %user_id, ip = ?origin.ip_address, "Login blocked by lockout");
        self.record(
            Some(user_id),
            ActivityAction::Login,
            ActivityStatus::Blocked,
            origin,
            Some("account locked".to_string()),
        )
        .await;
    }

    /// Record a failed login and raise a brute-force alert when this failure
    /// is the one that reaches the threshold.
    pub async fn record_login_failure(&self, user_id: Uuid, origin: &RequestOrigin, reason: &str) {
        if self
            .record(
                Some(user_id),
                ActivityAction::Login,
                ActivityStatus::Failure,
                origin,
                Some(reason.to_string()),
            )
            .await
            .is_none()
        {
            return;
        }

        let failures = match self.recent_failures(user_id).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Failed to count login failures");
                return;
            }
        };

        if failures == self.policy.lockout_threshold {
            tracing::warn!(user_id = %user_id, failures, "Brute-force threshold reached");
            let alert = SecurityAlert::brute_force(user_id, origin.ip_address.clone(), failures);
            if let Err(e) = self.store.insert_alert(&alert).await {
                tracing::error!(error = %e, user_id = %user_id, "Failed to write security alert");
            }
        }
    }

    /// Notify the user when a successful login comes from neither a known IP
    /// nor a known user agent. Users with no earlier successful login are
    /// not notified.
    pub async fn notify_if_new_device(
        &self,
        user_id: Uuid,
        origin: &RequestOrigin,
        current_log: Option<Uuid>,
    ) {
        let since = Utc::now() - Duration::days(self.policy.anomaly_lookback_days);
        let history = match self
            .store
            .recent_activity(
                user_id,
                ActivityAction::Login,
                ActivityStatus::Success,
                since,
                self.policy.anomaly_history_limit,
                current_log,
            )
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Failed to load login history");
                return;
            }
        };

        if history.is_empty() || history.iter().any(|log| log.shares_origin_with(origin)) {
            return;
        }

        let message = format!(
            "A new sign-in to your account was detected from IP {} using {}. If this wasn't you, change your password.",
            origin.ip_address.as_deref().unwrap_or("unknown"),
            origin.user_agent.as_deref().unwrap_or("an unknown device"),
        );
        let notification = Notification::new(
            user_id,
            NotificationKind::NewDeviceLogin,
            "New sign-in detected",
            message,
        );

        match self.store.insert_notification(&notification).await {
            Ok(()) => tracing::info!(user_id = %user_id, "New device login notification sent"),
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Failed to write notification")
            }
        }
    }

    /// Best-effort notification used by leases and bookings.
    pub async fn notify(&self, notification: Notification) {
        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::error!(
                error = %e,
                user_id = %notification.user_id,
                kind = notification.kind.as_str(),
                "Failed to write notification"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{AlertRepository, NotificationRepository};
    use crate::services::InMemoryStore;
    use crate::utils::PageParams;

    fn monitor() -> (ActivityMonitor, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (
            ActivityMonitor::new(store.clone(), AccountSecurityConfig::default()),
            store,
        )
    }

    fn origin(ip: &str, agent: &str) -> RequestOrigin {
        RequestOrigin::new(Some(ip), Some(agent))
    }

    #[tokio::test]
    async fn test_locks_at_threshold_and_alerts_once() {
        let (monitor, store) = monitor();
        let user_id = Uuid::new_v4();
        let origin = origin("10.0.0.1", "curl");

        for _ in 0..4 {
            monitor.record_login_failure(user_id, &origin, "bad password").await;
        }
        assert!(!monitor.is_locked(user_id).await.unwrap());

        monitor.record_login_failure(user_id, &origin, "bad password").await;
        assert!(monitor.is_locked(user_id).await.unwrap());

        monitor.record_login_failure(user_id, &origin, "bad password").await;
        let (alerts, total) = store.list_alerts(None, &PageParams::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(alerts[0].user_id, Some(user_id));
    }

    #[tokio::test]
    async fn test_blocked_attempts_are_not_counted() {
        let (monitor, _) = monitor();
        let user_id = Uuid::new_v4();
        for _ in 0..10 {
            monitor.record_blocked(user_id, &RequestOrigin::default()).await;
        }
        assert_eq!(monitor.recent_failures(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_first_login_does_not_notify() {
        let (monitor, store) = monitor();
        let user_id = Uuid::new_v4();
        let origin = origin("10.0.0.1", "Firefox");
        let log_id = monitor
            .record(Some(user_id), ActivityAction::Login, ActivityStatus::Success, &origin, None)
            .await;

        monitor.notify_if_new_device(user_id, &origin, log_id).await;

        let (_, total) = store
            .list_notifications(user_id, &PageParams::default())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_known_agent_from_new_ip_does_not_notify() {
        let (monitor, store) = monitor();
        let user_id = Uuid::new_v4();
        monitor
            .record(
                Some(user_id),
                ActivityAction::Login,
                ActivityStatus::Success,
                &origin("10.0.0.1", "Firefox"),
                None,
            )
            .await;

        let current = origin("10.9.9.9", "Firefox");
        let log_id = monitor
            .record(Some(user_id), ActivityAction::Login, ActivityStatus::Success, &current, None)
            .await;
        monitor.notify_if_new_device(user_id, &current, log_id).await;

        let (_, total) = store
            .list_notifications(user_id, &PageParams::default())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_unseen_ip_and_agent_notifies_once() {
        let (monitor, store) = monitor();
        let user_id = Uuid::new_v4();
        monitor
            .record(
                Some(user_id),
                ActivityAction::Login,
                ActivityStatus::Success,
                &origin("10.0.0.1", "Firefox"),
                None,
            )
            .await;

        let current = origin("203.0.113.5", "Safari");
        let log_id = monitor
            .record(Some(user_id), ActivityAction::Login, ActivityStatus::Success, &current, None)
            .await;
        monitor.notify_if_new_device(user_id, &current, log_id).await;

        let (notifications, total) = store
            .list_notifications(user_id, &PageParams::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(notifications[0].kind, NotificationKind::NewDeviceLogin);
    }
}
