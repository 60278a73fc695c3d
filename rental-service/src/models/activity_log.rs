//! Append-only activity log used for lockout counting, anomaly detection and
//! the admin security dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Login,
    Register,
    MfaSetup,
    MfaEnable,
    MfaDisable,
    MfaChallenge,
    OauthLogin,
    OauthLink,
    OauthUnlink,
    PasswordChange,
    ProfileUpdate,
    LeaseSign,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "LOGIN",
            ActivityAction::Register => "REGISTER",
            ActivityAction::MfaSetup => "MFA_SETUP",
            ActivityAction::MfaEnable => "MFA_ENABLE",
            ActivityAction::MfaDisable => "MFA_DISABLE",
            ActivityAction::MfaChallenge => "MFA_CHALLENGE",
            ActivityAction::OauthLogin => "OAUTH_LOGIN",
            ActivityAction::OauthLink => "OAUTH_LINK",
            ActivityAction::OauthUnlink => "OAUTH_UNLINK",
            ActivityAction::PasswordChange => "PASSWORD_CHANGE",
            ActivityAction::ProfileUpdate => "PROFILE_UPDATE",
            ActivityAction::LeaseSign => "LEASE_SIGN",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "LOGIN" => ActivityAction::Login,
            "REGISTER" => ActivityAction::Register,
            "MFA_SETUP" => ActivityAction::MfaSetup,
            "MFA_ENABLE" => ActivityAction::MfaEnable,
            "MFA_DISABLE" => ActivityAction::MfaDisable,
            "MFA_CHALLENGE" => ActivityAction::MfaChallenge,
            "OAUTH_LOGIN" => ActivityAction::OauthLogin,
            "OAUTH_LINK" => ActivityAction::OauthLink,
            "OAUTH_UNLINK" => ActivityAction::OauthUnlink,
            "PASSWORD_CHANGE" => ActivityAction::PasswordChange,
            "PROFILE_UPDATE" => ActivityAction::ProfileUpdate,
            "LEASE_SIGN" => ActivityAction::LeaseSign,
            other => return Err(format!("Unknown activity action: {}", other)),
        };
        Ok(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    Success,
    Failure,
    /// Refused by lockout; never counted as a failure.
    Blocked,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "SUCCESS",
            ActivityStatus::Failure => "FAILURE",
            ActivityStatus::Blocked => "BLOCKED",
        }
    }
}

impl FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(ActivityStatus::Success),
            "FAILURE" => Ok(ActivityStatus::Failure),
            "BLOCKED" => Ok(ActivityStatus::Blocked),
            other => Err(format!("Unknown activity status: {}", other)),
        }
    }
}

/// Where a request came from, as far as the server can tell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestOrigin {
    pub fn new(ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            ip_address: ip_address.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: ActivityAction,
    pub status: ActivityStatus,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(
        user_id: Option<Uuid>,
        action: ActivityAction,
        status: ActivityStatus,
        origin: &RequestOrigin,
        details: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action,
            status,
            ip_address: origin.ip_address.clone(),
            user_agent: origin.user_agent.clone(),
            details,
            created_at: Utc::now(),
        }
    }

    /// Whether this entry was made from the same IP or the same user agent.
    pub fn shares_origin_with(&self, origin: &RequestOrigin) -> bool {
        let same_ip = origin.ip_address.is_some() && self.ip_address == origin.ip_address;
        let same_agent = origin.user_agent.is_some() && self.user_agent == origin.user_agent;
        same_ip || same_agent
    }
}

/// Admin dashboard filter over the activity log.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub action: Option<ActivityAction>,
    pub status: Option<ActivityStatus>,
}

impl ActivityFilter {
    pub fn matches(&self, log: &ActivityLog) -> bool {
        self.user_id.is_none_or(|id| log.user_id == Some(id))
            && self.action.is_none_or(|a| log.action == a)
            && self.status.is_none_or(|s| log.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(ip: &str, agent: &str) -> RequestOrigin {
        RequestOrigin::new(Some(ip), Some(agent))
    }

    #[test]
    fn test_shares_origin_on_ip_or_agent() {
        let log = ActivityLog::new(
            None,
            ActivityAction::Login,
            ActivityStatus::Success,
            &origin("10.0.0.1", "Firefox"),
            None,
        );
        assert!(log.shares_origin_with(&origin("10.0.0.1", "Chrome")));
        assert!(log.shares_origin_with(&origin("10.0.0.2", "Firefox")));
        assert!(!log.shares_origin_with(&origin("10.0.0.2", "Chrome")));
    }

    #[test]
    fn test_unknown_origin_never_matches() {
        let log = ActivityLog::new(
            None,
            ActivityAction::Login,
            ActivityStatus::Success,
            &RequestOrigin::default(),
            None,
        );
        assert!(!log.shares_origin_with(&RequestOrigin::default()));
    }

    #[test]
    fn test_filter_matches() {
        let user_id = Uuid::new_v4();
        let log = ActivityLog::new(
            Some(user_id),
            ActivityAction::Login,
            ActivityStatus::Failure,
            &RequestOrigin::default(),
            None,
        );
        let filter = ActivityFilter {
            user_id: Some(user_id),
            action: Some(ActivityAction::Login),
            status: None,
        };
        assert!(filter.matches(&log));

        let filter = ActivityFilter {
            status: Some(ActivityStatus::Success),
            ..Default::default()
        };
        assert!(!filter.matches(&log));
    }

    #[test]
    fn test_action_codes_parse_back() {
        for action in [ActivityAction::Login, ActivityAction::OauthUnlink, ActivityAction::LeaseSign] {
            assert_eq!(action.as_str().parse::<ActivityAction>(), Ok(action));
        }
    }
}
