use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    BruteForce,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::BruteForce => "BRUTE_FORCE",
        }
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BRUTE_FORCE" => Ok(AlertKind::BruteForce),
            other => Err(format!("Unknown alert kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(AlertSeverity::Low),
            "MEDIUM" => Ok(AlertSeverity::Medium),
            "HIGH" => Ok(AlertSeverity::High),
            other => Err(format!("Unknown alert severity: {}", other)),
        }
    }
}

/// Raised when a detection rule fires. Visible to admins only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SecurityAlert {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub ip_address: Option<String>,
    pub details: String,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SecurityAlert {
    pub fn brute_force(user_id: Uuid, ip_address: Option<String>, failures: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            kind: AlertKind::BruteForce,
            severity: AlertSeverity::High,
            ip_address,
            details: format!("{} failed login attempts within the lockout window", failures),
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn resolve(&mut self, admin_id: Uuid) {
        self.resolved = true;
        self.resolved_by = Some(admin_id);
        self.resolved_at = Some(Utc::now());
    }
}
