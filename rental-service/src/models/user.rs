//! User accounts: tenants, landlords and administrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role, embedded in issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Tenant,
    Landlord,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Tenant => "TENANT",
            UserRole::Landlord => "LANDLORD",
            UserRole::Admin => "ADMIN",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TENANT" => Ok(UserRole::Tenant),
            "LANDLORD" => Ok(UserRole::Landlord),
            "ADMIN" => Ok(UserRole::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// External identity providers a user can sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IdentProvider {
    Google,
    Github,
}

impl IdentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentProvider::Google => "google",
            IdentProvider::Github => "github",
        }
    }

    pub fn authorize_endpoint(&self) -> &'static str {
        match self {
            IdentProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            IdentProvider::Github => "https://github.com/login/oauth/authorize",
        }
    }

    pub fn scopes(&self) -> &'static str {
        match self {
            IdentProvider::Google => "openid email profile",
            IdentProvider::Github => "read:user user:email",
        }
    }
}

impl FromStr for IdentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(IdentProvider::Google),
            "github" => Ok(IdentProvider::Github),
            _ => Err(format!("Unknown identity provider: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Absent for accounts created through an identity provider.
    pub password_hash: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    /// Base32 TOTP secret; present but unconfirmed until `mfa_enabled` flips.
    pub mfa_secret: Option<String>,
    pub mfa_enabled: bool,
    pub google_id: Option<String>,
    pub github_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: Option<String>, name: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            name,
            phone: None,
            role,
            is_active: true,
            mfa_secret: None,
            mfa_enabled: false,
            google_id: None,
            github_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn provider_id(&self, provider: IdentProvider) -> Option<&str> {
        match provider {
            IdentProvider::Google => self.google_id.as_deref(),
            IdentProvider::Github => self.github_id.as_deref(),
        }
    }

    pub fn set_provider_id(&mut self, provider: IdentProvider, subject: Option<String>) {
        match provider {
            IdentProvider::Google => self.google_id = subject,
            IdentProvider::Github => self.github_id = subject,
        }
        self.updated_at = Utc::now();
    }

    /// Number of ways the user can still sign in, ignoring `except`.
    pub fn sign_in_methods_without(&self, except: IdentProvider) -> usize {
        let providers = [IdentProvider::Google, IdentProvider::Github]
            .into_iter()
            .filter(|p| *p != except && self.provider_id(*p).is_some())
            .count();
        providers + usize::from(self.password_hash.is_some())
    }

    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User as returned to its owner; never carries secrets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub mfa_enabled: bool,
    pub google_linked: bool,
    pub github_linked: bool,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            mfa_enabled: user.mfa_enabled,
            google_linked: user.google_id.is_some(),
            github_linked: user.github_id.is_some(),
            has_password: user.password_hash.is_some(),
            created_at: user.created_at,
        }
    }
}

/// What a counterparty may see about a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}
