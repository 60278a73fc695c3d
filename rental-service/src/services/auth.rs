//! Password login with lockout, MFA hand-off and new-device detection.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::activity::ActivityMonitor;
use super::error::ServiceError;
use super::jwt::{JwtService, TokenResponse};
use super::mfa::MfaService;
use super::store::Store;
use crate::models::{ActivityAction, ActivityStatus, RequestOrigin, User, UserRole};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Result of a password-valid login.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated { user: User, token: TokenResponse },
    /// A TOTP code must be exchanged through the MFA login step.
    MfaRequired { user_id: Uuid },
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt: JwtService,
    monitor: ActivityMonitor,
    mfa: MfaService,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        jwt: JwtService,
        monitor: ActivityMonitor,
        mfa: MfaService,
    ) -> Self {
        Self {
            store,
            jwt,
            monitor,
            mfa,
        }
    }

    #[tracing::instrument(skip(self, password, origin))]
    pub async fn register(
        &self,
        email: &str,
        password: &Password,
        name: &str,
        role: UserRole,
        origin: &RequestOrigin,
    ) -> Result<(User, TokenResponse), ServiceError> {
        if role == UserRole::Admin {
            return Err(ServiceError::Validation(
                "Role must be tenant or landlord".to_string(),
            ));
        }

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(password)?;
        let user = User::new(
            email,
            Some(password_hash.into_string()),
            name.trim().to_string(),
            role,
        );

        self.store.insert_user(&user).await.map_err(|e| match e {
            service_core::error::AppError::Conflict(_) => ServiceError::EmailAlreadyRegistered,
            other => ServiceError::Store(other),
        })?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::Register,
                ActivityStatus::Success,
                origin,
                None,
            )
            .await;
        tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");

        let token = self.jwt.issue(&user)?;
        Ok((user, token))
    }

    /// Email/password login.
    ///
    /// Unknown, inactive and password-less accounts all fail with the same
    /// `InvalidCredentials`. A locked account is refused before the password
    /// is looked at, and that refusal is not counted as a failure.
    #[tracing::instrument(skip(self, password, origin))]
    pub async fn login(
        &self,
        email: &str,
        password: &Password,
        origin: &RequestOrigin,
    ) -> Result<LoginOutcome, ServiceError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            self.monitor
                .record(
                    None,
                    ActivityAction::Login,
                    ActivityStatus::Failure,
                    origin,
                    Some("unknown email".to_string()),
                )
                .await;
            return Err(ServiceError::InvalidCredentials);
        };

        let password_hash = match (&user.password_hash, user.is_active) {
            (Some(hash), true) => PasswordHashString::new(hash.clone()),
            _ => {
                self.monitor
                    .record_login_failure(user.id, origin, "inactive or password-less account")
                    .await;
                return Err(ServiceError::InvalidCredentials);
            }
        };

        if self.monitor.is_locked(user.id).await? {
            self.monitor.record_blocked(user.id, origin).await;
            return Err(ServiceError::AccountLocked);
        }

        if !verify_password(password, &password_hash)? {
            self.monitor
                .record_login_failure(user.id, origin, "invalid password")
                .await;
            return Err(ServiceError::InvalidCredentials);
        }

        if user.mfa_enabled {
            self.monitor
                .record(
                    Some(user.id),
                    ActivityAction::MfaChallenge,
                    ActivityStatus::Success,
                    origin,
                    None,
                )
                .await;
            return Ok(LoginOutcome::MfaRequired { user_id: user.id });
        }

        let token = self.complete_login(&user, origin).await?;
        Ok(LoginOutcome::Authenticated { user, token })
    }

    /// Exchange a TOTP code for a token after a password-valid login.
    /// Guarded by the same lockout as password login; a wrong code counts as a failed login.
    #[tracing::instrument(skip(self, code, origin))]
    pub async fn complete_mfa_login(
        &self,
        user_id: Uuid,
        code: &str,
        origin: &RequestOrigin,
    ) -> Result<(User, TokenResponse), ServiceError> {
        let user = match self.store.find_user_by_id(user_id).await? {
            Some(user) if user.is_active && user.mfa_enabled => user,
            _ => return Err(ServiceError::InvalidCredentials),
        };

        if self.monitor.is_locked(user.id).await? {
            self.monitor.record_blocked(user.id, origin).await;
            return Err(ServiceError::AccountLocked);
        }

        if !self.mfa.check_login_code(&user, code)? {
            self.monitor
                .record_login_failure(user.id, origin, "invalid MFA code")
                .await;
            return Err(ServiceError::InvalidMfaCode);
        }

        let token = self.complete_login(&user, origin).await?;
        Ok((user, token))
    }

    async fn complete_login(
        &self,
        user: &User,
        origin: &RequestOrigin,
    ) -> Result<TokenResponse, ServiceError> {
        let log_id = self
            .monitor
            .record(
                Some(user.id),
                ActivityAction::Login,
                ActivityStatus::Success,
                origin,
                None,
            )
            .await;

        self.monitor
            .notify_if_new_device(user.id, origin, log_id)
            .await;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(self.jwt.issue(user)?)
    }

    /// Issue a token for a user authenticated elsewhere (identity provider).
    pub fn issue_token(&self, user: &User) -> Result<TokenResponse, ServiceError> {
        Ok(self.jwt.issue(user)?)
    }

    #[tracing::instrument(skip(self, current, new, origin))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: Option<&Password>,
        new: &Password,
        origin: &RequestOrigin,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        // Accounts created through an identity provider may set a first password.
        if let Some(existing) = &user.password_hash {
            let current = current.ok_or(ServiceError::InvalidCredentials)?;
            if !verify_password(current, &PasswordHashString::new(existing.clone()))? {
                self.monitor
                    .record(
                        Some(user.id),
                        ActivityAction::PasswordChange,
                        ActivityStatus::Failure,
                        origin,
                        Some("current password mismatch".to_string()),
                    )
                    .await;
                return Err(ServiceError::InvalidCredentials);
            }
        }

        user.password_hash = Some(hash_password(new)?.into_string());
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::PasswordChange,
                ActivityStatus::Success,
                origin,
                None,
            )
            .await;
        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }
}
