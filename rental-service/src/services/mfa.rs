//! TOTP enrolment and verification.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use totp_rs::{Algorithm, Secret, TOTP};
use utoipa::ToSchema;
use uuid::Uuid;

use super::activity::ActivityMonitor;
use super::error::ServiceError;
use super::store::Store;
use crate::config::MfaConfig;
use crate::models::{ActivityAction, ActivityStatus, RequestOrigin, User};

const TOTP_DIGITS: usize = 6;

/// SHA-1, six-digit TOTP as understood by common authenticator apps.
#[derive(Clone)]
pub struct TotpVerifier {
    issuer: String,
    skew: u8,
    step: u64,
}

impl TotpVerifier {
    pub fn new(config: &MfaConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            skew: config.skew_steps,
            step: config.step_seconds,
        }
    }

    /// TOTP over a fresh random 160-bit secret.
    pub fn generate(&self, account: &str) -> Result<TOTP, ServiceError> {
        let bytes = Secret::generate_secret()
            .to_bytes()
            .map_err(|e| anyhow::anyhow!("Failed to generate TOTP secret: {}", e))?;
        self.build(bytes, account)
    }

    fn build(&self, secret: Vec<u8>, account: &str) -> Result<TOTP, ServiceError> {
        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            self.skew,
            self.step,
            secret,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Invalid TOTP parameters: {}", e)))
    }

    pub fn totp(&self, secret_base32: &str, account: &str) -> Result<TOTP, ServiceError> {
        let bytes = Secret::Encoded(secret_base32.to_string())
            .to_bytes()
            .map_err(|e| anyhow::anyhow!("Stored TOTP secret is not valid base32: {}", e))?;
        self.build(bytes, account)
    }

    /// True iff `code` matches within the configured step tolerance at `unix_time`.
    pub fn verify_at(
        &self,
        secret_base32: &str,
        account: &str,
        code: &str,
        unix_time: u64,
    ) -> Result<bool, ServiceError> {
        Ok(self.totp(secret_base32, account)?.check(code, unix_time))
    }

    pub fn verify(&self, secret_base32: &str, account: &str, code: &str) -> Result<bool, ServiceError> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        self.verify_at(secret_base32, account, code, now)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MfaSetupResponse {
    /// Base32 secret for manual entry.
    pub secret: String,
    pub otpauth_url: String,
    /// PNG QR code as a `data:` URL.
    pub qr_code: String,
}

#[derive(Clone)]
pub struct MfaService {
    store: Arc<dyn Store>,
    monitor: ActivityMonitor,
    verifier: TotpVerifier,
}

impl MfaService {
    pub fn new(store: Arc<dyn Store>, monitor: ActivityMonitor, verifier: TotpVerifier) -> Self {
        Self {
            store,
            monitor,
            verifier,
        }
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Store a new unconfirmed secret. Any earlier unconfirmed secret is replaced.
    #[tracing::instrument(skip(self, origin))]
    pub async fn setup(
        &self,
        user_id: Uuid,
        origin: &RequestOrigin,
    ) -> Result<MfaSetupResponse, ServiceError> {
        let mut user = self.load_user(user_id).await?;
        if user.mfa_enabled {
            return Err(ServiceError::MfaAlreadyEnabled);
        }

        let totp = self.verifier.generate(&user.email)?;
        let secret = totp.get_secret_base32();
        let qr_png = totp
            .get_qr_base64()
            .map_err(|e| anyhow::anyhow!("Failed to render QR code: {}", e))?;

        user.mfa_secret = Some(secret.clone());
        user.mfa_enabled = false;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::MfaSetup,
                ActivityStatus::Success,
                origin,
                None,
            )
            .await;

        Ok(MfaSetupResponse {
            secret,
            otpauth_url: totp.get_url(),
            qr_code: format!("data:image/png;base64,{}", qr_png),
        })
    }

    /// Confirm the pending secret; only a matching code enables MFA.
    #[tracing::instrument(skip(self, code, origin))]
    pub async fn enable(
        &self,
        user_id: Uuid,
        code: &str,
        origin: &RequestOrigin,
    ) -> Result<(), ServiceError> {
        let mut user = self.load_user(user_id).await?;
        if user.mfa_enabled {
            return Err(ServiceError::MfaAlreadyEnabled);
        }
        let secret = user.mfa_secret.clone().ok_or(ServiceError::MfaNotConfigured)?;

        if !self.verifier.verify(&secret, &user.email, code)? {
            self.monitor
                .record(
                    Some(user.id),
                    ActivityAction::MfaEnable,
                    ActivityStatus::Failure,
                    origin,
                    Some("invalid code".to_string()),
                )
                .await;
            return Err(ServiceError::InvalidMfaCode);
        }

        user.mfa_enabled = true;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::MfaEnable,
                ActivityStatus::Success,
                origin,
                None,
            )
            .await;
        tracing::info!(user_id = %user.id, "MFA enabled");
        Ok(())
    }

    #[tracing::instrument(skip(self, origin))]
    pub async fn disable(&self, user_id: Uuid, origin: &RequestOrigin) -> Result<(), ServiceError> {
        let mut user = self.load_user(user_id).await?;

        user.mfa_secret = None;
        user.mfa_enabled = false;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::MfaDisable,
                ActivityStatus::Success,
                origin,
                None,
            )
            .await;
        tracing::info!(user_id = %user.id, "MFA disabled");
        Ok(())
    }

    /// Check a login code against an enabled secret.
    pub fn check_login_code(&self, user: &User, code: &str) -> Result<bool, ServiceError> {
        match (&user.mfa_secret, user.mfa_enabled) {
            (Some(secret), true) => self.verifier.verify(secret, &user.email, code),
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(skew: u8) -> TotpVerifier {
        TotpVerifier::new(&MfaConfig {
            issuer: "Rental".to_string(),
            skew_steps: skew,
            step_seconds: 30,
        })
    }

    #[test]
    fn test_generated_secret_is_160_bits() {
        let secret = verifier(1).generate("a@b.com").unwrap().get_secret_base32();
        let bytes = Secret::Encoded(secret).to_bytes().unwrap();
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn test_code_accepted_within_skew_only() {
        let v = verifier(1);
        let totp = v.generate("a@b.com").unwrap();
        let secret = totp.get_secret_base32();

        let t = 1_700_000_000u64;
        let code = totp.generate(t);
        assert!(v.verify_at(&secret, "a@b.com", &code, t).unwrap());
        assert!(v.verify_at(&secret, "a@b.com", &code, t + 30).unwrap());
        assert!(!v.verify_at(&secret, "a@b.com", &code, t + 90).unwrap());
    }

    #[test]
    fn test_zero_skew_rejects_previous_step() {
        let v = verifier(0);
        let totp = v.generate("a@b.com").unwrap();
        let secret = totp.get_secret_base32();

        let t = 1_700_000_010u64;
        let code = totp.generate(t);
        assert!(!v.verify_at(&secret, "a@b.com", &code, t + 30).unwrap());
    }

    #[test]
    fn test_otpauth_url_carries_issuer() {
        let v = verifier(1);
        let url = v.generate("a@b.com").unwrap().get_url();
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("issuer=Rental"));
    }
}
