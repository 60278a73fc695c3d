//! Authorization-code + PKCE sign-in through Google and GitHub.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::activity::ActivityMonitor;
use super::auth::AuthService;
use super::error::ServiceError;
use super::jwt::TokenResponse;
use super::store::Store;
use crate::config::{OAuthConfig, OAuthProviderConfig};
use crate::models::{ActivityAction, ActivityStatus, IdentProvider, RequestOrigin, User, UserRole};

/// Identity returned by a provider after a successful code exchange.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
}

#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Exchange an authorization code (with its PKCE verifier) for the user's profile.
    async fn fetch_profile(
        &self,
        provider: IdentProvider,
        config: &OAuthProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuthProfile, ServiceError>;
}

// ==================== HTTP client ====================

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
    verified_email: bool,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

#[derive(Clone)]
pub struct HttpOAuthClient {
    http: reqwest::Client,
}

impl HttpOAuthClient {
    pub fn new() -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rental-service/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { http })
    }

    async fn exchange_code(
        &self,
        token_url: &str,
        config: &OAuthProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> Result<String, ServiceError> {
        let res = self
            .http
            .post(token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("code", code),
                ("code_verifier", code_verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = token_url, "Failed to exchange authorization code");
                ServiceError::Provider("Authentication failed".to_string())
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Token exchange rejected");
            return Err(ServiceError::Provider("Authentication failed".to_string()));
        }

        let token: TokenExchangeResponse = res.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse token response");
            ServiceError::Provider("Authentication failed".to_string())
        })?;
        Ok(token.access_token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, ServiceError> {
        self.http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, url, "Failed to fetch provider profile");
                ServiceError::Provider("Authentication failed".to_string())
            })?
            .json()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url, "Failed to parse provider profile");
                ServiceError::Provider("Authentication failed".to_string())
            })
    }
}

#[async_trait]
impl OAuthClient for HttpOAuthClient {
    async fn fetch_profile(
        &self,
        provider: IdentProvider,
        config: &OAuthProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuthProfile, ServiceError> {
        match provider {
            IdentProvider::Google => {
                let token = self
                    .exchange_code("https://oauth2.googleapis.com/token", config, code, code_verifier)
                    .await?;
                let info: GoogleUserInfo = self
                    .get_json("https://www.googleapis.com/oauth2/v2/userinfo", &token)
                    .await?;
                Ok(OAuthProfile {
                    subject: info.id,
                    email: info.email,
                    email_verified: info.verified_email,
                    name: info.name,
                })
            }
            IdentProvider::Github => {
                let token = self
                    .exchange_code(
                        "https://github.com/login/oauth/access_token",
                        config,
                        code,
                        code_verifier,
                    )
                    .await?;
                let user: GithubUser = self.get_json("https://api.github.com/user", &token).await?;
                let emails: Vec<GithubEmail> = self
                    .get_json("https://api.github.com/user/emails", &token)
                    .await?;
                let primary = emails
                    .into_iter()
                    .find(|e| e.primary && e.verified)
                    .ok_or_else(|| {
                        ServiceError::Validation("GitHub account has no verified primary email".to_string())
                    })?;
                Ok(OAuthProfile {
                    subject: user.id.to_string(),
                    email: primary.email,
                    email_verified: primary.verified,
                    name: user.name.or(Some(user.login)),
                })
            }
        }
    }
}

// ==================== Mock client ====================

/// Test double: returns the profile registered for an authorization code.
#[derive(Default)]
pub struct MockOAuthClient {
    profiles: Mutex<HashMap<String, OAuthProfile>>,
}

impl MockOAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_code(&self, code: &str, profile: OAuthProfile) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(code.to_string(), profile);
        }
    }
}

#[async_trait]
impl OAuthClient for MockOAuthClient {
    async fn fetch_profile(
        &self,
        _provider: IdentProvider,
        _config: &OAuthProviderConfig,
        code: &str,
        _code_verifier: &str,
    ) -> Result<OAuthProfile, ServiceError> {
        self.profiles
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock OAuth mutex poisoned: {}", e))?
            .get(code)
            .cloned()
            .ok_or_else(|| ServiceError::Provider("Authentication failed".to_string()))
    }
}

// ==================== Service ====================

/// Values the caller must keep (in signed cookies) until the callback.
#[derive(Debug, Clone)]
pub struct OAuthStart {
    pub authorization_url: String,
    pub state: String,
    pub code_verifier: String,
}

#[derive(Debug)]
pub enum OAuthOutcome {
    Authenticated { user: User, token: TokenResponse },
    MfaRequired { user_id: Uuid },
    Linked { provider: IdentProvider },
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn pkce_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

#[derive(Clone)]
pub struct OAuthService {
    store: Arc<dyn Store>,
    auth: AuthService,
    monitor: ActivityMonitor,
    client: Arc<dyn OAuthClient>,
    config: OAuthConfig,
}

impl OAuthService {
    pub fn new(
        store: Arc<dyn Store>,
        auth: AuthService,
        monitor: ActivityMonitor,
        client: Arc<dyn OAuthClient>,
        config: OAuthConfig,
    ) -> Self {
        Self {
            store,
            auth,
            monitor,
            client,
            config,
        }
    }

    fn provider_config(&self, provider: IdentProvider) -> Result<&OAuthProviderConfig, ServiceError> {
        self.config
            .provider(provider)
            .ok_or(ServiceError::NotFound("Identity provider"))
    }

    pub fn begin(&self, provider: IdentProvider) -> Result<OAuthStart, ServiceError> {
        let config = self.provider_config(provider)?;
        let state = random_token();
        let code_verifier = random_token();

        let authorization_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            provider.authorize_endpoint(),
            urlencoding::encode(&config.client_id),
            urlencoding::encode(&config.redirect_uri),
            urlencoding::encode(provider.scopes()),
            state,
            pkce_challenge(&code_verifier),
        );

        Ok(OAuthStart {
            authorization_url,
            state,
            code_verifier,
        })
    }

    /// Resolve the provider identity to a local user.
    ///
    /// Order: explicit link request, existing link, matching email (linked on
    /// the fly), otherwise a new password-less tenant.
    #[tracing::instrument(skip(self, code, code_verifier, origin))]
    pub async fn complete(
        &self,
        provider: IdentProvider,
        code: &str,
        code_verifier: &str,
        link_user: Option<Uuid>,
        origin: &RequestOrigin,
    ) -> Result<OAuthOutcome, ServiceError> {
        let config = self.provider_config(provider)?;
        let profile = self
            .client
            .fetch_profile(provider, config, code, code_verifier)
            .await?;

        if !profile.email_verified {
            return Err(ServiceError::Validation(format!(
                "{} account email not verified",
                provider.as_str()
            )));
        }

        let owner = self
            .store
            .find_user_by_provider(provider, &profile.subject)
            .await?;

        if let Some(user_id) = link_user {
            return self.link(provider, &profile, user_id, owner, origin).await;
        }

        let user = match owner {
            Some(user) => user,
            None => match self.store.find_user_by_email(&profile.email).await? {
                // Inactive accounts are refused below without being linked.
                Some(user) if !user.is_active => user,
                Some(mut user) => {
                    user.set_provider_id(provider, Some(profile.subject.clone()));
                    self.store.update_user(&user).await?;
                    tracing::info!(user_id = %user.id, provider = provider.as_str(), "Identity linked by email");
                    user
                }
                None => {
                    let name = profile
                        .name
                        .clone()
                        .unwrap_or_else(|| profile.email.clone());
                    let mut user = User::new(&profile.email, None, name, UserRole::Tenant);
                    user.set_provider_id(provider, Some(profile.subject.clone()));
                    self.store.insert_user(&user).await?;
                    tracing::info!(user_id = %user.id, provider = provider.as_str(), "User created from identity provider");
                    user
                }
            },
        };

        if !user.is_active {
            self.monitor
                .record(
                    Some(user.id),
                    ActivityAction::OauthLogin,
                    ActivityStatus::Failure,
                    origin,
                    Some("inactive account".to_string()),
                )
                .await;
            return Err(ServiceError::InvalidCredentials);
        }

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::OauthLogin,
                ActivityStatus::Success,
                origin,
                Some(provider.as_str().to_string()),
            )
            .await;

        if user.mfa_enabled {
            return Ok(OAuthOutcome::MfaRequired { user_id: user.id });
        }

        let token = self.auth.issue_token(&user)?;
        Ok(OAuthOutcome::Authenticated { user, token })
    }

    async fn link(
        &self,
        provider: IdentProvider,
        profile: &OAuthProfile,
        user_id: Uuid,
        owner: Option<User>,
        origin: &RequestOrigin,
    ) -> Result<OAuthOutcome, ServiceError> {
        if let Some(owner) = owner {
            if owner.id != user_id {
                return Err(ServiceError::AlreadyExists(format!(
                    "This {} account is linked to another user",
                    provider.as_str()
                )));
            }
            return Ok(OAuthOutcome::Linked { provider });
        }

        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;
        user.set_provider_id(provider, Some(profile.subject.clone()));
        self.store.update_user(&user).await?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::OauthLink,
                ActivityStatus::Success,
                origin,
                Some(provider.as_str().to_string()),
            )
            .await;
        tracing::info!(user_id = %user.id, provider = provider.as_str(), "Identity linked");
        Ok(OAuthOutcome::Linked { provider })
    }

    /// Refuses to remove the last remaining way to sign in.
    #[tracing::instrument(skip(self, origin))]
    pub async fn unlink(
        &self,
        user_id: Uuid,
        provider: IdentProvider,
        origin: &RequestOrigin,
    ) -> Result<User, ServiceError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        if user.provider_id(provider).is_none() {
            return Err(ServiceError::NotFound("Linked identity"));
        }
        if user.sign_in_methods_without(provider) == 0 {
            return Err(ServiceError::Validation(
                "Set a password or link another provider before unlinking".to_string(),
            ));
        }

        user.set_provider_id(provider, None);
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        self.monitor
            .record(
                Some(user.id),
                ActivityAction::OauthUnlink,
                ActivityStatus::Success,
                origin,
                Some(provider.as_str().to_string()),
            )
            .await;
        Ok(user)
    }

    /// Where the browser is sent once the callback has been handled.
    pub fn frontend_redirect(&self, outcome: &OAuthOutcome) -> String {
        let base = format!("{}/oauth/callback", self.config.frontend_url.trim_end_matches('/'));
        match outcome {
            OAuthOutcome::Authenticated { token, .. } => {
                format!("{}?token={}", base, urlencoding::encode(&token.access_token))
            }
            OAuthOutcome::MfaRequired { user_id } => {
                format!("{}?mfa_required=true&user_id={}", base, user_id)
            }
            OAuthOutcome::Linked { provider } => format!("{}?linked={}", base, provider.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountSecurityConfig, JwtConfig, MfaConfig};
    use crate::services::mfa::{MfaService, TotpVerifier};
    use crate::services::store::UserRepository;
    use crate::services::{InMemoryStore, JwtService};

    #[test]
    fn test_pkce_challenge_matches_rfc7636_example() {
        assert_eq!(
            pkce_challenge("dBjftJeZ4CVP-mJ92K1ftG5ZR9xaVBbwAzx9Y3cb-8"),
            "E9Melhoa2OwvFrEMTJguCQaoWRq3QNhaTHw2Gj-4d9c"
        );
    }

    #[test]
    fn test_random_tokens_differ() {
        assert_ne!(random_token(), random_token());
        assert_eq!(random_token().len(), 43);
    }

    fn service(store: Arc<InMemoryStore>, client: Arc<MockOAuthClient>) -> OAuthService {
        let monitor = ActivityMonitor::new(store.clone(), AccountSecurityConfig::default());
        let jwt = JwtService::new(&JwtConfig {
            secret: "unit-test-secret-that-is-at-least-32-bytes".to_string(),
            issuer: "rental-service".to_string(),
            expiry_minutes: 15,
        })
        .unwrap();
        let mfa = MfaService::new(
            store.clone(),
            monitor.clone(),
            TotpVerifier::new(&MfaConfig {
                issuer: "Rental".to_string(),
                skew_steps: 1,
                step_seconds: 30,
            }),
        );
        let auth = AuthService::new(store.clone(), jwt, monitor.clone(), mfa);
        OAuthService::new(
            store,
            auth,
            monitor,
            client,
            OAuthConfig {
                frontend_url: "http://localhost:3000".to_string(),
                google: Some(OAuthProviderConfig {
                    client_id: "id".to_string(),
                    client_secret: "secret".to_string(),
                    redirect_uri: "http://localhost/callback".to_string(),
                }),
                github: None,
            },
        )
    }

    #[tokio::test]
    async fn test_inactive_account_is_refused_without_being_linked() {
        let store = Arc::new(InMemoryStore::new());
        let client = Arc::new(MockOAuthClient::new());
        let mut user = User::new("dormant@example.com", None, "Dora".into(), UserRole::Tenant);
        user.is_active = false;
        store.insert_user(&user).await.unwrap();
        client.register_code(
            "code",
            OAuthProfile {
                subject: "g-dormant".to_string(),
                email: "dormant@example.com".to_string(),
                email_verified: true,
                name: None,
            },
        );

        let err = service(store.clone(), client)
            .complete(
                IdentProvider::Google,
                "code",
                "verifier",
                None,
                &RequestOrigin::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidCredentials));
        let stored = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.google_id.is_none());
    }
}
