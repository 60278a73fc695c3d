use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

use crate::models::IdentProvider;

/// Bounds that keep the derived `chrono::Duration` values in range.
pub const MAX_LOCKOUT_WINDOW_MINUTES: i64 = 24 * 60;
pub const MAX_ANOMALY_LOOKBACK_DAYS: i64 = 365;

#[derive(Debug, Clone, Deserialize)]
pub struct RentalConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mfa: MfaConfig,
    pub account_security: AccountSecurityConfig,
    pub oauth: OAuthConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MfaConfig {
    /// Issuer label shown in authenticator apps.
    pub issuer: String,
    /// Accepted drift in time steps on either side of the current one.
    pub skew_steps: u8,
    pub step_seconds: u64,
}

/// Thresholds for brute-force lockout and new-device detection.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSecurityConfig {
    pub lockout_threshold: i64,
    pub lockout_window_minutes: i64,
    pub anomaly_lookback_days: i64,
    pub anomaly_history_limit: i64,
}

impl Default for AccountSecurityConfig {
    fn default() -> Self {
        Self {
            lockout_threshold: 5,
            lockout_window_minutes: 15,
            anomaly_lookback_days: 30,
            anomaly_history_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    /// Where the browser lands after an OAuth round trip.
    pub frontend_url: String,
    pub google: Option<OAuthProviderConfig>,
    pub github: Option<OAuthProviderConfig>,
}

impl OAuthConfig {
    pub fn provider(&self, provider: IdentProvider) -> Option<&OAuthProviderConfig> {
        match provider {
            IdentProvider::Google => self.google.as_ref(),
            IdentProvider::Github => self.github.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    /// Master secret for signing OAuth state cookies.
    pub cookie_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SwaggerMode {
    Public,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl RentalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = RentalConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("rental-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", None, is_prod)?,
                issuer: get_env("JWT_ISSUER", Some("rental-service"), is_prod)?,
                expiry_minutes: parse_env("JWT_EXPIRY_MINUTES", "60", is_prod)?,
            },
            mfa: MfaConfig {
                issuer: get_env("MFA_ISSUER", Some("RentalMarketplace"), is_prod)?,
                skew_steps: parse_env("MFA_SKEW_STEPS", "1", is_prod)?,
                step_seconds: parse_env("MFA_STEP_SECONDS", "30", is_prod)?,
            },
            account_security: AccountSecurityConfig {
                lockout_threshold: parse_env("LOCKOUT_THRESHOLD", "5", is_prod)?,
                lockout_window_minutes: parse_env("LOCKOUT_WINDOW_MINUTES", "15", is_prod)?,
                anomaly_lookback_days: parse_env("ANOMALY_LOOKBACK_DAYS", "30", is_prod)?,
                anomaly_history_limit: parse_env("ANOMALY_HISTORY_LIMIT", "20", is_prod)?,
            },
            oauth: OAuthConfig {
                frontend_url: get_env("FRONTEND_URL", Some("http://localhost:3000"), is_prod)?,
                google: optional_provider("GOOGLE")?,
                github: optional_provider("GITHUB")?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
                cookie_secret: get_env("COOKIE_SECRET", None, is_prod)?,
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("public"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_env("RATE_LIMIT_LOGIN_ATTEMPTS", "20", is_prod)?,
                login_window_seconds: parse_env("RATE_LIMIT_LOGIN_WINDOW_SECONDS", "60", is_prod)?,
                register_attempts: parse_env("RATE_LIMIT_REGISTER_ATTEMPTS", "5", is_prod)?,
                register_window_seconds: parse_env(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    "3600",
                    is_prod,
                )?,
                global_ip_limit: parse_env("RATE_LIMIT_GLOBAL_IP_LIMIT", "300", is_prod)?,
                global_ip_window_seconds: parse_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    "60",
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.jwt.secret.len() < 32 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 bytes"
            )));
        }

        if self.security.cookie_secret.len() < 32 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "COOKIE_SECRET must be at least 32 bytes"
            )));
        }

        if self.mfa.step_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MFA_STEP_SECONDS must be positive"
            )));
        }

        let policy = &self.account_security;
        if policy.lockout_threshold <= 0 || policy.lockout_window_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LOCKOUT_THRESHOLD and LOCKOUT_WINDOW_MINUTES must be positive"
            )));
        }

        if policy.lockout_window_minutes > MAX_LOCKOUT_WINDOW_MINUTES {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LOCKOUT_WINDOW_MINUTES must be at most {}",
                MAX_LOCKOUT_WINDOW_MINUTES
            )));
        }

        if policy.anomaly_lookback_days <= 0 || policy.anomaly_history_limit <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ANOMALY_LOOKBACK_DAYS and ANOMALY_HISTORY_LIMIT must be positive"
            )));
        }

        if policy.anomaly_lookback_days > MAX_ANOMALY_LOOKBACK_DAYS {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ANOMALY_LOOKBACK_DAYS must be at most {}",
                MAX_ANOMALY_LOOKBACK_DAYS
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.swagger.enabled == SwaggerMode::Public {
                tracing::warn!("Swagger UI is publicly accessible in production");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

/// A provider is enabled only when its client id is set.
fn optional_provider(prefix: &str) -> Result<Option<OAuthProviderConfig>, AppError> {
    let Ok(client_id) = env::var(format!("{}_CLIENT_ID", prefix)) else {
        return Ok(None);
    };

    Ok(Some(OAuthProviderConfig {
        client_id,
        client_secret: get_env(&format!("{}_CLIENT_SECRET", prefix), None, false)?,
        redirect_uri: get_env(&format!("{}_REDIRECT_URI", prefix), None, false)?,
    }))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}
