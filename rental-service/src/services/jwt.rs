use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{User, UserRole};

/// Issues and validates HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_token_expiry_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_token_expiry_minutes: config.expiry_minutes,
        })
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
    }

    pub fn issue(&self, user: &User) -> Result<TokenResponse, anyhow::Error> {
        Ok(TokenResponse {
            access_token: self.generate_access_token(user)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry_seconds(),
        })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        Ok(token_data.claims)
    }

    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, expiry_minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            issuer: "rental-service".to_string(),
            expiry_minutes,
        }
    }

    fn user() -> User {
        User::new("tenant@example.com", None, "Tenant".into(), UserRole::Tenant)
    }

    #[test]
    fn test_token_round_trip_carries_identity() {
        let jwt = JwtService::new(&config("a-very-long-test-secret-of-32-bytes!", 60)).unwrap();
        let user = user();
        let token = jwt.generate_access_token(&user).unwrap();

        let claims = jwt.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "tenant@example.com");
        assert_eq!(claims.role, UserRole::Tenant);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let a = JwtService::new(&config("secret-a-secret-a-secret-a-secret-a", 60)).unwrap();
        let b = JwtService::new(&config("secret-b-secret-b-secret-b-secret-b", 60)).unwrap();
        let token = a.generate_access_token(&user()).unwrap();
        assert!(b.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Beyond the default 60s leeway.
        let jwt = JwtService::new(&config("a-very-long-test-secret-of-32-bytes!", -5)).unwrap();
        let token = jwt.generate_access_token(&user()).unwrap();
        assert!(jwt.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_issue_reports_expiry() {
        let jwt = JwtService::new(&config("a-very-long-test-secret-of-32-bytes!", 15)).unwrap();
        let response = jwt.issue(&user()).unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);
    }
}
