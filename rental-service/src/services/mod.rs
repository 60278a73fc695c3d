pub mod account;
pub mod activity;
pub mod auth;
pub mod booking;
pub mod database;
pub mod error;
pub mod jwt;
pub mod lease;
pub mod memory;
pub mod mfa;
pub mod oauth;
pub mod property;
pub mod security;
pub mod store;

pub use account::AccountService;
pub use activity::ActivityMonitor;
pub use auth::{AuthService, LoginOutcome};
pub use booking::{BookingService, NewBooking};
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService, TokenResponse};
pub use lease::{LeaseService, NewLease};
pub use memory::InMemoryStore;
pub use mfa::{MfaService, MfaSetupResponse, TotpVerifier};
pub use oauth::{
    HttpOAuthClient, MockOAuthClient, OAuthClient, OAuthOutcome, OAuthProfile, OAuthService,
    OAuthStart,
};
pub use property::{NewProperty, PropertyChanges, PropertyService};
pub use security::{SecurityService, SecuritySummary};
pub use store::{
    ActivityRepository, AlertRepository, BookingRepository, LeaseRepository,
    NotificationRepository, PropertyRepository, Store, UserRepository,
};
