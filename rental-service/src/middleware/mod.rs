pub mod admin;
pub mod auth;
pub mod origin;

pub use admin::admin_middleware;
pub use auth::{auth_middleware, AuthUser};
