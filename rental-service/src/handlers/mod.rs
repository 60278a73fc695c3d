//! HTTP handlers for the rental service.

pub mod auth;
pub mod booking;
pub mod lease;
pub mod metrics;
pub mod property;
pub mod security;
pub mod user;
