//! Core library for rollcall.
//!
//! Session-token handling for the student records service: a durable
//! single-slot token store, unverified expiry checks on the token payload,
//! an authenticated request gateway, and the record query pages built on it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, AuthGateway, QueryParams, StudentQuery};
pub use auth::{Session, SessionStatus, Token, TokenStore};
pub use config::Config;
