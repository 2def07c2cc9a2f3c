//! REST API client module for the student records service.
//!
//! Layers, bottom up:
//! - `transport`: the network boundary (`Transport`, `ReqwestTransport`)
//! - `gateway`: `AuthGateway`, attaching the bearer token and handling 401
//! - `client`: `ApiClient`, login/logout and the record query pages
//!
//! The service issues a JWT from `POST /api/login`; every other endpoint
//! expects it as a bearer token.

pub mod client;
pub mod error;
pub mod gateway;
pub mod query;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use gateway::{AuthGateway, RequestOptions};
pub use query::{QueryParams, StudentQuery};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
