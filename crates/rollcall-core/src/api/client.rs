//! API client for the student records service.
//!
//! This module provides the `ApiClient` struct: login and logout, plus the
//! record query pages, which all go through the `AuthGateway`.

use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::gateway::{AuthGateway, RequestOptions};
use super::query::{QueryParams, StudentQuery};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use super::ApiError;
use crate::auth::{decode_claims, Session, Token, TokenStore};
use crate::config::{Config, Endpoints};
use crate::models::{Page, Record, RecordKind, Student};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for user ids, as validated by the server
const MAX_USER_ID_LENGTH: usize = 32;

/// Maximum length for passwords, as validated by the server
const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Serialize)]
struct LoginRequest<'a> {
    id: &'a str,
    password: &'a str,
}

/// API client for the records service.
/// Clone is cheap - the transport and token store are shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    gateway: AuthGateway,
    endpoints: Endpoints,
}

impl ApiClient {
    /// Create a client talking HTTP to the configured server
    pub fn new(config: &Config, store: TokenStore) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.base_url.as_deref())?;
        Ok(Self::with_transport(
            Arc::new(transport),
            store,
            config.endpoints.clone(),
        ))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, store: TokenStore, endpoints: Endpoints) -> Self {
        let gateway = AuthGateway::new(transport.clone(), store, endpoints.login_page.clone());
        Self {
            transport,
            gateway,
            endpoints,
        }
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    pub fn store(&self) -> &TokenStore {
        self.gateway.store()
    }

    pub fn session(&self) -> Session {
        Session::new(self.store().clone())
    }

    fn validate_login(id: &str, password: &str) -> Result<(), ApiError> {
        if id.is_empty() || password.is_empty() {
            return Err(ApiError::InvalidInput(
                "User id and password required".to_string(),
            ));
        }
        if id.chars().count() > MAX_USER_ID_LENGTH {
            return Err(ApiError::InvalidInput(format!(
                "User id must be at most {} characters",
                MAX_USER_ID_LENGTH
            )));
        }
        if password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(ApiError::InvalidInput(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    /// Log in and store the issued token, replacing any previous one.
    pub async fn login(&self, id: &str, password: &str) -> Result<Token, ApiError> {
        Self::validate_login(id, password)?;

        let options = RequestOptions::new()
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .json(&LoginRequest { id, password })?;
        let request = HttpRequest {
            method: Method::POST,
            url: self.endpoints.login.clone(),
            headers: options.headers,
            body: options.body,
        };

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!(status = response.status.as_u16(), "Login rejected");
            return Err(ApiError::LoginRejected {
                status: response.status,
                message: ApiError::truncate_body(&response.text()),
            });
        }

        let raw: String = response
            .json()
            .map_err(|e| ApiError::InvalidResponse(format!("Login response is not a token string: {}", e)))?;
        let token = Token::new(raw);
        self.store().save(&token)?;

        match decode_claims(token.as_str()) {
            Ok(claims) => info!(
                user = claims.display_name().unwrap_or(id),
                exp = claims.exp,
                "Login successful"
            ),
            Err(e) => warn!(error = %e, "Login successful, but token payload is unreadable"),
        }
        Ok(token)
    }

    /// Forget the stored token
    pub fn logout(&self) -> Result<(), ApiError> {
        self.store().clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Turn a passed-through business response into a typed result
    fn parse_page<T: DeserializeOwned>(response: HttpResponse, url: &str) -> Result<Page<T>, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }
        response
            .json()
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse page from {}: {}", url, e)))
    }

    /// Query one record collection with the given filters
    pub async fn query_records<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        params: &QueryParams,
    ) -> Result<Page<T>, ApiError> {
        let url = params.apply_to(&kind.query_path(&self.endpoints.query_prefix));
        let response = self.gateway.get(&url).await?;
        let page: Page<T> = Self::parse_page(response, &url)?;
        debug!(kind = %kind, items = page.items.len(), "Fetched records");
        Ok(page)
    }

    /// Student search page, rows left untyped for grid display
    pub async fn query_students(&self, query: &StudentQuery) -> Result<Page<Record>, ApiError> {
        self.query_records(RecordKind::Student, &query.to_params()).await
    }

    /// Student search page with typed rows
    pub async fn fetch_students(&self, query: &StudentQuery) -> Result<Page<Student>, ApiError> {
        self.query_records(RecordKind::Student, &query.to_params()).await
    }
}
