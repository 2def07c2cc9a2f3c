//! Authenticated request gateway.
//!
//! Attaches the stored token as a bearer credential and reacts to a 401 by
//! clearing the store. Routing the user back to the login page is left to
//! the caller, which learns about it through `ApiError::CredentialRejected`.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;
use crate::auth::TokenStore;

/// Caller-supplied parts of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `body` as the JSON request body
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ApiError::InvalidInput(format!("Failed to encode request body: {}", e)))?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(bytes);
        Ok(self)
    }
}

/// Clone is cheap - both the transport and the store are shared.
#[derive(Clone)]
pub struct AuthGateway {
    transport: Arc<dyn Transport>,
    store: TokenStore,
    login_path: String,
}

impl AuthGateway {
    pub fn new(transport: Arc<dyn Transport>, store: TokenStore, login_path: impl Into<String>) -> Self {
        Self {
            transport,
            store,
            login_path: login_path.into(),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Send `method url` with the stored token attached.
    ///
    /// Fails with `MissingCredential` before touching the network when no
    /// token is stored. Any status other than 401 is handed back untouched.
    pub async fn call(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, ApiError> {
        let token = self.store.get()?.ok_or(ApiError::MissingCredential)?;

        let mut headers = options.headers;
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|_| ApiError::InvalidHeader("stored token is not a valid header value".to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, bearer);

        debug!(method = %method, path = without_query(url), "Authenticated request");
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body: options.body,
        };
        let response = self.transport.send(request).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            warn!(path = without_query(url), "Credential rejected, clearing session token");
            self.store.clear()?;
            return Err(ApiError::CredentialRejected {
                login_path: self.login_path.clone(),
            });
        }

        Ok(response)
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.call(Method::GET, url, RequestOptions::default()).await
    }
}

/// Query strings carry user filters; logs only get the path.
fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
