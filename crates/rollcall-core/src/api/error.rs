use reqwest::StatusCode;
use thiserror::Error;

use super::transport::TransportError;
use crate::auth::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in - no session token stored")]
    MissingCredential,

    #[error("Session rejected by server - log in again at {login_path}")]
    CredentialRejected { login_path: String },

    #[error("Login failed ({status}): {message}")]
    LoginRejected { status: StatusCode, message: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request failed ({status}): {message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Token storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success business response. 401 never reaches here:
    /// the gateway turns it into `CredentialRejected` first.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::Status {
                status,
                message: truncated,
            },
        }
    }

    /// Whether the caller should send the user back to the login entry point.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::MissingCredential | ApiError::CredentialRejected { .. }
        )
    }

    /// One line suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::MissingCredential => "You are not logged in.".to_string(),
            ApiError::CredentialRejected { .. } => {
                "Your session has expired or was revoked. Please log in again.".to_string()
            }
            ApiError::LoginRejected { status, message } => match status.as_u16() {
                400 | 401 | 403 | 422 => "Invalid user id or password.".to_string(),
                _ => format!("Login failed: {}", message),
            },
            ApiError::Transport(TransportError::Network(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Transport(TransportError::Network(e)) if e.is_connect() => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            ApiError::Transport(TransportError::Unreachable(_)) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body() {
        assert_eq!(ApiError::truncate_body("short"), "short");

        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 520 total bytes)"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "错".repeat(MAX_ERROR_BODY_LENGTH);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "gone"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "down"),
            ApiError::ServerError(_)
        ));
        match ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad page size") {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "bad page size");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_requires_login() {
        assert!(ApiError::MissingCredential.requires_login());
        assert!(ApiError::CredentialRejected {
            login_path: "/login".to_string()
        }
        .requires_login());
        assert!(!ApiError::NotFound("x".to_string()).requires_login());
    }

    #[test]
    fn test_user_message() {
        let rejected = ApiError::LoginRejected {
            status: StatusCode::UNAUTHORIZED,
            message: "{}".to_string(),
        };
        assert_eq!(rejected.user_message(), "Invalid user id or password.");
        assert_eq!(
            ApiError::Transport(TransportError::Unreachable("dns".to_string())).user_message(),
            "Unable to connect to server. Check your connection."
        );
        assert_eq!(
            ApiError::InvalidInput("User id is required".to_string()).user_message(),
            "Invalid input: User id is required"
        );
    }
}
