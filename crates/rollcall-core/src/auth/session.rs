use chrono::Utc;

use super::store::{StoreError, Token, TokenStore};
use super::token::{decode_claims, Claims};

/// Seconds before expiry at which a session counts as expiring soon.
const EXPIRY_WARNING_SECS: i64 = 60;

/// What the stored token says about the current login.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Nothing stored
    Missing,
    /// Something stored, but its payload cannot be read
    Unreadable,
    Expired { claims: Claims },
    /// `remaining_secs` is whole seconds until `exp`, saturating for far-future tokens
    Active { claims: Claims, remaining_secs: i64 },
}

impl SessionStatus {
    pub fn evaluate(token: &Token, now: i64) -> Self {
        match decode_claims(token.as_str()) {
            Err(_) => SessionStatus::Unreadable,
            Ok(claims) if claims.is_expired_at(now) => SessionStatus::Expired { claims },
            Ok(claims) => {
                let remaining_secs = claims.seconds_remaining(now);
                SessionStatus::Active { claims, remaining_secs }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active { .. })
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            SessionStatus::Expired { claims } | SessionStatus::Active { claims, .. } => Some(claims),
            _ => None,
        }
    }

    /// Check if the session is still active but close to its expiry
    pub fn expires_soon(&self) -> bool {
        match self {
            SessionStatus::Active { remaining_secs, .. } => *remaining_secs <= EXPIRY_WARNING_SECS,
            _ => false,
        }
    }

    /// Short label for status lines
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Missing => "No token found, please log in",
            SessionStatus::Unreadable => "Stored token is unreadable, please log in again",
            SessionStatus::Expired { .. } => "Token has expired, please log in again",
            SessionStatus::Active { .. } => "Token is valid",
        }
    }
}

/// Read-only view of the login state held in a `TokenStore`.
///
/// Checking the status never clears the store; an expired token stays in
/// place until logout or a 401.
#[derive(Clone)]
pub struct Session {
    store: TokenStore,
}

impl Session {
    pub fn new(store: TokenStore) -> Self {
        Self { store }
    }

    pub fn status(&self) -> Result<SessionStatus, StoreError> {
        self.status_at(Utc::now().timestamp())
    }

    pub fn status_at(&self, now: i64) -> Result<SessionStatus, StoreError> {
        Ok(match self.store.get()? {
            Some(token) => SessionStatus::evaluate(&token, now),
            None => SessionStatus::Missing,
        })
    }

    /// Check if a token exists and is not expired
    pub fn is_valid(&self) -> bool {
        self.status().map(|s| s.is_active()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode_token, token_with_exp};
    use serde_json::json;

    #[test]
    fn test_missing_when_store_empty() {
        let session = Session::new(TokenStore::in_memory());
        assert_eq!(session.status().unwrap(), SessionStatus::Missing);
        assert!(!session.is_valid());
    }

    #[test]
    fn test_unreadable_token() {
        let store = TokenStore::in_memory();
        store.save(&Token::new("garbage")).unwrap();
        let session = Session::new(store);
        assert_eq!(session.status().unwrap(), SessionStatus::Unreadable);
    }

    #[test]
    fn test_active_and_expired() {
        let store = TokenStore::in_memory();
        store.save(&Token::new(token_with_exp(2_000))).unwrap();
        let session = Session::new(store.clone());

        match session.status_at(1_970).unwrap() {
            SessionStatus::Active { claims, remaining_secs } => {
                assert_eq!(claims.exp, 2_000);
                assert_eq!(remaining_secs, 30);
            }
            other => panic!("expected active session, got {:?}", other),
        }
        assert!(session.status_at(1_970).unwrap().expires_soon());
        assert!(!session.status_at(1_000).unwrap().expires_soon());

        let expired = session.status_at(2_000).unwrap();
        assert!(matches!(expired, SessionStatus::Expired { .. }));
        assert_eq!(expired.claims().map(|c| c.exp), Some(2_000));

        // Status checks never clear the store
        assert!(store.get().unwrap().is_some());
    }

    #[test]
    fn test_far_future_expiry_is_active() {
        let store = TokenStore::in_memory();
        let session = Session::new(store.clone());

        for exp in [10_000_000_000_000_000, i64::MAX] {
            store.save(&Token::new(token_with_exp(exp))).unwrap();
            match session.status_at(1_700_000_000).unwrap() {
                SessionStatus::Active { remaining_secs, .. } => {
                    assert_eq!(remaining_secs, exp - 1_700_000_000)
                }
                other => panic!("expected active session, got {:?}", other),
            }
        }

        // Saturates rather than overflowing when `now` is far in the past
        store.save(&Token::new(token_with_exp(i64::MAX))).unwrap();
        let status = session.status_at(i64::MIN).unwrap();
        assert!(matches!(status, SessionStatus::Active { remaining_secs: i64::MAX, .. }));
        assert!(!status.expires_soon());
        assert!(status.claims().unwrap().expires_at().is_none());
    }

    #[test]
    fn test_huge_fractional_expiry_is_active() {
        let store = TokenStore::in_memory();
        store
            .save(&Token::new(encode_token(&json!({ "exp": 1e300 }))))
            .unwrap();
        let status = Session::new(store).status().unwrap();
        assert!(status.is_active());
        assert!(!status.expires_soon());
    }

    #[test]
    fn test_negative_expiry_is_expired() {
        let store = TokenStore::in_memory();
        store.save(&Token::new(token_with_exp(-1))).unwrap();
        let status = Session::new(store).status().unwrap();
        assert!(matches!(status, SessionStatus::Expired { .. }));
    }
}
