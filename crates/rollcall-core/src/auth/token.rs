//! Reads claims out of a session token without verifying it.
//!
//! Nothing here checks the signature. The expiry read from the payload is
//! only good enough to skip a request that is certain to fail; the server's
//! 401 stays authoritative.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// header.payload.signature
const TOKEN_SEGMENTS: usize = 3;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Expected 3 dot-separated segments, found {0}")]
    Malformed(usize),

    #[error("Payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Payload has no numeric exp claim")]
    MissingExpiry,
}

/// Claims carried in the payload segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
    pub iat: Option<i64>,
    pub subject: Option<String>,
    pub name: Option<String>,
    /// Every claim as decoded, including the ones above
    pub raw: Map<String, Value>,
}

impl Claims {
    fn from_map(raw: Map<String, Value>) -> Result<Self, TokenError> {
        let exp = raw
            .get("exp")
            .and_then(numeric_date)
            .ok_or(TokenError::MissingExpiry)?;

        Ok(Self {
            exp,
            iat: raw.get("iat").and_then(numeric_date),
            subject: raw.get("sub").and_then(display_value),
            name: raw.get("name").and_then(display_value),
            raw,
        })
    }

    /// Expired once `now` reaches `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    pub fn seconds_remaining(&self, now: i64) -> i64 {
        self.exp.saturating_sub(now).max(0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }

    /// Name to show for the session owner: `name`, falling back to `sub`.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.subject.as_deref())
    }
}

/// NumericDate may be fractional; truncate to whole seconds.
fn numeric_date(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.floor() as i64)
    })
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts the URL-safe and standard alphabets, padded or not.
fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    Ok(URL_SAFE_NO_PAD.decode(normalized)?)
}

/// Decode the payload segment of `token` into its claims.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != TOKEN_SEGMENTS {
        return Err(TokenError::Malformed(segments.len()));
    }

    let bytes = decode_segment(segments[1])?;
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(map) => Claims::from_map(map),
        _ => Err(TokenError::NotAnObject),
    }
}

/// Whether `token` looks unexpired at `now` (seconds since the epoch).
/// Any decoding problem makes the token unusable.
pub fn is_usable_at(token: &str, now: i64) -> bool {
    decode_claims(token)
        .map(|claims| !claims.is_expired_at(now))
        .unwrap_or(false)
}

/// Whether `token` looks unexpired against the local clock.
pub fn is_usable(token: &str) -> bool {
    is_usable_at(token, Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode_token, token_with_exp};
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn test_expired_token_is_unusable() {
        let token = token_with_exp(now() - 1);
        assert!(!is_usable(&token));
    }

    #[test]
    fn test_future_token_is_usable() {
        let token = token_with_exp(now() + 3600);
        assert!(is_usable(&token));
    }

    #[test]
    fn test_expiry_comparison_is_strict() {
        let token = token_with_exp(1_000);
        assert!(is_usable_at(&token, 999));
        assert!(!is_usable_at(&token, 1_000));
        assert!(!is_usable_at(&token, 1_001));
    }

    #[test]
    fn test_malformed_tokens_are_unusable() {
        let no_exp = encode_token(&json!({ "name": "Admin User" }));
        let not_json = format!("aGVhZGVy.{}.sig", URL_SAFE_NO_PAD.encode("not json"));
        let array = format!("aGVhZGVy.{}.sig", URL_SAFE_NO_PAD.encode("[1,2,3]"));
        let string_exp = encode_token(&json!({ "exp": "tomorrow" }));

        let cases = [
            "",
            "onlyone",
            "two.segments",
            "four.seg.ments.here",
            "header.!!!not-base64!!!.sig",
            "header..sig",
            not_json.as_str(),
            array.as_str(),
            no_exp.as_str(),
            string_exp.as_str(),
        ];

        for case in cases {
            assert!(!is_usable(case), "expected {:?} to be unusable", case);
        }
    }

    #[test]
    fn test_decode_errors_are_classified() {
        assert!(matches!(decode_claims("a.b"), Err(TokenError::Malformed(2))));
        assert!(matches!(decode_claims("a.@@@.c"), Err(TokenError::Encoding(_))));
        let no_exp = encode_token(&json!({ "sub": "42" }));
        assert!(matches!(decode_claims(&no_exp), Err(TokenError::MissingExpiry)));
    }

    #[test]
    fn test_standard_padded_payload_is_accepted() {
        // btoa-style payloads use the standard alphabet with padding
        let payload = STANDARD.encode(r#"{"exp":4102444800,"name":"Admin User"}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{}.simulated_signature", payload);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, 4_102_444_800);
        assert_eq!(claims.display_name(), Some("Admin User"));
    }

    #[test]
    fn test_claims_fields() {
        let token = encode_token(&json!({
            "sub": 1234567890,
            "iat": 1_700_000_000,
            "exp": 1_700_000_030.5,
            "role": "admin"
        }));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, 1_700_000_030);
        assert_eq!(claims.iat, Some(1_700_000_000));
        assert_eq!(claims.subject.as_deref(), Some("1234567890"));
        assert_eq!(claims.display_name(), Some("1234567890"));
        assert_eq!(claims.raw.get("role"), Some(&json!("admin")));
        assert_eq!(claims.seconds_remaining(1_700_000_000), 30);
        assert_eq!(claims.seconds_remaining(1_800_000_000), 0);
        assert_eq!(
            claims.issued_at().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_extreme_expiry_values() {
        let far = decode_claims(&token_with_exp(i64::MAX)).unwrap();
        assert_eq!(far.seconds_remaining(i64::MIN), i64::MAX);
        assert_eq!(far.seconds_remaining(0), i64::MAX);
        assert!(is_usable(&token_with_exp(i64::MAX)));

        let huge = decode_claims(&encode_token(&json!({ "exp": 1e300 }))).unwrap();
        assert_eq!(huge.exp, i64::MAX);
        assert!(huge.expires_at().is_none());

        let negative = decode_claims(&token_with_exp(i64::MIN)).unwrap();
        assert_eq!(negative.seconds_remaining(i64::MAX), 0);
        assert!(!is_usable(&token_with_exp(-1)));
    }
}
