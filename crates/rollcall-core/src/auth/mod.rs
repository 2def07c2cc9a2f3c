//! Authentication module for managing the session token.
//!
//! This module provides:
//! - `TokenStore`: Single-slot durable token storage over a `KeyValueStore`
//!   (memory, JSON file, or OS keyring)
//! - `token`: Unverified decoding of the token payload and expiry checks
//! - `Session`: Login status derived from the stored token

pub mod session;
pub mod store;
pub mod token;

pub use session::{Session, SessionStatus};
pub use store::{
    FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError, Token, TokenStore, TOKEN_KEY,
};
pub use token::{decode_claims, is_usable, is_usable_at, Claims, TokenError};
