//! Durable single-slot storage for the session token.
//!
//! `TokenStore` sits on top of a `KeyValueStore` backend. Every read goes
//! straight to the backend; there is no in-memory copy to go stale.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Key the session token is persisted under
pub const TOKEN_KEY: &str = "jwt_token";

/// File name of the file-backed store inside the cache directory
const STORE_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access token file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Minimal key-value interface over a durable store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a key that is not present is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Backends
// ============================================================================

/// Process-local store, mostly for tests and `--store memory`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// JSON file in the cache directory holding a flat string map.
pub struct FileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(self.path(), contents)?;
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.guard();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            if entries.is_empty() {
                std::fs::remove_file(self.path())?;
            } else {
                self.write_all(&entries)?;
            }
        }
        Ok(())
    }
}

/// OS keychain, one entry per key under a fixed service name.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Token store
// ============================================================================

/// Opaque session token as issued by the login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Holds zero or one session token. Clone is cheap and every clone sees
/// the same backend.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get(&self) -> Result<Option<Token>, StoreError> {
        Ok(self.backend.get(TOKEN_KEY)?.map(Token))
    }

    /// Replace whatever token is stored. No validation is done here.
    pub fn save(&self, token: &Token) -> Result<(), StoreError> {
        debug!("Saving session token");
        self.backend.set(TOKEN_KEY, token.as_str())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        debug!("Clearing session token");
        self.backend.delete(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_get_round_trips() {
        let store = TokenStore::in_memory();
        let token = Token::new("a.b.c");
        store.save(&token).unwrap();
        assert_eq!(store.get().unwrap(), Some(token));
    }

    #[test]
    fn test_save_replaces_previous_token() {
        let store = TokenStore::in_memory();
        store.save(&Token::new("first")).unwrap();
        store.save(&Token::new("second")).unwrap();
        assert_eq!(store.get().unwrap().unwrap().as_str(), "second");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = TokenStore::in_memory();
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);

        store.save(&Token::new("x.y.z")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_store_accepts_malformed_tokens() {
        let store = TokenStore::in_memory();
        store.save(&Token::new("not a jwt")).unwrap();
        assert_eq!(store.get().unwrap().unwrap().as_str(), "not a jwt");
    }

    #[test]
    fn test_clones_share_backend() {
        let store = TokenStore::in_memory();
        let other = store.clone();
        store.save(&Token::new("shared")).unwrap();
        assert_eq!(other.get().unwrap().unwrap().as_str(), "shared");
        other.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Arc::new(FileStore::new(dir.path().to_path_buf())));
        store.save(&Token::new("persisted")).unwrap();

        let reopened = TokenStore::new(Arc::new(FileStore::new(dir.path().to_path_buf())));
        assert_eq!(reopened.get().unwrap().unwrap().as_str(), "persisted");

        reopened.clear().unwrap();
        assert!(!dir.path().join(STORE_FILE).exists());
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_directory_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileStore::new(dir.path().join("nested").join("deeper"));
        assert_eq!(backend.get(TOKEN_KEY).unwrap(), None);
        backend.delete(TOKEN_KEY).unwrap();
        backend.set(TOKEN_KEY, "v").unwrap();
        assert_eq!(backend.get(TOKEN_KEY).unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), "{not json").unwrap();
        let backend = FileStore::new(dir.path().to_path_buf());
        assert!(matches!(backend.get(TOKEN_KEY), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("secret.payload.sig");
        assert_eq!(format!("{:?}", token), "Token(<redacted>)");
    }
}
