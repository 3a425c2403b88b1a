//! Workspace connection state and the secret store that persists it.
//!
//! A single `WorkspaceConnection` record describes the active remote
//! workspace. It is written only by the register / connect / refresh-token
//! flows and read through from the store before every authenticated call —
//! there is no in-memory cache beyond one request's lifetime.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Key of the single workspace connection entry.
const CONNECTION_KEY: &str = "connection";
/// Namespace prefix for per-data-source password entries.
const DS_PASSWORD_NS: &str = "ds-password";

// ─── Records ──────────────────────────────────────────────────────────────────

/// Bearer token with its expiry timestamp (unix seconds, UTC).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token: String,
    pub expire_at: i64,
}

/// The active remote workspace connection.
///
/// Created by register/connect, mutated by token refresh, owned exclusively
/// by the secret store. One instance per active session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConnection {
    pub name: String,
    pub url: String,
    pub service_endpoint: String,
    pub builder_endpoint: String,
    pub access_key: String,
    pub token: Option<Token>,
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    /// An authenticated action was attempted with no stored connection.
    /// The caller should prompt the user to register or connect.
    #[error("no workspace connection — register or connect first")]
    MissingSession,

    #[error("secret store I/O failed: {0}")]
    Store(#[from] std::io::Error),

    #[error("secret store entry is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// ─── SecretStore ──────────────────────────────────────────────────────────────

/// Persistent key/value store for secrets.
///
/// The workbench stores exactly two kinds of entries: the serialized
/// workspace connection, and per-data-source plaintext passwords keyed by a
/// derived name (see [`ds_password_key`]).
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn put(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn delete(&self, key: &str) -> Result<(), SessionError>;

    /// Move an entry under a new key, used when a rename changes the
    /// derived key of a stored credential. Missing source is a no-op.
    fn rename(&self, old: &str, new: &str) -> Result<(), SessionError> {
        if let Some(value) = self.get(old)? {
            self.put(new, &value)?;
            self.delete(old)?;
        }
        Ok(())
    }
}

/// Derived entry name for a data-source password: a fixed namespace plus the
/// SHA-256 hex digest of the data source's remote URI.
pub fn ds_password_key(remote_uri: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(remote_uri.as_bytes());
    format!("{}:{}", DS_PASSWORD_NS, hex::encode(hasher.finalize()))
}

// ─── FileSecretStore ──────────────────────────────────────────────────────────

/// Flat JSON map persisted at `{data_dir}/secrets.json` (0600 on unix).
///
/// Each operation re-reads the file — the store is the source of truth, not
/// any in-process copy.
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn delete(&self, key: &str) -> Result<(), SessionError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ─── SessionState ─────────────────────────────────────────────────────────────

/// Read-through access to the active workspace connection.
pub struct SessionState {
    store: Box<dyn SecretStore>,
}

impl SessionState {
    pub fn new(store: impl SecretStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// The current connection, re-read from the store on every call.
    ///
    /// Errors with [`SessionError::MissingSession`] when nothing is stored.
    pub fn current(&self) -> Result<WorkspaceConnection, SessionError> {
        match self.store.get(CONNECTION_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Err(SessionError::MissingSession),
        }
    }

    /// Replace the stored connection (register / connect / refresh-token).
    pub fn save(&self, connection: &WorkspaceConnection) -> Result<(), SessionError> {
        debug!(workspace = %connection.name, "saving workspace connection");
        let raw = serde_json::to_string(connection)?;
        self.store.put(CONNECTION_KEY, &raw)
    }

    /// Update only the token of the stored connection.
    pub fn save_token(&self, token: Token) -> Result<WorkspaceConnection, SessionError> {
        let mut connection = self.current()?;
        connection.token = Some(token);
        self.save(&connection)?;
        Ok(connection)
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.delete(CONNECTION_KEY)
    }

    // ─── Data-source passwords ────────────────────────────────────────────────

    pub fn get_ds_password(&self, remote_uri: &str) -> Result<Option<String>, SessionError> {
        self.store.get(&ds_password_key(remote_uri))
    }

    pub fn put_ds_password(&self, remote_uri: &str, password: &str) -> Result<(), SessionError> {
        self.store.put(&ds_password_key(remote_uri), password)
    }

    /// Re-associate a stored credential after a rename changed its URI.
    pub fn rename_ds_password(&self, old_uri: &str, new_uri: &str) -> Result<(), SessionError> {
        self.store
            .rename(&ds_password_key(old_uri), &ds_password_key(new_uri))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_connection() -> WorkspaceConnection {
        WorkspaceConnection {
            name: "acme".to_string(),
            url: "https://builder.example/ws/acme".to_string(),
            service_endpoint: "https://builder.example".to_string(),
            builder_endpoint: "https://builder.example/builder".to_string(),
            access_key: "key-123".to_string(),
            token: Some(Token {
                token: "jwt".to_string(),
                expire_at: 1_900_000_000,
            }),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> SessionState {
        SessionState::new(FileSecretStore::new(dir.path().join("secrets.json")))
    }

    #[test]
    fn missing_session_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let session = store_in(&dir);
        assert!(matches!(
            session.current(),
            Err(SessionError::MissingSession)
        ));
    }

    #[test]
    fn save_and_read_through() {
        let dir = tempfile::tempdir().unwrap();
        let session = store_in(&dir);
        session.save(&sample_connection()).unwrap();
        let got = session.current().unwrap();
        assert_eq!(got, sample_connection());
    }

    #[test]
    fn token_refresh_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let session = store_in(&dir);
        session.save(&sample_connection()).unwrap();
        let updated = session
            .save_token(Token {
                token: "jwt2".to_string(),
                expire_at: 2_000_000_000,
            })
            .unwrap();
        assert_eq!(updated.access_key, "key-123");
        assert_eq!(updated.token.unwrap().token, "jwt2");
    }

    #[test]
    fn ds_password_key_is_namespaced_digest() {
        let key = ds_password_key("acme/app1/src/datasource.json");
        assert!(key.starts_with("ds-password:"));
        // hex sha256 is 64 chars
        assert_eq!(key.len(), "ds-password:".len() + 64);
        // deterministic
        assert_eq!(key, ds_password_key("acme/app1/src/datasource.json"));
    }

    #[test]
    fn rename_moves_credential() {
        let dir = tempfile::tempdir().unwrap();
        let session = store_in(&dir);
        session.put_ds_password("acme/old", "secret").unwrap();
        session.rename_ds_password("acme/old", "acme/new").unwrap();
        assert_eq!(session.get_ds_password("acme/old").unwrap(), None);
        assert_eq!(
            session.get_ds_password("acme/new").unwrap().as_deref(),
            Some("secret")
        );
    }
}
