//! Session state and durable persistence.
//! The session is the only shared mutable resource in the access layer. It is
//! owned by a `SessionHandle` passed explicitly to the client (no ambient
//! global), and mirrored to a small JSON vault file so a restarted process
//! resumes logged in. Vault keys match the backend's storage contract: the
//! user is stored as a serialized JSON string next to the two tokens.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::model::User;

pub const VAULT_FILE: &str = "session.json";

const KEY_USER: &str = "user";
const KEY_ACCESS: &str = "accessToken";
const KEY_REFRESH: &str = "refreshToken";

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
}

/// File-backed persistence for the session, read once at startup and cleared
/// entirely on logout.
#[derive(Debug, Clone)]
pub struct SessionVault {
    path: PathBuf,
}

impl SessionVault {
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join(VAULT_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted session, if any. Unreadable or partial vault files
    /// yield whatever fields survived; a vault without an access token seeds a
    /// logged-out session.
    pub fn load(&self) -> Option<Session> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let map: Value = serde_json::from_str(&raw).ok()?;
        let access = map.get(KEY_ACCESS).and_then(Value::as_str).map(str::to_string);
        let refresh = map.get(KEY_REFRESH).and_then(Value::as_str).map(str::to_string);
        let user = map
            .get(KEY_USER)
            .and_then(Value::as_str)
            .and_then(|s| serde_json::from_str::<User>(s).ok());
        Some(Session {
            is_authenticated: access.is_some(),
            user,
            access_token: access,
            refresh_token: refresh,
        })
    }

    pub fn save(&self, session: &Session) -> ApiResult<()> {
        let mut map = serde_json::Map::new();
        if let Some(user) = &session.user {
            let serialized = serde_json::to_string(user)?;
            map.insert(KEY_USER.to_string(), Value::String(serialized));
        }
        if let Some(token) = &session.access_token {
            map.insert(KEY_ACCESS.to_string(), Value::String(token.clone()));
        }
        if let Some(token) = &session.refresh_token {
            map.insert(KEY_REFRESH.to_string(), Value::String(token.clone()));
        }
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| ApiError::io(format!("vault dir {}: {}", dir.display(), e)))?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(map))?)
            .map_err(|e| ApiError::io(format!("vault write {}: {}", self.path.display(), e)))
    }

    pub fn clear(&self) {
        if self.path.exists() {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Cloneable handle on the shared session. Mutated only by the
/// reauthentication interceptor (token bump) and the explicit login/logout
/// operations; reads take cheap snapshots.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
    vault: Option<SessionVault>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    /// In-memory session, not persisted anywhere.
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(Session::default())), vault: None }
    }

    /// Session mirrored to a vault file under `dir`, seeded from it when one
    /// already exists.
    pub fn with_vault(dir: &Path) -> Self {
        let vault = SessionVault::new(dir);
        let seeded = vault.load().unwrap_or_default();
        if seeded.is_authenticated {
            debug!("session seeded from vault at {}", vault.path().display());
        }
        Self { inner: Arc::new(RwLock::new(seeded)), vault: Some(vault) }
    }

    pub fn snapshot(&self) -> Session {
        self.inner.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.read().refresh_token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_authenticated
    }

    /// Installs a full credential set (login/signup/QR auth success).
    pub fn set_credentials(&self, user: Option<User>, access_token: String, refresh_token: String) {
        {
            let mut session = self.inner.write();
            session.user = user;
            session.access_token = Some(access_token);
            session.refresh_token = Some(refresh_token);
            session.is_authenticated = true;
        }
        self.persist();
    }

    /// Replaces only the access token (refresh exchange); user and refresh
    /// token stay as they are.
    pub fn bump_access_token(&self, access_token: String) {
        {
            let mut session = self.inner.write();
            session.access_token = Some(access_token);
            session.is_authenticated = true;
        }
        self.persist();
    }

    /// Logs out: wipes every field and the vault file.
    pub fn clear(&self) {
        {
            let mut session = self.inner.write();
            *session = Session::default();
        }
        if let Some(vault) = &self.vault {
            vault.clear();
        }
    }

    fn persist(&self) {
        if let Some(vault) = &self.vault {
            let snapshot = self.snapshot();
            if let Err(e) = vault.save(&snapshot) {
                // A failed mirror must not fail the auth flow itself.
                warn!("session vault write failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_lifecycle() {
        let handle = SessionHandle::new();
        assert!(!handle.is_authenticated());

        handle.set_credentials(None, "acc-1".into(), "ref-1".into());
        assert!(handle.is_authenticated());
        assert_eq!(handle.access_token().as_deref(), Some("acc-1"));
        assert_eq!(handle.refresh_token().as_deref(), Some("ref-1"));

        handle.bump_access_token("acc-2".into());
        assert_eq!(handle.access_token().as_deref(), Some("acc-2"));
        assert_eq!(handle.refresh_token().as_deref(), Some("ref-1"));

        handle.clear();
        assert!(!handle.is_authenticated());
        assert!(handle.access_token().is_none());
        assert!(handle.refresh_token().is_none());
        assert!(handle.user().is_none());
    }
}
