use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::session::AuthToken;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Durable home of the session token between runs.
///
/// Written only by the session manager (login, register, logout, failed
/// verify).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<AuthToken>, StoreError>;
    fn save(&self, token: &AuthToken) -> Result<(), StoreError>;
    /// Remove the stored token. Succeeds when nothing is stored.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Token kept in a single file, owner-readable only on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AuthToken>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(AuthToken::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn save(&self, token: &AuthToken) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        std::fs::write(&self.path, token.expose()).map_err(|e| self.io_err(e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_err(e))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// In-process store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<AuthToken>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AuthToken) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token))),
        }
    }

    /// Current contents, for inspection.
    pub fn get(&self) -> Option<AuthToken> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<AuthToken>> {
        self.slot.lock().expect("token store mutex poisoned")
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<AuthToken>, StoreError> {
        Ok(self.get())
    }

    fn save(&self, token: &AuthToken) -> Result<(), StoreError> {
        *self.slot() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip_and_idempotent_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("data").join("session-token"));

        assert_eq!(store.load().expect("load missing"), None);

        let token = AuthToken::new("eyJhbGciOi.payload.sig");
        store.save(&token).expect("save");
        assert_eq!(store.load().expect("load"), Some(token));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load cleared"), None);
        store.clear().expect("clear twice");
    }

    #[test]
    fn file_store_ignores_blank_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session-token");
        std::fs::write(&path, "  \n").expect("write");
        assert_eq!(FileTokenStore::new(path).load().expect("load"), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("session-token"));
        store.save(&AuthToken::new("t")).expect("save");
        let mode = std::fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryTokenStore::new();
        let view = store.clone();
        store.save(&AuthToken::new("abc")).expect("save");
        assert_eq!(view.get(), Some(AuthToken::new("abc")));
        view.clear().expect("clear");
        assert_eq!(store.load().expect("load"), None);
    }
}
