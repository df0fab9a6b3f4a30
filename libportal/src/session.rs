//! Session persistence
//!
//! [`SessionManager`] owns the authoritative in-memory session. Durable
//! storage only exists so that a restarted process can rehydrate it; every
//! read during normal operation goes through memory.
//!
//! Storage uses three keys: `accessToken`, `refreshToken` (optional) and
//! `currentUser` (the user serialized as JSON).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{Result, StorageError};
use crate::types::{Session, User};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Key/value backend for the persisted session
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Backend name for logs ("file", "memory")
    fn backend_name(&self) -> &str;
}

/// Process-local storage, used by tests and one-shot invocations
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored entry
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|count| *count).unwrap_or_default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        *self.writes.lock().map_err(|_| StorageError::Poisoned)? += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// JSON object file, rewritten on every change
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(StorageError::Io)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content).map_err(StorageError::Corrupt)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let content = serde_json::to_string_pretty(entries).map_err(StorageError::Corrupt)?;
        std::fs::write(&self.path, content).map_err(StorageError::Io)?;

        // Tokens live here: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms).map_err(StorageError::Io)?;
        }

        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// Authoritative session holder
pub struct SessionManager {
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    /// Rehydrate from storage without any network call
    ///
    /// Requires both a token and a user. A user entry that no longer parses
    /// is treated as no session.
    pub fn load(&self) -> Result<Option<Session>> {
        let token = self.storage.get(ACCESS_TOKEN_KEY)?;
        let user = self.storage.get(CURRENT_USER_KEY)?;

        let (token, user) = match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => (token, user),
            _ => {
                tracing::debug!(backend = self.storage.backend_name(), "No stored session");
                return Ok(None);
            }
        };

        let user: User = match serde_json::from_str(&user) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Stored user is unreadable, ignoring session: {}", e);
                return Ok(None);
            }
        };

        let session = Session {
            token,
            refresh_token: self.storage.get(REFRESH_TOKEN_KEY)?,
            user,
        };
        self.replace(Some(session.clone()));
        Ok(Some(session))
    }

    /// Persist `session` and make it current
    pub fn save(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user).map_err(StorageError::Corrupt)?;

        self.storage.set(ACCESS_TOKEN_KEY, &session.token)?;
        match &session.refresh_token {
            Some(refresh) => self.storage.set(REFRESH_TOKEN_KEY, refresh)?,
            None => self.storage.remove(REFRESH_TOKEN_KEY)?,
        }
        self.storage.set(CURRENT_USER_KEY, &user)?;

        self.replace(Some(session.clone()));
        tracing::debug!(user_id = %session.user.id, "Session saved");
        Ok(())
    }

    /// Replace the user of the current session, if there is one
    pub fn update_user(&self, user: User) -> Result<()> {
        match self.current() {
            Some(mut session) => {
                session.user = user;
                self.save(&session)
            }
            None => Ok(()),
        }
    }

    /// Replace the tokens of the current session, if there is one
    pub fn update_tokens(&self, token: String, refresh_token: Option<String>) -> Result<()> {
        match self.current() {
            Some(mut session) => {
                session.token = token;
                if refresh_token.is_some() {
                    session.refresh_token = refresh_token;
                }
                self.save(&session)
            }
            None => Ok(()),
        }
    }

    /// Forget the session in memory and in storage
    ///
    /// Memory is cleared first, so a storage failure never leaves a usable
    /// token behind.
    pub fn clear(&self) -> Result<()> {
        self.replace(None);
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        self.storage.remove(CURRENT_USER_KEY)?;
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .ok()
            .and_then(|current| current.as_ref().map(|s| s.token.clone()))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.current
            .read()
            .ok()
            .and_then(|current| current.as_ref().and_then(|s| s.refresh_token.clone()))
    }

    fn replace(&self, session: Option<Session>) {
        match self.current.write() {
            Ok(mut current) => *current = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use tempfile::TempDir;

    fn sample_session() -> Session {
        Session {
            token: "tok-123".to_string(),
            refresh_token: Some("ref-456".to_string()),
            user: User {
                id: "7".to_string(),
                full_name: "Lan Nguyen".to_string(),
                email: Some("lan@cinema.vn".to_string()),
                role_name: Some(Role::Staff),
                cinema_id: Some("3".to_string()),
                phone: None,
            },
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let writer = SessionManager::new(Arc::new(FileStorage::new(&path)));
        writer.save(&sample_session()).unwrap();

        let reader = SessionManager::new(Arc::new(FileStorage::new(&path)));
        assert!(reader.current().is_none());
        let loaded = reader.load().unwrap().unwrap();
        assert_eq!(loaded, sample_session());
        assert_eq!(reader.token().as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_clear_removes_all_keys() {
        let manager = SessionManager::in_memory();
        manager.save(&sample_session()).unwrap();
        manager.clear().unwrap();

        assert!(manager.current().is_none());
        assert!(manager.storage().get(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(manager.storage().get(REFRESH_TOKEN_KEY).unwrap().is_none());
        assert!(manager.storage().get(CURRENT_USER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_load_requires_token_and_user() {
        let storage = MemoryStorage::new();
        storage.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        let manager = SessionManager::new(Arc::new(storage));
        assert!(manager.load().unwrap().is_none());
    }

    #[test]
    fn test_load_ignores_corrupt_user() {
        let storage = MemoryStorage::new();
        storage.set(ACCESS_TOKEN_KEY, "tok").unwrap();
        storage.set(CURRENT_USER_KEY, "{not json").unwrap();
        let manager = SessionManager::new(Arc::new(storage));

        assert!(manager.load().unwrap().is_none());
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_save_without_refresh_token_removes_stale_one() {
        let manager = SessionManager::in_memory();
        manager.save(&sample_session()).unwrap();

        let mut session = sample_session();
        session.refresh_token = None;
        manager.save(&session).unwrap();

        assert!(manager.storage().get(REFRESH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_update_tokens_keeps_refresh_when_absent() {
        let manager = SessionManager::in_memory();
        manager.save(&sample_session()).unwrap();
        manager.update_tokens("tok-new".to_string(), None).unwrap();

        assert_eq!(manager.token().as_deref(), Some("tok-new"));
        assert_eq!(manager.refresh_token().as_deref(), Some("ref-456"));
    }

    #[test]
    fn test_update_user_without_session_is_noop() {
        let manager = SessionManager::in_memory();
        manager.update_user(sample_session().user).unwrap();
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("nested/session.json"));
        assert!(storage.get(ACCESS_TOKEN_KEY).unwrap().is_none());
        storage.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_file_storage_corrupt_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(storage.get(ACCESS_TOKEN_KEY).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        let storage = FileStorage::new(&path);
        storage.set(ACCESS_TOKEN_KEY, "tok").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_storage_counts_writes() {
        let storage = MemoryStorage::new();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.write_count(), 2);
        assert_eq!(storage.snapshot().len(), 1);
    }
}
