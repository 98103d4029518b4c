//! Session persistence.
//!
//! The session (user + token) lives as two key-value pairs duplicated across
//! two storage scopes: a durable scope that survives process restart (a JSON
//! map on disk) and an ephemeral scope cleared at process end (in memory).
//! A `remember_me` flag, itself always durable, records which scope a later
//! restore should read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::AppResult;

use super::user::User;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_DATA_KEY: &str = "user_data";
pub const REMEMBER_KEY: &str = "remember_me";

/// A flat string key-value scope. Implementations decide durability.
pub trait KeyValueScope: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Process-lifetime scope; contents vanish when the process exits.
#[derive(Default)]
pub struct MemoryScope {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueScope for MemoryScope {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.write().remove(key);
    }
}

/// Durable scope backed by a single JSON object file. The whole map is
/// rewritten on every mutation; the payload is three small keys.
pub struct FileScope {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl FileScope {
    /// Open (or create) the scope at `path`. An unreadable or unparsable
    /// existing file is treated as empty rather than fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        let cache = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<HashMap<String, String>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!("state file {} unparsable ({}), starting empty", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Ok(Self { path, cache: RwLock::new(cache) })
    }

    fn flush(&self, map: &HashMap<String, String>) {
        match serde_json::to_string_pretty(map) {
            Ok(text) => {
                if let Err(e) = std::fs::write(&self.path, text) {
                    warn!("failed to write state file {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("failed to serialize state map: {}", e),
        }
    }
}

impl KeyValueScope for FileScope {
    fn get(&self, key: &str) -> Option<String> {
        self.cache.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.cache.write();
        map.insert(key.to_string(), value.to_string());
        self.flush(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.cache.write();
        if map.remove(key).is_some() {
            self.flush(&map);
        }
    }
}

/// The session store proper: one durable and one ephemeral scope, selected
/// by the `remember` flag at persist time.
pub struct SessionStore {
    durable: Box<dyn KeyValueScope>,
    ephemeral: Box<dyn KeyValueScope>,
}

impl SessionStore {
    pub fn new(durable: Box<dyn KeyValueScope>, ephemeral: Box<dyn KeyValueScope>) -> Self {
        Self { durable, ephemeral }
    }

    /// Store rooted at `state_dir/session.json` for the durable scope, with
    /// an in-memory ephemeral scope.
    pub fn open(state_dir: &Path) -> Result<Self> {
        let durable = FileScope::open(state_dir.join("session.json"))?;
        Ok(Self::new(Box::new(durable), Box::new(MemoryScope::new())))
    }

    /// Fully in-memory store for tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryScope::new()), Box::new(MemoryScope::new()))
    }

    fn scope(&self, remember: bool) -> &dyn KeyValueScope {
        if remember {
            self.durable.as_ref()
        } else {
            self.ephemeral.as_ref()
        }
    }

    /// Write user + token into the scope selected by `remember` and record
    /// the flag itself durably so a later restore reads the right scope.
    pub fn persist(&self, user: &User, token: &str, remember: bool) -> AppResult<()> {
        let user_json = serde_json::to_string(user)
            .map_err(|e| crate::error::AppError::internal(format!("serializing user: {}", e)))?;
        let scope = self.scope(remember);
        scope.set(USER_DATA_KEY, &user_json);
        scope.set(AUTH_TOKEN_KEY, token);
        if remember {
            self.durable.set(REMEMBER_KEY, "true");
        } else {
            self.durable.remove(REMEMBER_KEY);
        }
        debug!("session persisted for {} (remember={})", user.email, remember);
        Ok(())
    }

    /// True when a previous persist asked to be remembered across restarts.
    pub fn remembered(&self) -> bool {
        self.durable.get(REMEMBER_KEY).as_deref() == Some("true")
    }

    /// Read back (user, token) from the recorded scope. Returns None when
    /// either key is missing; a corrupt `user_data` additionally clears both
    /// scopes so the broken state cannot stick.
    pub fn restore(&self) -> Option<(User, String)> {
        let scope = self.scope(self.remembered());
        let token = scope.get(AUTH_TOKEN_KEY)?;
        let user_json = scope.get(USER_DATA_KEY)?;
        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Some((user, token)),
            Err(e) => {
                warn!("stored user_data unparsable ({}), clearing session storage", e);
                self.clear();
                None
            }
        }
    }

    /// Remove all session keys from both scopes. Idempotent.
    pub fn clear(&self) {
        for scope in [self.durable.as_ref(), self.ephemeral.as_ref()] {
            scope.remove(USER_DATA_KEY);
            scope.remove(AUTH_TOKEN_KEY);
        }
        self.durable.remove(REMEMBER_KEY);
        self.ephemeral.remove(REMEMBER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn demo_user() -> User {
        User::new("u1", "Grace Lin", "teacher@school.edu", Role::Teacher)
    }

    #[test]
    fn persist_remember_round_trips_through_durable_scope() {
        let store = SessionStore::in_memory();
        store.persist(&demo_user(), "tok-1", true).unwrap();
        assert!(store.remembered());
        let (user, token) = store.restore().expect("restorable");
        assert_eq!(user.email, "teacher@school.edu");
        assert_eq!(token, "tok-1");
    }

    #[test]
    fn persist_without_remember_uses_ephemeral_scope() {
        let store = SessionStore::in_memory();
        store.persist(&demo_user(), "tok-2", false).unwrap();
        assert!(!store.remembered());
        // Restorable within the same process
        assert!(store.restore().is_some());
        // The durable scope never saw the session keys
        assert!(store.durable.get(USER_DATA_KEY).is_none());
        assert!(store.durable.get(AUTH_TOKEN_KEY).is_none());
    }

    #[test]
    fn corrupt_user_data_clears_storage() {
        let store = SessionStore::in_memory();
        store.persist(&demo_user(), "tok-3", true).unwrap();
        store.durable.set(USER_DATA_KEY, "{not json");
        assert!(store.restore().is_none());
        // Cleared: even the well-formed token is gone and the flag dropped
        assert!(store.durable.get(AUTH_TOKEN_KEY).is_none());
        assert!(!store.remembered());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::in_memory();
        store.persist(&demo_user(), "tok-4", true).unwrap();
        store.clear();
        store.clear();
        assert!(store.restore().is_none());
    }
}
