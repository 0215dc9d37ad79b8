//! Process-wide session state: the public profile plus the bearer token.
//!
//! Memory is the source of truth. Every mutation publishes to observers first
//! and then mirrors to the durable key-value surface on a best-effort basis.

pub mod storage;

use crate::{models::UserProfile, models::UserWithToken, schema::registry};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, sync::Arc};
use tokio::sync::watch;
use tracing::{debug, warn};

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

pub const USER_KEY: &str = "auth_user";
pub const TOKEN_KEY: &str = "auth_token";

pub struct ActiveSession {
    user: UserProfile,
    token: SecretString,
}

impl ActiveSession {
    #[must_use]
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl Clone for ActiveSession {
    fn clone(&self) -> Self {
        Self {
            user: self.user.clone(),
            token: SecretString::from(self.token.expose_secret().to_owned()),
        }
    }
}

impl fmt::Debug for ActiveSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ActiveSession")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// User and token are present together or not at all.
#[derive(Clone, Debug, Default)]
pub struct Session {
    active: Option<ActiveSession>,
}

impl Session {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.active.as_ref().map(ActiveSession::user)
    }

    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.active.as_ref().map(ActiveSession::token)
    }
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Creates a store with no session. Call [`SessionStore::hydrate`] to load
    /// a persisted one.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self { storage, state }
    }

    /// Creates a store and hydrates it from `storage`.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let store = Self::new(storage);
        store.hydrate();
        store
    }

    /// Loads the persisted pair. Anything short of a valid user and a
    /// non-empty token resolves to no session.
    pub fn hydrate(&self) {
        let session = match self.load() {
            Some(active) => {
                debug!(user_id = active.user.id, "Restored persisted session");
                Session {
                    active: Some(active),
                }
            }
            None => Session::default(),
        };
        self.state.send_replace(session);
    }

    fn load(&self) -> Option<ActiveSession> {
        let user = self.read(USER_KEY)?;
        let token = self.read(TOKEN_KEY)?;
        if token.is_empty() {
            debug!("Persisted token is empty");
            return None;
        }

        let value: serde_json::Value = match serde_json::from_str(&user) {
            Ok(value) => value,
            Err(err) => {
                debug!("Persisted user is not JSON: {err}");
                return None;
            }
        };
        match registry::user_without_token().parse::<UserProfile>(&value) {
            Ok(user) => Some(ActiveSession {
                user,
                token: SecretString::from(token),
            }),
            Err(issues) => {
                debug!("Persisted user failed validation: {issues}");
                None
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!("Failed to read {key}: {err}");
                None
            }
        }
    }

    /// Replaces the current session with `user` and persists it.
    pub fn login(&self, user: UserWithToken) {
        let (user, token) = user.into_parts();
        let persisted = serde_json::to_string(&user);
        let secret = token.expose_secret().to_owned();

        self.state.send_replace(Session {
            active: Some(ActiveSession { user, token }),
        });

        let result = persisted
            .map_err(|err| err.to_string())
            .and_then(|user| {
                self.storage
                    .set(USER_KEY, &user)
                    .and_then(|()| self.storage.set(TOKEN_KEY, &secret))
                    .map_err(|err| err.to_string())
            });
        if let Err(err) = result {
            warn!("Failed to persist session: {err}");
            // Never leave a stale token next to a new user.
            self.forget();
        }
    }

    /// Clears the current session and its persisted copy.
    pub fn logout(&self) {
        self.state.send_replace(Session::default());
        self.forget();
    }

    fn forget(&self) {
        for key in [USER_KEY, TOKEN_KEY] {
            if let Err(err) = self.storage.remove(key) {
                warn!("Failed to remove {key}: {err}");
            }
        }
    }

    #[must_use]
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.borrow().is_active()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user().cloned()
    }

    /// Copy of the bearer token, if a session is active.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.state
            .borrow()
            .token()
            .map(|token| SecretString::from(token.expose_secret().to_owned()))
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionStore")
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn user_with_token(id: i64, token: &str) -> UserWithToken {
        serde_json::from_value(json!({
            "id": id,
            "username": "alice",
            "email": "alice@example.com",
            "avatar": null,
            "twoFa": false,
            "createdAt": 1_700_000_000,
            "token": token
        }))
        .expect("Failed to deserialize")
    }

    /// Store whose writes fail once `broken` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        broken: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.broken.load(Ordering::SeqCst) && key == TOKEN_KEY {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn login_persists_and_hydrate_restores() {
        let storage = Arc::new(MemoryStore::new());
        let store = SessionStore::new(storage.clone());
        store.login(user_with_token(7, "bearer-1"));

        let persisted = storage.get(USER_KEY).unwrap().unwrap();
        assert!(!persisted.contains("bearer-1"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("bearer-1"));

        let restored = SessionStore::open(storage);
        assert_eq!(restored.user().map(|user| user.id), Some(7));
        assert_eq!(
            restored.token().map(|t| t.expose_secret().to_owned()),
            Some("bearer-1".to_string())
        );
    }

    #[test]
    fn hydrate_treats_partial_data_as_no_session() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(TOKEN_KEY, "bearer").unwrap();
        assert!(!SessionStore::open(storage.clone()).is_active());

        storage.remove(TOKEN_KEY).unwrap();
        storage
            .set(USER_KEY, &json!({ "id": 1 }).to_string())
            .unwrap();
        assert!(!SessionStore::open(storage).is_active());
    }

    #[test]
    fn hydrate_rejects_malformed_or_invalid_user() {
        for user in [
            "{not json".to_string(),
            json!({ "id": "7", "username": "alice" }).to_string(),
            json!({
                "id": 7,
                "username": "bad name",
                "email": "alice@example.com",
                "twoFa": false,
                "createdAt": 1
            })
            .to_string(),
        ] {
            let storage = Arc::new(MemoryStore::new());
            storage.set(USER_KEY, &user).unwrap();
            storage.set(TOKEN_KEY, "bearer").unwrap();
            assert!(!SessionStore::open(storage).is_active(), "{user}");
        }
    }

    #[test]
    fn hydrate_rejects_empty_token() {
        let storage = Arc::new(MemoryStore::new());
        let store = SessionStore::new(storage.clone());
        store.login(user_with_token(7, "bearer"));
        storage.set(TOKEN_KEY, "").unwrap();
        assert!(!SessionStore::open(storage).is_active());
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let storage = Arc::new(MemoryStore::new());
        let store = SessionStore::new(storage.clone());
        store.login(user_with_token(7, "bearer"));
        store.logout();

        assert!(!store.is_active());
        assert!(store.token().is_none());
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn persistence_failure_keeps_memory_and_drops_stale_pair() {
        let storage = Arc::new(FlakyStore::default());
        let store = SessionStore::new(storage.clone());
        store.login(user_with_token(1, "old"));

        storage.broken.store(true, Ordering::SeqCst);
        store.login(user_with_token(2, "new"));

        assert_eq!(store.user().map(|user| user.id), Some(2));
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert!(!SessionStore::open(storage).is_active());
    }

    #[test]
    fn observers_see_every_transition() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        let mut rx = store.subscribe();

        store.login(user_with_token(3, "bearer"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().user().map(|user| user.id), Some(3));

        store.logout();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_active());
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        store.login(user_with_token(3, "bearer-secret"));
        assert!(!format!("{store:?}").contains("bearer-secret"));
    }
}
