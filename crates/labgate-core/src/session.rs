//! Session state management.
//!
//! `SessionStore` is the single source of truth for "who is logged in". It
//! owns an optional `SessionData`, reconciles it against the persistence
//! backend at startup, and exposes login/logout/query operations. Persistence
//! and parse failures never escape to the caller; every failure path degrades
//! to the anonymous state, with the stale record purged where possible.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::directory::{Directory, Role};
use crate::error::LoginError;
use crate::storage::StorageBackend;

/// Fixed key for the persisted session record.
const SESSION_KEY: &str = "current_user";

/// The currently authenticated identity.
///
/// Serialized with camelCase field names, so the stored record reads
/// `{"username": ..., "role": ..., "displayName": ...}`. The password is
/// never part of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub username: String,
    pub role: Role,
    pub display_name: String,
}

impl SessionData {
    /// Label to show for the signed-in user. Falls back to the username if
    /// the display name is empty.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

/// State-change observer. Receives the current session snapshot (or `None`
/// for anonymous) after restore, successful login, and logout.
type Subscriber = Box<dyn Fn(Option<&SessionData>)>;

/// Two-state session machine: anonymous, or authenticated with a
/// `SessionData`. All operations run synchronously to completion.
pub struct SessionStore<B: StorageBackend> {
    directory: Directory,
    backend: B,
    current: Option<SessionData>,
    subscribers: Vec<Subscriber>,
}

impl<B: StorageBackend> SessionStore<B> {
    /// Create a store in the anonymous state. Call `restore` to pick up a
    /// persisted session from a previous run.
    pub fn new(directory: Directory, backend: B) -> Self {
        Self {
            directory,
            backend,
            current: None,
            subscribers: Vec::new(),
        }
    }

    /// Re-hydrate the session from the persistence backend.
    ///
    /// A missing record leaves the store anonymous. A record that fails to
    /// parse, carries an unrecognized role, or references a username no
    /// longer in the directory is deleted and the store stays anonymous.
    /// Backend failures are logged and swallowed. Returns whether the store
    /// is authenticated afterwards.
    pub fn restore(&mut self) -> bool {
        self.current = None;
        match self.backend.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<SessionData>(&raw) {
                Ok(data) if self.directory.contains(&data.username) => {
                    debug!(username = %data.username, "Restored persisted session");
                    self.current = Some(data);
                }
                Ok(data) => {
                    warn!(
                        username = %data.username,
                        "Persisted session references unknown user, purging"
                    );
                    self.purge();
                }
                Err(e) => {
                    warn!(error = %e, "Persisted session is malformed, purging");
                    self.purge();
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
            }
        }
        self.notify();
        self.is_authenticated()
    }

    /// Authenticate against the credential directory.
    ///
    /// Exact string comparison on the password. On success the session is
    /// replaced (a second login overwrites the current one) and persisted;
    /// a persistence failure is logged but does not fail the login. On
    /// failure the current state, authenticated or not, is untouched.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), LoginError> {
        let entry = self
            .directory
            .verify(username, password)
            .ok_or(LoginError::InvalidCredentials)?;

        let data = SessionData {
            username: username.to_string(),
            role: entry.role,
            display_name: entry.display_name.clone(),
        };
        self.persist(&data);
        debug!(username = %data.username, role = ?data.role, "Login successful");
        self.current = Some(data);
        self.notify();
        Ok(())
    }

    /// Clear the session and delete the persisted record. Idempotent:
    /// logging out while anonymous is a no-op with the same end state.
    pub fn logout(&mut self) {
        if self.current.take().is_some() {
            debug!("Logged out");
        }
        self.purge();
        self.notify();
    }

    /// True iff a session is current. No side effects.
    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Read-only view of the current session.
    pub fn session(&self) -> Option<&SessionData> {
        self.current.as_ref()
    }

    /// Register a state-change observer. Subscribers are invoked after
    /// restore, successful login, and logout, with the new snapshot.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(Option<&SessionData>) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Direct access to the backend, mainly for inspection in tests.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn persist(&mut self, data: &SessionData) {
        match serde_json::to_string_pretty(data) {
            Ok(raw) => {
                if let Err(e) = self.backend.set(SESSION_KEY, &raw) {
                    warn!(error = %e, "Failed to persist session");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize session");
            }
        }
    }

    fn purge(&mut self) {
        if let Err(e) = self.backend.remove(SESSION_KEY) {
            warn!(error = %e, "Failed to remove persisted session");
        }
    }

    fn notify(&self) {
        let snapshot = self.current.as_ref();
        for subscriber in &self.subscribers {
            subscriber(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::bail;

    use super::*;
    use crate::storage::MemoryBackend;

    fn demo_store() -> SessionStore<MemoryBackend> {
        SessionStore::new(Directory::demo(), MemoryBackend::new())
    }

    /// Backend whose every operation fails, to exercise degraded paths.
    struct FailingBackend;

    impl StorageBackend for FailingBackend {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            bail!("storage unavailable")
        }
        fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            bail!("storage unavailable")
        }
        fn remove(&mut self, _key: &str) -> anyhow::Result<()> {
            bail!("storage unavailable")
        }
    }

    #[test]
    fn test_login_success_for_all_directory_entries() {
        for (username, password) in [("admin", "admin2024"), ("member", "member2024")] {
            let mut store = demo_store();
            assert!(store.login(username, password).is_ok());
            assert!(store.is_authenticated());
            assert_eq!(store.session().unwrap().username, username);
        }
    }

    #[test]
    fn test_login_copies_role_and_display_name() {
        let mut store = demo_store();
        store.login("admin", "admin2024").unwrap();

        let session = store.session().unwrap();
        assert_eq!(session.username, "admin");
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.display_name, "管理员");
    }

    #[test]
    fn test_login_wrong_password_fails() {
        let mut store = demo_store();
        assert_eq!(
            store.login("admin", "wrong"),
            Err(LoginError::InvalidCredentials)
        );
        assert!(!store.is_authenticated());
        assert!(!store.backend().contains("current_user"));
    }

    #[test]
    fn test_login_unknown_username_fails() {
        let mut store = demo_store();
        assert_eq!(
            store.login("ghost", "anything"),
            Err(LoginError::InvalidCredentials)
        );
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_failed_login_keeps_existing_session() {
        let mut store = demo_store();
        store.login("admin", "admin2024").unwrap();

        assert!(store.login("admin", "wrong").is_err());
        assert!(store.is_authenticated());
        assert_eq!(store.session().unwrap().username, "admin");

        assert!(store.login("ghost", "anything").is_err());
        assert_eq!(store.session().unwrap().username, "admin");
    }

    #[test]
    fn test_second_login_overwrites() {
        let mut store = demo_store();
        store.login("admin", "admin2024").unwrap();
        store.login("member", "member2024").unwrap();

        let session = store.session().unwrap();
        assert_eq!(session.username, "member");
        assert_eq!(session.role, Role::Member);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut store = demo_store();
        store.login("admin", "admin2024").unwrap();

        store.logout();
        assert!(!store.is_authenticated());
        assert!(!store.backend().contains("current_user"));

        store.logout();
        assert!(!store.is_authenticated());
        assert!(!store.backend().contains("current_user"));
    }

    #[test]
    fn test_restore_round_trip() {
        let mut store = demo_store();
        store.login("member", "member2024").unwrap();
        let persisted = store.backend().get("current_user").unwrap().unwrap();

        // Fresh store over the same persisted record, as after a restart
        let mut backend = MemoryBackend::new();
        backend.seed("current_user", &persisted);
        let mut restored = SessionStore::new(Directory::demo(), backend);

        assert!(restored.restore());
        let session = restored.session().unwrap();
        assert_eq!(session.username, "member");
        assert_eq!(session.role, Role::Member);
        assert_eq!(session.display_name, "实验室成员");
    }

    #[test]
    fn test_persisted_record_uses_camel_case() {
        let mut store = demo_store();
        store.login("admin", "admin2024").unwrap();

        let raw = store.backend().get("current_user").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["username"], "admin");
        assert_eq!(value["role"], "admin");
        assert_eq!(value["displayName"], "管理员");
        assert!(value.get("password").is_none());
    }

    #[test]
    fn test_restore_with_no_record_stays_anonymous() {
        let mut store = demo_store();
        assert!(!store.restore());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_restore_purges_malformed_record() {
        let mut backend = MemoryBackend::new();
        backend.seed("current_user", "not json at all {");
        let mut store = SessionStore::new(Directory::demo(), backend);

        assert!(!store.restore());
        assert!(!store.is_authenticated());
        assert!(!store.backend().contains("current_user"));
    }

    #[test]
    fn test_restore_purges_wrong_shape() {
        let mut backend = MemoryBackend::new();
        backend.seed("current_user", "{\"username\":\"admin\"}");
        let mut store = SessionStore::new(Directory::demo(), backend);

        assert!(!store.restore());
        assert!(!store.backend().contains("current_user"));
    }

    #[test]
    fn test_restore_purges_unknown_role() {
        let mut backend = MemoryBackend::new();
        backend.seed(
            "current_user",
            "{\"username\":\"admin\",\"role\":\"superuser\",\"displayName\":\"x\"}",
        );
        let mut store = SessionStore::new(Directory::demo(), backend);

        assert!(!store.restore());
        assert!(!store.backend().contains("current_user"));
    }

    #[test]
    fn test_restore_purges_unknown_username() {
        let mut backend = MemoryBackend::new();
        backend.seed(
            "current_user",
            "{\"username\":\"removedUser\",\"role\":\"member\",\"displayName\":\"Gone\"}",
        );
        let mut store = SessionStore::new(Directory::demo(), backend);

        assert!(!store.restore());
        assert!(!store.is_authenticated());
        assert!(!store.backend().contains("current_user"));
    }

    #[test]
    fn test_failing_backend_degrades_silently() {
        let mut store = SessionStore::new(Directory::demo(), FailingBackend);

        // Restore cannot read, so it degrades to anonymous
        assert!(!store.restore());

        // Login still succeeds in memory even though persistence failed
        assert!(store.login("admin", "admin2024").is_ok());
        assert!(store.is_authenticated());

        // Logout cannot remove the record but still clears the session
        store.logout();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let seen: Rc<RefCell<Vec<Option<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut store = demo_store();
        store.subscribe(move |session| {
            sink.borrow_mut()
                .push(session.map(|s| s.username.clone()));
        });

        store.restore();
        store.login("admin", "admin2024").unwrap();
        let _ = store.login("admin", "wrong"); // no notification on failure
        store.logout();

        assert_eq!(
            *seen.borrow(),
            vec![None, Some("admin".to_string()), None]
        );
    }

    #[test]
    fn test_label_falls_back_to_username() {
        let session = SessionData {
            username: "admin".to_string(),
            role: Role::Admin,
            display_name: String::new(),
        };
        assert_eq!(session.label(), "admin");

        let session = SessionData {
            username: "admin".to_string(),
            role: Role::Admin,
            display_name: "管理员".to_string(),
        };
        assert_eq!(session.label(), "管理员");
    }
}
