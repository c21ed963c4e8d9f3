//! In-memory repositories.
//!
//! Prototype-scale stores: `Mutex<HashMap>` behind an explicit context
//! object passed into each service constructor, never ambient singletons.
//! A production deployment would replace these with a real session store
//! and per-guid write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::model::{Session, User};

/// User repository, keyed by phone.
#[derive(Default)]
pub struct UserRepo {
    inner: Mutex<HashMap<String, User>>,
}

impl UserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_phone(&self, phone: &str) -> Option<User> {
        self.inner.lock().unwrap().get(phone).cloned()
    }

    /// Insert or replace the record for `user.phone`, stamping `updated_at`.
    pub fn upsert(&self, mut user: User) -> User {
        user.updated_at = Utc::now();
        self.inner
            .lock()
            .unwrap()
            .insert(user.phone.clone(), user.clone());
        user
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Session store, keyed by guid.
///
/// `get` clones out and `put` replaces wholesale; read-modify-write goes
/// through [`SessionStore::update`], which runs the closure under the map
/// lock so concurrent refreshes for the same (guid, app_id) serialize
/// instead of silently losing a write.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guid: &str) -> Option<Session> {
        self.inner.lock().unwrap().get(guid).cloned()
    }

    /// Replace any existing session for this guid.
    pub fn put(&self, session: Session) {
        self.inner
            .lock()
            .unwrap()
            .insert(session.guid.clone(), session);
    }

    /// Returns whether a session was actually removed.
    pub fn delete(&self, guid: &str) -> bool {
        self.inner.lock().unwrap().remove(guid).is_some()
    }

    /// Apply `f` to the session under the store lock. Returns `None` when
    /// no session exists for `guid`.
    pub fn update<R>(&self, guid: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.inner.lock().unwrap().get_mut(guid).map(f)
    }

    /// Iterate all (guid, session) pairs under the lock. Used by the token
    /// validator's linear scan; O(total app-sessions) by design at this
    /// scale.
    pub fn for_each(&self, mut f: impl FnMut(&str, &Session)) {
        for (guid, session) in self.inner.lock().unwrap().iter() {
            f(guid, session);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pending verification codes: phone → (code, expiry).
#[derive(Default)]
pub struct CodeStore {
    inner: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl CodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, phone: &str, code: &str, expires_at: DateTime<Utc>) {
        self.inner
            .lock()
            .unwrap()
            .insert(phone.to_string(), (code.to_string(), expires_at));
    }

    pub fn get(&self, phone: &str) -> Option<(String, DateTime<Utc>)> {
        self.inner.lock().unwrap().get(phone).cloned()
    }
}

/// Owns the server-side repositories. Services borrow shared handles from
/// here instead of reaching for globals.
#[derive(Clone, Default)]
pub struct PassportContext {
    pub users: Arc<UserRepo>,
    pub sessions: Arc<SessionStore>,
    pub codes: Arc<CodeStore>,
}

impl PassportContext {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{refresh_expires_from, AppSession, UserStatus};
    use chrono::Duration;
    use std::collections::HashMap as StdHashMap;

    fn session(guid: &str, token: &str) -> Session {
        let now = Utc::now();
        Session {
            guid: guid.into(),
            refresh_token: token.into(),
            refresh_token_expires_at: refresh_expires_from(now),
            apps: StdHashMap::new(),
        }
    }

    #[test]
    fn upsert_replaces_and_stamps_updated_at() {
        let repo = UserRepo::new();
        let created = Utc::now() - Duration::hours(1);
        let mut user = User::new("G1".into(), "13800138000".into(), created);
        user.updated_at = created;

        let saved = repo.upsert(user);
        assert!(saved.updated_at > created);

        let mut banned = saved.clone();
        banned.status = UserStatus::Banned;
        repo.upsert(banned);

        let found = repo.find_by_phone("13800138000").unwrap();
        assert_eq!(found.status, UserStatus::Banned);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn session_put_replaces_by_guid() {
        let store = SessionStore::new();
        store.put(session("G1", "R.old"));
        store.put(session("G1", "R.new"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("G1").unwrap().refresh_token, "R.new");
    }

    #[test]
    fn delete_is_idempotent() {
        let store = SessionStore::new();
        store.put(session("G1", "R.x"));
        assert!(store.delete("G1"));
        assert!(!store.delete("G1"));
        assert!(store.get("G1").is_none());
    }

    #[test]
    fn update_runs_under_the_lock() {
        let store = SessionStore::new();
        store.put(session("G1", "R.x"));

        let now = Utc::now();
        let inserted = store.update("G1", |s| {
            s.apps.insert(
                "app-a".into(),
                AppSession {
                    access_token: "A.1".into(),
                    access_token_expires_at: now,
                    last_active_at: now,
                },
            );
            s.apps.len()
        });
        assert_eq!(inserted, Some(1));
        assert!(store.update("missing", |_| ()).is_none());
    }

    #[test]
    fn code_store_round_trip() {
        let codes = CodeStore::new();
        assert!(codes.get("13800138000").is_none());

        let exp = Utc::now() + Duration::minutes(10);
        codes.save("13800138000", "246810", exp);
        let (code, expires_at) = codes.get("13800138000").unwrap();
        assert_eq!(code, "246810");
        assert_eq!(expires_at, exp);
    }
}
