use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

/// Stores a mapping from request URL (host + path-info, so virtual hosts
/// partition the lock space) to an opaque lock token.
///
/// Two implementations ship with this crate, selected by `LockPolicy`:
/// `NoOpLockCache` (degenerate, the default) and `MapLockCache` (full
/// get-and-compare enforcement).
pub trait LockCache: Send + Sync {
    /// Insert (idempotently replacing) a lock for `key`, returning the
    /// fresh token.
    fn lock(&self, key: &str) -> String;

    /// Remove the lock for `key` if `token` matches. Returns `true` if a
    /// lock was removed.
    fn unlock(&self, key: &str, token: &str) -> bool;

    /// Returns `Ok(())` if there is no lock on `key`, or the submitted
    /// tokens contain a match. Returns `Err(())` on a locked, unmatched key.
    fn check(&self, key: &str, submitted_tokens: &[&str]) -> Result<(), ()>;

    /// Remove any lock at `key` unconditionally (after a successful DELETE
    /// or MOVE of that resource).
    fn delete(&self, key: &str);
}

/// The degenerate lock: `lock` always succeeds and is never recorded,
/// `check` always passes.
#[derive(Debug, Default)]
pub struct NoOpLockCache;

impl LockCache for NoOpLockCache {
    fn lock(&self, _key: &str) -> String {
        Uuid::new_v4().to_string()
    }

    fn unlock(&self, _key: &str, _token: &str) -> bool {
        false
    }

    fn check(&self, _key: &str, _submitted_tokens: &[&str]) -> Result<(), ()> {
        Ok(())
    }

    fn delete(&self, _key: &str) {}
}

/// An in-process key/value store: set-if-absent on LOCK, get-and-compare
/// on writes, removal on UNLOCK.
#[derive(Debug, Default)]
pub struct MapLockCache {
    locks: Mutex<HashMap<String, String>>,
}

impl MapLockCache {
    pub fn new() -> Self {
        MapLockCache { locks: Mutex::new(HashMap::new()) }
    }
}

impl LockCache for MapLockCache {
    fn lock(&self, key: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.locks.lock().unwrap().insert(key.to_string(), token.clone());
        token
    }

    fn unlock(&self, key: &str, token: &str) -> bool {
        let mut locks = self.locks.lock().unwrap();
        match locks.get(key) {
            Some(t) if t == token => {
                locks.remove(key);
                true
            }
            _ => false,
        }
    }

    fn check(&self, key: &str, submitted_tokens: &[&str]) -> Result<(), ()> {
        let locks = self.locks.lock().unwrap();
        match locks.get(key) {
            None => Ok(()),
            Some(t) if submitted_tokens.iter().any(|s| s == t) => Ok(()),
            Some(_) => Err(()),
        }
    }

    fn delete(&self, key: &str) {
        self.locks.lock().unwrap().remove(key);
    }
}
