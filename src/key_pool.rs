//! Per-request rotating pool of backend credentials.

use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use std::sync::Mutex;

#[derive(Debug)]
struct KeyPoolState {
    available: Vec<String>,
    cursor: usize,
}

/// Round-robin, shuffled pool of API keys. One instance lives per request.
///
/// Eviction is permanent and monotonic: once a key is evicted it never
/// returns to the pool for the lifetime of this instance.
#[derive(Debug)]
pub struct KeyPool {
    state: Mutex<KeyPoolState>,
}

impl KeyPool {
    /// Builds a pool from a non-empty set of credentials, shuffled to
    /// distribute load bias across requests.
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::config("no API keys configured"));
        }
        let mut available = keys;
        available.shuffle(&mut rand::thread_rng());
        Ok(Self {
            state: Mutex::new(KeyPoolState {
                available,
                cursor: 0,
            }),
        })
    }

    /// Returns the next credential in rotation, advancing the cursor.
    pub fn next(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.available.is_empty() {
            return Err(Error::PoolExhausted);
        }
        let key = state.available[state.cursor].clone();
        state.cursor = (state.cursor + 1) % state.available.len();
        Ok(key)
    }

    /// Permanently removes a key from the pool. No-op if already absent.
    pub fn evict(&self, key: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.available.iter().position(|k| k == key) {
            state.available.remove(pos);
            if state.available.is_empty() {
                state.cursor = 0;
            } else {
                state.cursor %= state.available.len();
            }
        }
    }

    /// Current number of live credentials.
    pub fn count(&self) -> usize {
        self.state.lock().unwrap().available.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_is_config_error() {
        let err = KeyPool::new(vec![]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_next_rotates_through_all_keys() {
        let pool = KeyPool::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..3 {
            seen.insert(pool.next().unwrap());
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(pool.count(), 3);
    }

    #[test]
    fn test_evict_is_permanent_and_idempotent() {
        let pool = KeyPool::new(vec!["a".into(), "b".into()]).unwrap();
        pool.evict("a");
        assert_eq!(pool.count(), 1);
        pool.evict("a");
        assert_eq!(pool.count(), 1);
        assert_eq!(pool.next().unwrap(), "b");
    }

    #[test]
    fn test_evict_to_empty_resets_cursor() {
        let pool = KeyPool::new(vec!["only".into()]).unwrap();
        pool.evict("only");
        assert_eq!(pool.count(), 0);
        assert!(matches!(pool.next(), Err(Error::PoolExhausted)));
    }
}
