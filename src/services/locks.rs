//! Striped async locks keyed by entry identity.
//!
//! Two requests for the same `(user, kind, mal_id)` always map to the same
//! stripe and run one after the other. Unrelated keys may share a stripe,
//! which only costs a little extra waiting.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::EntryKey;

#[derive(Clone)]
pub struct KeyedLocks {
    stripes: Arc<[Arc<Mutex<()>>]>,
}

impl KeyedLocks {
    #[must_use]
    pub fn new(stripes: usize) -> Self {
        let stripes = (0..stripes.max(1))
            .map(|_| Arc::new(Mutex::new(())))
            .collect::<Vec<_>>();

        Self {
            stripes: stripes.into(),
        }
    }

    fn stripe_for(&self, key: &EntryKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let len = self.stripes.len() as u64;
        usize::try_from(hasher.finish() % len).unwrap_or(0)
    }

    /// Waits for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: &EntryKey) -> OwnedMutexGuard<()> {
        let stripe = Arc::clone(&self.stripes[self.stripe_for(key)]);
        stripe.lock_owned().await
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new(crate::constants::locks::ENTRY_LOCK_STRIPES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MalId, MediaKind, UserId};
    use std::time::Duration;

    fn key(mal_id: i32) -> EntryKey {
        EntryKey::new(UserId(1), MediaKind::Anime, MalId::new(mal_id))
    }

    #[test]
    fn same_key_same_stripe() {
        let locks = KeyedLocks::new(8);
        assert_eq!(locks.stripe_for(&key(42)), locks.stripe_for(&key(42)));
    }

    #[tokio::test]
    async fn second_locker_waits_for_the_first() {
        let locks = KeyedLocks::new(4);
        let guard = locks.lock(&key(7)).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(&key(7)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }
}
