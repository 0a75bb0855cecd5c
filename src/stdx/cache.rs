use parking_lot::RwLock;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// A single-slot store whose value is only trusted for `ttl` after it was inserted.
///
/// A `ttl` of zero disables the cache entirely: [`Cache::get`] always returns [`Store::Empty`].
#[derive(Debug, Clone)]
pub struct Cache<T> {
    slot: Arc<RwLock<Store<Entry<T>>>>,
    ttl: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Store<T> {
    #[default]
    Empty,
    Value(T),
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    computed_at: Instant,
}

impl<T> Cache<T> {
    #[inline]
    pub fn empty(ttl: Duration) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Store::Empty)),
            ttl,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    #[inline]
    pub fn insert(&self, item: T) {
        self.insert_at(item, Instant::now());
    }

    fn insert_at(&self, item: T, computed_at: Instant) {
        *self.slot.write() = Store::Value(Entry {
            value: item,
            computed_at,
        });
    }

    #[inline]
    pub fn clear(&self) {
        *self.slot.write() = Store::Empty;
    }

    #[inline]
    pub fn get(&self) -> Store<T>
    where
        T: Clone,
    {
        self.get_at(Instant::now())
    }

    fn get_at(&self, now: Instant) -> Store<T>
    where
        T: Clone,
    {
        if !self.is_enabled() {
            return Store::Empty;
        }

        match &*self.slot.read() {
            Store::Value(entry) if now.saturating_duration_since(entry.computed_at) < self.ttl => {
                Store::Value(entry.value.clone())
            }
            _ => Store::Empty,
        }
    }
}
