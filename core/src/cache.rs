//! Query cache keyed by `(entity kind, list | item id)`.
//!
//! # Design
//! The cache is sans-IO like the rest of the core: `lookup` tells the caller
//! whether to use cached data, wait for a fetch already in flight, or fetch
//! now (and marks the key in flight); `resolve` records the outcome.
//! Failures clear the in-flight mark but never touch cached data.
//!
//! Invalidation marks entries stale rather than dropping them, so a page can
//! keep showing the previous data while the refetch runs. A stale entry is
//! never returned as fresh by `lookup`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::error::ApiError;
use crate::resource::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    List,
    Item(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: EntityKind,
    pub scope: Scope,
}

impl QueryKey {
    pub fn list(kind: EntityKind) -> Self {
        Self {
            kind,
            scope: Scope::List,
        }
    }

    pub fn item(kind: EntityKind, id: &str) -> Self {
        Self {
            kind,
            scope: Scope::Item(id.to_string()),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::List => write!(f, "[{}]", self.kind),
            Scope::Item(id) => write!(f, "[{}, {id}]", self.kind),
        }
    }
}

/// What the caller should do for a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Cached and not invalidated.
    Fresh(T),
    /// Another read for this key is outstanding; do not issue a second one.
    Pending,
    /// Nothing usable cached; the key is now marked in flight.
    Fetch,
}

#[derive(Default)]
struct Entry {
    data: Option<Box<dyn Any>>,
    stale: bool,
    in_flight: bool,
}

#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Entry>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup<T: Clone + 'static>(&mut self, key: &QueryKey) -> Lookup<T> {
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.in_flight {
            return Lookup::Pending;
        }
        if !entry.stale {
            if let Some(value) = entry.data.as_ref().and_then(|d| d.downcast_ref::<T>()) {
                return Lookup::Fresh(value.clone());
            }
        }
        entry.in_flight = true;
        Lookup::Fetch
    }

    /// Record the outcome of a fetch started by `lookup`.
    pub fn resolve<T: Clone + 'static>(&mut self, key: &QueryKey, result: &Result<T, ApiError>) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = false;
        match result {
            Ok(value) => {
                entry.data = Some(Box::new(value.clone()));
                entry.stale = false;
            }
            Err(e) => tracing::debug!(%key, code = e.error_code(), "fetch failed, cache kept"),
        }
    }

    /// Seed `key` with a known-fresh value.
    pub fn set<T: 'static>(&mut self, key: &QueryKey, value: T) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.data = Some(Box::new(value));
        entry.stale = false;
    }

    /// Cached value regardless of staleness.
    pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .get(key)?
            .data
            .as_ref()?
            .downcast_ref::<T>()
            .cloned()
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map_or(true, |e| e.stale || e.data.is_none())
    }

    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.in_flight)
    }

    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stale = true;
        }
    }

    /// Invalidate the list and every item of `kind`.
    pub fn invalidate_kind(&mut self, kind: EntityKind) {
        let mut count = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.kind == kind {
                entry.stale = true;
                count += 1;
            }
        }
        tracing::debug!(%kind, count, "invalidated");
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn films() -> QueryKey {
        QueryKey::list(EntityKind::Films)
    }

    #[test]
    fn first_read_fetches_then_hits() {
        let mut cache = QueryCache::new();
        assert_eq!(cache.lookup::<Vec<u32>>(&films()), Lookup::Fetch);
        cache.resolve(&films(), &Ok(vec![1u32, 2]));
        assert_eq!(cache.lookup::<Vec<u32>>(&films()), Lookup::Fresh(vec![1, 2]));
    }

    #[test]
    fn concurrent_reads_are_deduplicated() {
        let mut cache = QueryCache::new();
        assert_eq!(cache.lookup::<Vec<u32>>(&films()), Lookup::Fetch);
        assert_eq!(cache.lookup::<Vec<u32>>(&films()), Lookup::Pending);
        assert!(cache.is_in_flight(&films()));
        cache.resolve(&films(), &Ok(vec![1u32]));
        assert!(!cache.is_in_flight(&films()));
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut cache = QueryCache::new();
        cache.set(&films(), vec![7u32]);
        cache.invalidate(&films());
        assert_eq!(cache.lookup::<Vec<u32>>(&films()), Lookup::Fetch);

        let failed: Result<Vec<u32>, ApiError> = Err(ApiError::Network("down".to_string()));
        cache.resolve(&films(), &failed);
        assert_eq!(cache.peek::<Vec<u32>>(&films()), Some(vec![7]));
        assert!(cache.is_stale(&films()));
        assert!(!cache.is_in_flight(&films()));
    }

    #[test]
    fn invalidate_kind_is_a_prefix_match() {
        let mut cache = QueryCache::new();
        let item = QueryKey::item(EntityKind::Films, "f1");
        let actors = QueryKey::list(EntityKind::Actors);
        cache.set(&films(), vec![1u32]);
        cache.set(&item, 1u32);
        cache.set(&actors, vec![2u32]);

        cache.invalidate_kind(EntityKind::Films);
        assert!(cache.is_stale(&films()));
        assert!(cache.is_stale(&item));
        assert!(!cache.is_stale(&actors));
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let mut cache = QueryCache::new();
        cache.set(&films(), vec![1u32]);
        assert_eq!(cache.peek::<String>(&films()), None);
        assert_eq!(cache.lookup::<String>(&films()), Lookup::Fetch);
    }

    #[test]
    fn key_display() {
        assert_eq!(QueryKey::item(EntityKind::Actors, "a1").to_string(), "[actors, a1]");
    }
}
