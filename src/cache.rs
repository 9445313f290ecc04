//! Short-lived, in-process cache for manager reads.
//!
//! Entries are keyed by operation plus id and carry tags; a write drops every
//! entry sharing one of its tags instead of pattern-matching key strings.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// How long a cached read stays valid
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Invalidation group an entry belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Candidaturas,
    Models,
    Model(String),
    Services,
    Bookings,
    Messages,
    Reviews,
    User(String),
}

/// Operation name, its arguments and the tags a write can clear it by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: &'static str,
    args: Vec<String>,
    tags: Vec<Tag>,
}

impl CacheKey {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            args: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}

struct Entry {
    value: Value,
    stored_at: Instant,
}

/// TTL cache of JSON values
pub struct Cache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Cache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A live entry for `key`; an entry is live up to and including its TTL.
    /// Expired entries are dropped on the way.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` as of now; a later insert for the same key wins
    pub fn insert(&self, key: CacheKey, value: Value) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry tagged with `tag`, returning how many went
    pub fn invalidate(&self, tag: &Tag) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.has_tag(tag));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(?tag, removed, "cache invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model_key(id: &str) -> CacheKey {
        CacheKey::new("get_model_by_id")
            .arg(id)
            .tag(Tag::Models)
            .tag(Tag::Model(id.to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = Cache::default();
        cache.insert(model_key("1"), json!({"id": "1"}));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&model_key("1")), Some(json!({"id": "1"})));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&model_key("1")), Some(json!({"id": "1"})));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get(&model_key("1")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_only_touches_matching_tag() {
        let cache = Cache::default();
        cache.insert(model_key("1"), json!(1));
        cache.insert(model_key("2"), json!(2));
        cache.insert(CacheKey::new("get_services").tag(Tag::Services), json!([]));

        assert_eq!(cache.invalidate(&Tag::Model("1".into())), 1);
        assert_eq!(cache.get(&model_key("1")), None);
        assert_eq!(cache.get(&model_key("2")), Some(json!(2)));

        assert_eq!(cache.invalidate(&Tag::Models), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_with_different_args_are_distinct() {
        let cache = Cache::default();
        cache.insert(model_key("1"), json!("one"));
        assert_eq!(cache.get(&model_key("10")), None);
    }
}
