//! Bounded cache of remote task state
//!
//! Keeps recently tracked tasks keyed by id so lifecycle updates can check
//! terminal status without a network round trip. Eviction is FIFO over
//! insertion order: lookups and overwrites never promote an entry, and
//! pruning removes exactly one oldest entry per call. The bound is enforced
//! at session exit rather than on insert, so the cache may briefly exceed
//! capacity while executions overlap.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::types::Task;

/// Default capacity of the task cache
pub const DEFAULT_CACHE_SIZE: usize = 128;

struct CacheInner {
    entries: HashMap<String, Task>,
    // Invariant: holds exactly the keys of `entries`, oldest insertion first
    order: VecDeque<String>,
}

/// Insertion-ordered task cache with manual pruning
pub struct TaskCache {
    inner: Mutex<CacheInner>,
    max_size: usize,
}

impl TaskCache {
    /// Create a cache that prunes down toward `max_size` entries
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_size,
        }
    }

    /// Insert or overwrite a task, keyed by its id
    ///
    /// Overwriting keeps the entry's original position in the eviction
    /// order.
    pub fn set(&self, task: Task) {
        let key = task.id.clone();
        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), task).is_none() {
            inner.order.push_back(key);
        }
    }

    /// Look up a task by id without touching the eviction order
    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.inner.lock().entries.get(task_id).cloned()
    }

    /// Remove a task by id; absent ids are a no-op
    pub fn unset(&self, task_id: &str) {
        let mut inner = self.inner.lock();
        if inner.entries.remove(task_id).is_some() {
            inner.order.retain(|key| key != task_id);
        }
    }

    /// Evict the single oldest entry if the cache is over capacity
    pub fn prune(&self) {
        let mut inner = self.inner.lock();
        if inner.entries.len() > self.max_size {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    /// Number of cached tasks
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no tasks
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Configured capacity
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for TaskCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskStatus;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            organization: "org".to_string(),
            project: "project".to_string(),
            name: id.to_string(),
            status: TaskStatus::Pending,
            value: None,
            value_max: None,
            value_percent: None,
            data: None,
            created: None,
            updated: None,
        }
    }

    #[test]
    fn test_set_and_get() {
        let cache = TaskCache::new(4);
        cache.set(task("a"));
        assert_eq!(cache.get("a").map(|t| t.id), Some("a".to_string()));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unset_absent_is_noop() {
        let cache = TaskCache::new(4);
        cache.set(task("a"));
        cache.unset("missing");
        assert_eq!(cache.len(), 1);
        cache.unset("a");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_prune_under_capacity_is_noop() {
        let cache = TaskCache::new(2);
        cache.set(task("a"));
        cache.set(task("b"));
        cache.prune();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_prune_evicts_exactly_one() {
        let cache = TaskCache::new(1);
        cache.set(task("a"));
        cache.set(task("b"));
        cache.set(task("c"));
        assert_eq!(cache.len(), 3);

        cache.prune();
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());

        cache.prune();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());

        cache.prune();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_does_not_promote() {
        let cache = TaskCache::new(1);
        cache.set(task("a"));
        cache.set(task("b"));
        // Reading "a" must not save it from eviction
        assert!(cache.get("a").is_some());
        cache.prune();
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let cache = TaskCache::new(1);
        cache.set(task("a"));
        cache.set(task("b"));

        let mut updated = task("a");
        updated.status = TaskStatus::Processing;
        cache.set(updated);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").map(|t| t.status), Some(TaskStatus::Processing));

        // "a" is still the oldest entry despite the overwrite
        cache.prune();
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_zero_capacity() {
        let cache = TaskCache::new(0);
        cache.set(task("a"));
        assert_eq!(cache.len(), 1);
        cache.prune();
        assert!(cache.is_empty());
    }
}
