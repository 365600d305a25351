//! Proxy Cache
//!
//! Memoizes synthesis at two levels:
//!
//! - templates, keyed by (definition, generation mode, designation source)
//! - closed runtime types, keyed by (template, type arguments)
//!
//! Original definitions closed over type arguments are memoized alongside.
//! Each key owns a once-cell inside a concurrent map, so concurrent callers
//! for the same key observe exactly one initialization and share its result.
//! A failed initialization leaves the cell empty and the next caller retries.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::debug;
use weave_sdk::TypeRef;

use crate::marker::DesignationSource;
use crate::module::TemplateId;
use crate::synth::{GenerationMode, ProxyTemplate, RuntimeType};

/// Concurrent map whose values are initialized at most once per key
pub struct OnceMap<K, V> {
    map: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Initialized value for `key`
    pub fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Value for `key`, running `init` if no caller has initialized it yet.
    ///
    /// The map's shard lock is released before `init` runs; only callers
    /// racing on the same key wait for it.
    pub fn get_or_try_init<E, F>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let cell = Arc::clone(self.map.entry(key).or_default().value());
        cell.get_or_try_init(init).cloned()
    }

    /// Number of initialized entries
    pub fn len(&self) -> usize {
        self.map.iter().filter(|e| e.value().get().is_some()).count()
    }

    /// Whether no entry is initialized
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Key of a proxy template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    /// Name of the proxied definition
    pub definition: String,
    /// Generation mode
    pub mode: GenerationMode,
    /// Where designations come from
    pub source: DesignationSource,
}

/// Key of a closed runtime type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClosedKey {
    /// Template being closed
    pub template: TemplateId,
    /// Concrete type arguments (empty for non-generic definitions)
    pub args: Vec<TypeRef>,
}

/// Two-level cache of synthesized types
#[derive(Default)]
pub struct ProxyCache {
    templates: OnceMap<TemplateKey, Arc<ProxyTemplate>>,
    closed: OnceMap<ClosedKey, Arc<RuntimeType>>,
    originals: OnceMap<(String, Vec<TypeRef>), Arc<RuntimeType>>,
}

impl ProxyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Template for `key`, synthesizing it on first request
    pub fn template<E, F>(&self, key: TemplateKey, synthesize: F) -> Result<Arc<ProxyTemplate>, E>
    where
        F: FnOnce() -> Result<Arc<ProxyTemplate>, E>,
    {
        self.templates.get_or_try_init(key.clone(), || {
            debug!(definition = %key.definition, mode = %key.mode, "proxy template cache miss");
            synthesize()
        })
    }

    /// Closed type for `key`, closing the template on first request
    pub fn closed<E, F>(&self, key: ClosedKey, close: F) -> Result<Arc<RuntimeType>, E>
    where
        F: FnOnce() -> Result<Arc<RuntimeType>, E>,
    {
        self.closed.get_or_try_init(key, close)
    }

    /// Original definition `name` closed over `args`
    pub fn original<E, F>(&self, name: &str, args: &[TypeRef], close: F) -> Result<Arc<RuntimeType>, E>
    where
        F: FnOnce() -> Result<Arc<RuntimeType>, E>,
    {
        self.originals
            .get_or_try_init((name.to_string(), args.to_vec()), close)
    }

    /// Number of cached templates
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of cached closed proxy types
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_init_runs_once() {
        let map: OnceMap<u32, Arc<String>> = OnceMap::new();
        let calls = AtomicUsize::new(0);
        let init = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(Arc::new("v".to_string()))
        };
        let a = map.get_or_try_init(1, init).unwrap();
        let b = map.get_or_try_init(1, init).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_failure_not_cached() {
        let map: OnceMap<u32, u32> = OnceMap::new();
        assert_eq!(map.get_or_try_init(7, || Err("boom")), Err("boom"));
        assert!(map.get(&7).is_none());
        assert!(map.is_empty());
        assert_eq!(map.get_or_try_init(7, || Ok::<_, &str>(3)), Ok(3));
    }

    #[test]
    fn test_concurrent_single_winner() {
        let map: Arc<OnceMap<&'static str, Arc<u64>>> = Arc::new(OnceMap::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let map = Arc::clone(&map);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    map.get_or_try_init("key", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(10));
                        Ok::<_, ()>(Arc::new(i))
                    })
                    .unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<u64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
