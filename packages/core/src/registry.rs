//! Dependency registry.
//!
//! A keyed store of shared values constructed once at startup and handed
//! to whoever needs it. There is no process-wide instance: the composition
//! root creates a [`Registry`] and passes it (or values resolved from it)
//! down explicitly.
//!
//! | Operation | Missing key | Wrong type |
//! |-----------|-------------|------------|
//! | `resolve` | warn, `None` | warn, `None` |
//! | `remove`  | no-op       | removed    |
//!
//! Values are stored by clone; register an `Arc<T>` to share one instance.

use std::any::{type_name, Any};
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, warn};

type Entry = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under its type's name, replacing any earlier value.
    pub fn register<T>(&self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.register_as(type_name::<T>(), value);
    }

    /// Register `value` under an explicit key.
    pub fn register_as<T>(&self, key: impl Into<String>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = key.into();
        let replaced = self.entries.write().insert(key.clone(), Box::new(value)).is_some();
        if replaced {
            debug!("registry: replaced {key}");
        } else {
            debug!("registry: registered {key}");
        }
    }

    /// Look up the value registered under `T`'s type name.
    pub fn resolve<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve_as(type_name::<T>())
    }

    /// Look up the value registered under `key`.
    ///
    /// A missing key or a value of another type logs a warning and yields
    /// `None`; neither is fatal.
    pub fn resolve_as<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read();
        let Some(entry) = entries.get(key) else {
            warn!("registry: nothing registered for {key}");
            return None;
        };
        match entry.downcast_ref::<T>() {
            Some(value) => Some(value.clone()),
            None => {
                warn!(
                    "registry: {key} is registered but is not a {}",
                    type_name::<T>()
                );
                None
            }
        }
    }

    /// Remove the value registered under `T`'s type name. Idempotent.
    pub fn remove<T: 'static>(&self) -> bool {
        self.remove_key(type_name::<T>())
    }

    pub fn remove_key(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            debug!("registry: removed {key}");
        }
        removed
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_key(type_name::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("keys", &self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Endpoint(String);

    #[test]
    fn register_then_resolve() {
        let registry = Registry::new();
        registry.register(Endpoint("https://api.example.com".into()));
        assert_eq!(
            registry.resolve::<Endpoint>(),
            Some(Endpoint("https://api.example.com".into()))
        );
    }

    #[test]
    fn later_registration_wins() {
        let registry = Registry::new();
        registry.register(1u32);
        registry.register(2u32);
        assert_eq!(registry.resolve::<u32>(), Some(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let registry = Registry::new();
        assert_eq!(registry.resolve::<u32>(), None);
        assert_eq!(registry.resolve_as::<u32>("nope"), None);
    }

    #[test]
    fn wrong_type_under_key_is_none() {
        let registry = Registry::new();
        registry.register_as("timeout", 30u64);
        assert_eq!(registry.resolve_as::<String>("timeout"), None);
        assert_eq!(registry.resolve_as::<u64>("timeout"), Some(30));
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = Registry::new();
        registry.register(Endpoint("a".into()));
        assert!(registry.remove::<Endpoint>());
        assert!(!registry.remove::<Endpoint>());
        assert!(!registry.contains::<Endpoint>());
        assert_eq!(registry.resolve::<Endpoint>(), None);
    }

    #[test]
    fn arc_values_share_one_instance() {
        let registry = Registry::new();
        let shared = Arc::new(Endpoint("one".into()));
        registry.register(Arc::clone(&shared));
        let resolved = registry.resolve::<Arc<Endpoint>>().expect("registered");
        assert!(Arc::ptr_eq(&shared, &resolved));
    }

    #[test]
    fn keys_are_sorted() {
        let registry = Registry::new();
        registry.register_as("b", 1u8);
        registry.register_as("a", 2u8);
        assert_eq!(registry.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn concurrent_access_keeps_last_write() {
        let registry = Arc::new(Registry::new());

        let workers: Vec<_> = (0..8u32)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for round in 0..200u32 {
                        registry.register(worker * 1000 + round);
                        registry.register_as(format!("scratch-{worker}"), round);
                        let _ = registry.resolve::<u32>();
                        let _ = registry.resolve_as::<u32>("scratch-0");
                        registry.remove_key(&format!("scratch-{worker}"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker panicked");
        }

        let last = registry.resolve::<u32>().expect("registered");
        assert_eq!(last % 1000, 199, "the final value is some worker's last write");
        assert_eq!(registry.keys(), vec![std::any::type_name::<u32>().to_string()]);

        registry.register(7u32);
        assert_eq!(registry.resolve::<u32>(), Some(7));
    }
}
