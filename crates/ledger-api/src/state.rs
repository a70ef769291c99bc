//! The state-access boundary the core is built on top of: a dyn-safe,
//! byte-oriented key/value interface so the savepoint stack can overlay
//! frame over frame without knowing the concrete storage backend
//! underneath.

use ledger_types::error::StateError;

/// A boxed, lending iterator over a prefix scan's `(key, value)` pairs.
pub type StateScanIter<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Byte-oriented read/write access to one service's keyspace.
///
/// Every savepoint frame and every store factory view implements this trait;
/// it is the one seam through which the core ever touches bytes. Higher
/// layers (`ledger-state`'s typed `KVState`/`Singleton`/`Queue` wrappers)
/// encode/decode on top of it.
pub trait StateAccess: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;
    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError>;
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError>;

    fn batch_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, StateError> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    fn batch_set(&mut self, updates: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StateError> {
        for (k, v) in updates {
            self.insert(k, v)?;
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError>;
}

impl<T: StateAccess + ?Sized> StateAccess for Box<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        (**self).get(key)
    }
    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        (**self).insert(key, value)
    }
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        (**self).delete(key)
    }
    fn batch_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, StateError> {
        (**self).batch_get(keys)
    }
    fn batch_set(&mut self, updates: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StateError> {
        (**self).batch_set(updates)
    }
    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        (**self).prefix_scan(prefix)
    }
}

/// The platform capability that produces readable/writable views over a
/// service's state and commits or copies the working container. Implemented
/// by whatever embeds the core; the core only calls through this trait.
pub trait StatePersistence: Send + Sync {
    /// A fast-copy, immutable view scoped to `service`, safe to hand to
    /// concurrent query readers.
    fn create_readable_states(&self, service: &str) -> Box<dyn StateAccess>;

    /// The single mutable view scoped to `service`, exclusively owned by the
    /// round executor for the duration of a round.
    fn create_writable_states(&self, service: &str) -> Box<dyn StateAccess>;

    /// Atomically clones the working container to an immutable sibling,
    /// publishing it for readers without blocking the next round.
    fn copy(&self);
}
