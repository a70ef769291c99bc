//! The root container backing a savepoint stack: either the persisted,
//! committed state or a read-only fast-copy of it.

use ledger_api::state::{StateAccess, StateScanIter};
use ledger_types::error::StateError;
use std::collections::BTreeMap;

/// An in-memory, sorted key/value store implementing `StateAccess`. Stands
/// in for whatever persistence backend `ledger_api::state::StatePersistence`
/// hands the round executor; genesis bootstraps one directly, later rounds
/// get one produced by the host platform.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStateAccess {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryStateAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateAccess for InMemoryStateAccess {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.entries.remove(key);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        let prefix = prefix.to_vec();
        Ok(Box::new(
            self.entries
                .range(prefix.clone()..)
                .take_while(move |(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.clone(), v.clone())),
        ))
    }
}

/// Wraps any `StateAccess` to reject mutation, modelling a view fetched as
/// read-only.
pub struct ReadOnlyView<'a> {
    inner: &'a dyn StateAccess,
}

impl<'a> ReadOnlyView<'a> {
    pub fn new(inner: &'a dyn StateAccess) -> Self {
        Self { inner }
    }
}

impl<'a> StateAccess for ReadOnlyView<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        self.inner.get(key)
    }

    fn insert(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), StateError> {
        Err(StateError::Immutable)
    }

    fn delete(&mut self, _key: &[u8]) -> Result<(), StateError> {
        Err(StateError::Immutable)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        self.inner.prefix_scan(prefix)
    }
}
