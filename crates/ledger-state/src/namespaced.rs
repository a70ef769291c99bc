//! Service-scoped state views: every key a service touches is prefixed with
//! its own namespace so two services can never collide or read each
//! other's private data. Namespacing is unconditional — there is no
//! privileged-prefix allowlist.

use ledger_api::state::{StateAccess, StateScanIter};
use ledger_types::error::StateError;

fn qualify(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    [prefix, key].concat()
}

/// A mutable, namespaced view over some other `StateAccess` (typically the
/// top of a `SavepointStack`), scoped to one service.
pub struct ServiceScopedAccess<'a> {
    inner: &'a mut dyn StateAccess,
    prefix: Vec<u8>,
}

impl<'a> ServiceScopedAccess<'a> {
    pub fn new(inner: &'a mut dyn StateAccess, service: &str) -> Self {
        let mut prefix = service.as_bytes().to_vec();
        prefix.push(0);
        Self { inner, prefix }
    }
}

impl<'a> StateAccess for ServiceScopedAccess<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        self.inner.get(&qualify(&self.prefix, key))
    }
    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.inner.insert(&qualify(&self.prefix, key), value)
    }
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.inner.delete(&qualify(&self.prefix, key))
    }
    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        self.inner.prefix_scan(&qualify(&self.prefix, prefix))
    }
}

/// A read-only, namespaced view; every mutation fails with
/// `StateError::Immutable`.
pub struct ReadOnlyServiceScopedAccess<'a> {
    inner: &'a dyn StateAccess,
    prefix: Vec<u8>,
}

impl<'a> ReadOnlyServiceScopedAccess<'a> {
    pub fn new(inner: &'a dyn StateAccess, service: &str) -> Self {
        let mut prefix = service.as_bytes().to_vec();
        prefix.push(0);
        Self { inner, prefix }
    }
}

impl<'a> StateAccess for ReadOnlyServiceScopedAccess<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        self.inner.get(&qualify(&self.prefix, key))
    }
    fn insert(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), StateError> {
        Err(StateError::Immutable)
    }
    fn delete(&mut self, _key: &[u8]) -> Result<(), StateError> {
        Err(StateError::Immutable)
    }
    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        self.inner.prefix_scan(&qualify(&self.prefix, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::InMemoryStateAccess;

    #[test]
    fn services_cannot_see_each_others_keys() {
        let mut root = InMemoryStateAccess::new();
        {
            let mut token = ServiceScopedAccess::new(&mut root, "token");
            token.insert(b"k", b"v").unwrap();
        }
        let crypto = ServiceScopedAccess::new(&mut root, "crypto");
        assert_eq!(crypto.get(b"k").unwrap(), None);
    }

    #[test]
    fn read_only_rejects_writes() {
        let root = InMemoryStateAccess::new();
        let mut view = ReadOnlyServiceScopedAccess::new(&root, "token");
        assert_eq!(view.insert(b"k", b"v"), Err(StateError::Immutable));
    }
}
