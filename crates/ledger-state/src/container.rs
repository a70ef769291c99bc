//! Typed state nodes: `KVState<K,V>`, `Singleton<V>`, and `Queue<V>`, each a
//! thin encode/decode layer over a service- and state-key-scoped slice of a
//! `StateAccess` implementation. Persistence class-IDs and Merkle
//! registration are the storage engine's concern; the core only sees these
//! three typed shapes. Generic over `StateAccess` (rather than the concrete
//! `SavepointStack`) so handlers in `ledger-services` can build these
//! wrappers from whatever scoped store a `HandleContext` hands them, without
//! depending on this crate's stack type.

use ledger_api::state::StateAccess;
use ledger_types::codec::{from_bytes_canonical, to_bytes_canonical};
use ledger_types::error::StateError;
use parity_scale_codec::{Decode, Encode};
use std::collections::BTreeSet;
use std::marker::PhantomData;

pub(crate) fn node_prefix(service: &str, state_key: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(service.len() + state_key.len() + 2);
    prefix.extend_from_slice(service.as_bytes());
    prefix.push(0);
    prefix.extend_from_slice(state_key.as_bytes());
    prefix.push(0);
    prefix
}

/// An unordered mapping from `K` to `V`, backed by one key per entry under
/// the node's prefix.
pub struct KVState<'a, K, V> {
    store: &'a mut dyn StateAccess,
    prefix: Vec<u8>,
    modified: BTreeSet<Vec<u8>>,
    _marker: PhantomData<(K, V)>,
}

impl<'a, K, V> KVState<'a, K, V>
where
    K: Encode + Decode + Ord,
    V: Encode + Decode,
{
    pub fn new(store: &'a mut dyn StateAccess, service: &str, state_key: &str) -> Self {
        Self {
            store,
            prefix: node_prefix(service, state_key),
            modified: BTreeSet::new(),
            _marker: PhantomData,
        }
    }

    fn entry_key(&self, key: &K) -> Vec<u8> {
        let mut entry = self.prefix.clone();
        entry.extend_from_slice(&to_bytes_canonical(key));
        entry
    }

    pub fn get(&self, key: &K) -> Result<Option<V>, StateError> {
        match self.store.get(&self.entry_key(key))? {
            Some(bytes) => Ok(Some(
                from_bytes_canonical(&bytes).expect("state entries are never hand-edited"),
            )),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &K) -> Result<bool, StateError> {
        Ok(self.get(key)?.is_some())
    }

    pub fn put(&mut self, key: K, value: V) -> Result<(), StateError> {
        let entry_key = self.entry_key(&key);
        self.store.insert(&entry_key, &to_bytes_canonical(&value))?;
        self.modified.insert(to_bytes_canonical(&key));
        Ok(())
    }

    pub fn remove(&mut self, key: &K) -> Result<(), StateError> {
        let entry_key = self.entry_key(key);
        self.store.delete(&entry_key)?;
        self.modified.insert(to_bytes_canonical(key));
        Ok(())
    }

    /// Every key currently visible under this node.
    pub fn keys(&self) -> Result<Vec<K>, StateError> {
        self.store
            .prefix_scan(&self.prefix)?
            .map(|(k, _)| {
                Ok(from_bytes_canonical(&k[self.prefix.len()..])
                    .expect("state entries are never hand-edited"))
            })
            .collect()
    }

    /// Keys written or removed through this handle since it was created.
    pub fn modified_keys(&self) -> Vec<K> {
        self.modified
            .iter()
            .map(|bytes| from_bytes_canonical(bytes).expect("recorded from a valid key"))
            .collect()
    }
}

/// A zero-or-one value.
pub struct Singleton<'a, V> {
    store: &'a mut dyn StateAccess,
    key: Vec<u8>,
    touched: bool,
    _marker: PhantomData<V>,
}

impl<'a, V> Singleton<'a, V>
where
    V: Encode + Decode,
{
    pub fn new(store: &'a mut dyn StateAccess, service: &str, state_key: &str) -> Self {
        Self {
            store,
            key: node_prefix(service, state_key),
            touched: false,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> Result<Option<V>, StateError> {
        match self.store.get(&self.key)? {
            Some(bytes) => Ok(Some(
                from_bytes_canonical(&bytes).expect("state entries are never hand-edited"),
            )),
            None => Ok(None),
        }
    }

    pub fn set(&mut self, value: V) -> Result<(), StateError> {
        self.store.insert(&self.key, &to_bytes_canonical(&value))?;
        self.touched = true;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.touched
    }
}

/// A FIFO sequence of `V`, stored as a bounds counter plus one entry key per
/// index.
pub struct Queue<'a, V> {
    store: &'a mut dyn StateAccess,
    prefix: Vec<u8>,
    _marker: PhantomData<V>,
}

impl<'a, V> Queue<'a, V>
where
    V: Encode + Decode,
{
    pub fn new(store: &'a mut dyn StateAccess, service: &str, state_key: &str) -> Self {
        Self {
            store,
            prefix: node_prefix(service, state_key),
            _marker: PhantomData,
        }
    }

    fn bounds_key(&self) -> Vec<u8> {
        let mut k = self.prefix.clone();
        k.extend_from_slice(b"__bounds");
        k
    }

    fn entry_key(&self, index: u64) -> Vec<u8> {
        let mut k = self.prefix.clone();
        k.extend_from_slice(&index.to_be_bytes());
        k
    }

    fn bounds(&self) -> Result<(u64, u64), StateError> {
        match self.store.get(&self.bounds_key())? {
            Some(bytes) => Ok(from_bytes_canonical(&bytes).expect("bounds are never hand-edited")),
            None => Ok((0, 0)),
        }
    }

    fn set_bounds(&mut self, bounds: (u64, u64)) -> Result<(), StateError> {
        let key = self.bounds_key();
        self.store.insert(&key, &to_bytes_canonical(&bounds))
    }

    pub fn add(&mut self, value: V) -> Result<(), StateError> {
        let (head, tail) = self.bounds()?;
        let entry_key = self.entry_key(tail);
        self.store.insert(&entry_key, &to_bytes_canonical(&value))?;
        self.set_bounds((head, tail + 1))
    }

    pub fn peek(&self) -> Result<Option<V>, StateError> {
        let (head, tail) = self.bounds()?;
        if head >= tail {
            return Ok(None);
        }
        match self.store.get(&self.entry_key(head))? {
            Some(bytes) => Ok(Some(
                from_bytes_canonical(&bytes).expect("state entries are never hand-edited"),
            )),
            None => Ok(None),
        }
    }

    pub fn poll(&mut self) -> Result<Option<V>, StateError> {
        let (head, tail) = self.bounds()?;
        if head >= tail {
            return Ok(None);
        }
        let entry_key = self.entry_key(head);
        let value = self.store.get(&entry_key)?.map(|bytes| {
            from_bytes_canonical(&bytes).expect("state entries are never hand-edited")
        });
        self.store.delete(&entry_key)?;
        self.set_bounds((head + 1, tail))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::InMemoryStateAccess;

    #[test]
    fn kv_state_round_trips_and_tracks_modified_keys() {
        let mut root = InMemoryStateAccess::new();
        let mut accounts: KVState<u64, i64> = KVState::new(&mut root, "token", "ACCOUNTS");

        assert_eq!(accounts.get(&1).unwrap(), None);
        accounts.put(1, 100).unwrap();
        accounts.put(2, 200).unwrap();
        assert_eq!(accounts.get(&1).unwrap(), Some(100));
        assert_eq!(accounts.modified_keys(), vec![1, 2]);
    }

    #[test]
    fn kv_state_is_namespaced_by_service_and_key() {
        let mut root = InMemoryStateAccess::new();
        {
            let mut a: KVState<u64, i64> = KVState::new(&mut root, "token", "ACCOUNTS");
            a.put(1, 100).unwrap();
        }
        let b: KVState<u64, i64> = KVState::new(&mut root, "crypto", "ACCOUNTS");
        assert_eq!(b.get(&1).unwrap(), None);
    }

    #[test]
    fn singleton_tracks_modification() {
        let mut root = InMemoryStateAccess::new();
        let mut network_ctx: Singleton<u64> = Singleton::new(&mut root, "platform", "NETWORK_CTX");
        assert!(!network_ctx.is_modified());
        assert_eq!(network_ctx.get().unwrap(), None);
        network_ctx.set(42).unwrap();
        assert!(network_ctx.is_modified());
        assert_eq!(network_ctx.get().unwrap(), Some(42));
    }

    #[test]
    fn queue_is_fifo() {
        let mut root = InMemoryStateAccess::new();
        let mut pending: Queue<String> = Queue::new(&mut root, "schedule", "PENDING");
        pending.add("a".to_string()).unwrap();
        pending.add("b".to_string()).unwrap();
        assert_eq!(pending.peek().unwrap(), Some("a".to_string()));
        assert_eq!(pending.poll().unwrap(), Some("a".to_string()));
        assert_eq!(pending.poll().unwrap(), Some("b".to_string()));
        assert_eq!(pending.poll().unwrap(), None);
    }
}
