//! Store factories: produce typed stores scoped to one service from
//! whatever `StateAccess` view the caller hands in (normally the top of a
//! `SavepointStack`). Split between a mutable and a read-only factory so a
//! read-only view can be handed out without risking a write.

use crate::container::{KVState, Queue, Singleton};
use crate::namespaced::{ReadOnlyServiceScopedAccess, ServiceScopedAccess};
use ledger_api::state::StateAccess;
use ledger_types::codec::from_bytes_canonical;
use ledger_types::error::StateError;
use parity_scale_codec::{Decode, Encode};

/// Read/write typed stores for one service, borrowed from the top of the
/// stack for the duration of a handler's dispatch.
pub struct WritableStates<'a> {
    scoped: ServiceScopedAccess<'a>,
}

impl<'a> WritableStates<'a> {
    pub fn new(store: &'a mut dyn StateAccess, service: &str) -> Self {
        Self {
            scoped: ServiceScopedAccess::new(store, service),
        }
    }

    pub fn kv<K, V>(&mut self, state_key: &str) -> KVState<'_, K, V>
    where
        K: Encode + Decode + Ord,
        V: Encode + Decode,
    {
        KVState::new(&mut self.scoped, "", state_key)
    }

    pub fn singleton<V>(&mut self, state_key: &str) -> Singleton<'_, V>
    where
        V: Encode + Decode,
    {
        Singleton::new(&mut self.scoped, "", state_key)
    }

    pub fn queue<V>(&mut self, state_key: &str) -> Queue<'_, V>
    where
        V: Encode + Decode,
    {
        Queue::new(&mut self.scoped, "", state_key)
    }
}

/// Read-only typed access to one service's state. Several of these may be
/// served concurrently since none of them can mutate the underlying store.
pub struct ReadableStates<'a> {
    scoped: ReadOnlyServiceScopedAccess<'a>,
}

impl<'a> ReadableStates<'a> {
    pub fn new(store: &'a dyn StateAccess, service: &str) -> Self {
        Self {
            scoped: ReadOnlyServiceScopedAccess::new(store, service),
        }
    }

    fn node_prefix(state_key: &str) -> Vec<u8> {
        crate::container::node_prefix("", state_key)
    }

    pub fn get<K, V>(&self, state_key: &str, key: &K) -> Result<Option<V>, StateError>
    where
        K: Encode,
        V: Decode,
    {
        let mut entry_key = Self::node_prefix(state_key);
        entry_key.extend_from_slice(&ledger_types::codec::to_bytes_canonical(key));
        match self.scoped.get(&entry_key)? {
            Some(bytes) => Ok(Some(
                from_bytes_canonical(&bytes).expect("state entries are never hand-edited"),
            )),
            None => Ok(None),
        }
    }

    pub fn get_singleton<V>(&self, state_key: &str) -> Result<Option<V>, StateError>
    where
        V: Decode,
    {
        match self.scoped.get(&Self::node_prefix(state_key))? {
            Some(bytes) => Ok(Some(
                from_bytes_canonical(&bytes).expect("state entries are never hand-edited"),
            )),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::InMemoryStateAccess;

    #[test]
    fn writable_then_readable_sees_same_value() {
        let mut root = InMemoryStateAccess::new();
        {
            let mut writable = WritableStates::new(&mut root, "crypto");
            writable.kv::<u64, i64>("ACCOUNTS").put(7, 500).unwrap();
        }
        let readable = ReadableStates::new(&root, "crypto");
        assert_eq!(readable.get::<u64, i64>("ACCOUNTS", &7).unwrap(), Some(500));
    }
}
