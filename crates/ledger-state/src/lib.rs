//! The typed state container, savepoint stack, and store factories. Its own
//! crate because every upstream layer (records, dispatch, round) depends on
//! it.

pub mod container;
pub mod factory;
pub mod namespaced;
pub mod root;
pub mod stack;

pub use container::{KVState, Queue, Singleton};
pub use factory::{ReadableStates, WritableStates};
pub use namespaced::{ReadOnlyServiceScopedAccess, ServiceScopedAccess};
pub use root::{InMemoryStateAccess, ReadOnlyView};
pub use stack::SavepointStack;
