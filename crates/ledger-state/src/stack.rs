//! The savepoint stack: nested, rollback-capable write overlays over a root
//! state container. Each frame is a lazy key-indexed `BTreeMap` diff; a
//! prefix scan merges base and every overlay in order, with the top frame
//! winning ties and tombstones suppressing lower values.

use ledger_api::state::{StateAccess, StateScanIter};
use ledger_telemetry::sinks::savepoint_metrics;
use ledger_types::error::StateError;
use std::collections::BTreeMap;

/// A tombstone-aware write diff. `None` records a delete so it can shadow a
/// value present in a lower frame or the root.
type Frame = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// An ordered sequence of frames over a root state container. Frame 0 is
/// the permanent base frame; `create_savepoint` pushes, `commit`/`rollback`
/// pop anything above it.
pub struct SavepointStack<'a> {
    root: &'a dyn StateAccess,
    frames: Vec<Frame>,
    /// When set, every write to the base frame fails with
    /// `StateError::Immutable` regardless of what the root itself would
    /// allow — models a stack fetched as read-only.
    readonly: bool,
}

impl<'a> StateAccess for SavepointStack<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        SavepointStack::get(self, key)
    }
    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        SavepointStack::insert(self, key, value)
    }
    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        SavepointStack::delete(self, key)
    }
    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        SavepointStack::prefix_scan(self, prefix)
    }
}

impl<'a> SavepointStack<'a> {
    /// A mutable stack with one empty base frame.
    pub fn new(root: &'a dyn StateAccess) -> Self {
        Self {
            root,
            frames: vec![Frame::new()],
            readonly: false,
        }
    }

    /// A stack whose base frame rejects every write, for query-side access
    /// to committed state.
    pub fn new_readonly(root: &'a dyn StateAccess) -> Self {
        Self {
            root,
            frames: vec![Frame::new()],
            readonly: true,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// `true` once the top frame has recorded at least one write. Used by
    /// the handle context's preceding-dispatch precondition (see
    /// `RECORD_CACHE_CHECK`/payer-checks decision in DESIGN.md).
    pub fn is_modified(&self) -> bool {
        !self.frames.last().expect("base frame always present").is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        for frame in self.frames.iter().rev() {
            if let Some(entry) = frame.get(key) {
                return Ok(entry.clone());
            }
        }
        self.root.get(key)
    }

    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        if self.readonly && self.frames.len() == 1 {
            return Err(StateError::Immutable);
        }
        self.frames
            .last_mut()
            .expect("base frame always present")
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    pub fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        if self.readonly && self.frames.len() == 1 {
            return Err(StateError::Immutable);
        }
        self.frames
            .last_mut()
            .expect("base frame always present")
            .insert(key.to_vec(), None);
        Ok(())
    }

    /// Scans keys starting with `prefix` across every frame and the root,
    /// top frame winning ties, tombstones suppressing lower values.
    pub fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = BTreeMap::new();
        for (k, v) in self.root.prefix_scan(prefix)? {
            merged.insert(k, Some(v));
        }
        for frame in &self.frames {
            for (k, v) in frame {
                if k.starts_with(prefix) {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(Box::new(
            merged.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))),
        ))
    }

    /// Pushes a new empty overlay on top of the stack.
    pub fn create_savepoint(&mut self) {
        self.frames.push(Frame::new());
        savepoint_metrics().observe_stack_depth(self.depth());
    }

    /// Merges the top frame into the frame below, in sorted-key order
    /// (deterministic), then pops it.
    pub fn commit(&mut self) -> Result<(), StateError> {
        if self.frames.len() < 2 {
            return Err(StateError::EmptyStack);
        }
        let top = self.frames.pop().expect("checked len >= 2");
        let below = self.frames.last_mut().expect("checked len >= 2");
        for (key, value) in top {
            below.insert(key, value);
        }
        savepoint_metrics().inc_commits();
        savepoint_metrics().observe_stack_depth(self.depth());
        Ok(())
    }

    /// Discards the top frame entirely.
    pub fn rollback(&mut self) -> Result<(), StateError> {
        if self.frames.len() < 2 {
            return Err(StateError::EmptyStack);
        }
        self.frames.pop();
        savepoint_metrics().inc_rollbacks();
        savepoint_metrics().observe_stack_depth(self.depth());
        Ok(())
    }

    /// Repeatedly commits until only the base frame remains. Used after
    /// preceding dispatches so that their effects are visible to later work.
    pub fn commit_full_stack(&mut self) -> Result<(), StateError> {
        while self.frames.len() > 1 {
            self.commit()?;
        }
        Ok(())
    }

    /// The base frame's accumulated diff, in deterministic key order, ready
    /// to be flushed into the persisted root at round end.
    pub fn into_base_batch(self) -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
        self.frames
            .into_iter()
            .next()
            .expect("base frame always present")
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::InMemoryStateAccess;
    use proptest::prop_assert_eq;

    #[test]
    fn peek_never_empty_after_construction() {
        let root = InMemoryStateAccess::new();
        let stack = SavepointStack::new(&root);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn commit_with_depth_one_is_empty_stack() {
        let root = InMemoryStateAccess::new();
        let mut stack = SavepointStack::new(&root);
        assert_eq!(stack.commit(), Err(StateError::EmptyStack));
        assert_eq!(stack.rollback(), Err(StateError::EmptyStack));
    }

    #[test]
    fn readonly_base_rejects_writes() {
        let root = InMemoryStateAccess::new();
        let mut stack = SavepointStack::new_readonly(&root);
        assert_eq!(stack.insert(b"k", b"v"), Err(StateError::Immutable));
    }

    #[test]
    fn savepoint_roundtrip_law() {
        let mut root = InMemoryStateAccess::new();
        root.insert(b"k", b"v0").unwrap();
        let mut stack = SavepointStack::new(&root);
        stack.insert(b"k", b"v1").unwrap();
        let before = stack.get(b"k").unwrap();
        assert_eq!(before, Some(b"v1".to_vec()));

        stack.create_savepoint();
        stack.insert(b"k", b"v2").unwrap();
        stack.delete(b"other").unwrap();
        stack.rollback().unwrap();

        assert_eq!(stack.get(b"k").unwrap(), before);
    }

    #[test]
    fn commit_associativity_law() {
        let root = InMemoryStateAccess::new();
        let mut left = SavepointStack::new(&root);
        left.create_savepoint();
        left.insert(b"k", b"v").unwrap();
        left.commit().unwrap();

        let mut right = SavepointStack::new(&root);
        right.insert(b"k", b"v").unwrap();

        assert_eq!(left.get(b"k").unwrap(), right.get(b"k").unwrap());
        assert_eq!(left.depth(), right.depth());
    }

    #[test]
    fn commit_full_stack_collapses_to_base() {
        let root = InMemoryStateAccess::new();
        let mut stack = SavepointStack::new(&root);
        stack.create_savepoint();
        stack.create_savepoint();
        stack.create_savepoint();
        stack.insert(b"k", b"v").unwrap();

        stack.commit_full_stack().unwrap();

        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn rollback_hides_writes_from_dropped_frame() {
        let root = InMemoryStateAccess::new();
        let mut stack = SavepointStack::new(&root);
        stack.create_savepoint();
        stack.insert(b"k", b"v").unwrap();
        stack.rollback().unwrap();

        assert_eq!(stack.get(b"k").unwrap(), None);
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_write_then_rollback_is_invisible(value in proptest::collection::vec(0u8..255, 0..16)) {
            let root = InMemoryStateAccess::new();
            let mut stack = SavepointStack::new(&root);
            let before = stack.get(b"k").unwrap();

            stack.create_savepoint();
            stack.insert(b"k", &value).unwrap();
            stack.rollback().unwrap();

            prop_assert_eq!(stack.get(b"k").unwrap(), before);
        }
    }
}
