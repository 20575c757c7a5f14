use rustc_hash::{FxHashMap, FxHashSet};

use crate::value::Value;

/// Composite identity pairs currently on the equality recursion stack.
///
/// A pair is recorded on the way into a composite comparison and removed on
/// the way out, so re-entering a pair that is still being compared signals a
/// cycle, while a pair that finished comparing (a sibling alias) is compared
/// again normally.
#[derive(Default)]
pub(crate) struct ActivePairs {
    active: FxHashSet<(usize, usize)>,
}

impl ActivePairs {
    /// Marks the pair as being compared. Returns false when the pair is
    /// already active, i.e. the traversal has come back around to it.
    pub(crate) fn begin(&mut self, left: usize, right: usize) -> bool {
        self.active.insert((left, right))
    }

    pub(crate) fn finish(&mut self, left: usize, right: usize) {
        self.active.remove(&(left, right));
    }
}

/// Source identity to finished-or-in-progress copy, scoped to one clone call.
///
/// An entry is registered before the copy's children are produced; a
/// self-reference therefore resolves to the registered copy instead of
/// recursing again, and two paths to one source composite resolve to one
/// output composite.
#[derive(Default)]
pub(crate) struct CloneRegistry {
    produced: FxHashMap<usize, Value>,
}

impl CloneRegistry {
    pub(crate) fn get(&self, identity: usize) -> Option<Value> {
        self.produced.get(&identity).cloned()
    }

    pub(crate) fn register(&mut self, identity: usize, value: Value) {
        self.produced.insert(identity, value);
    }
}
