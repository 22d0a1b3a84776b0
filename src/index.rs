//! Keyed lookup index: a binary search tree over arena slots with pluggable
//! storage-acquisition and access-notification hooks.
//!
//! The index never allocates. It asks its [`EvictionHooks`] policy for a
//! slot when a new key arrives and notifies it on create/update/read; the
//! policy answers with a tri-state [`HookOutcome`], and only
//! [`HookOutcome::Fatal`] aborts the enclosing operation.
//!
//! Insertions keep the tree balanced with left-leaning red-black fixups
//! (rotate left, rotate right, color flip), so lookups stay logarithmic even
//! under adversarial key order. Removal happens only on eviction and splices
//! nodes structurally: the in-order successor physically takes the removed
//! node's place instead of having its key copied over. That preserves slot
//! identity: the physical slot freed by `remove(key)` is exactly the slot
//! that held `key`, which the engine relies on when it repurposes the
//! ladder bottom. The splice does not recolor; colors are treated as hints
//! that later insertions fix up locally, and key order is preserved
//! unconditionally.

use std::cmp::Ordering;

use crate::arena::{NodeArena, SlotId};
use crate::error::CacheError;

/// Tri-state result of a create/update/read hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// All good.
    Success,
    /// Recoverable; the enclosing operation proceeds.
    Error,
    /// Unrecoverable; the enclosing operation aborts.
    Fatal,
}

/// Policy consulted by the index for slot acquisition and access events.
///
/// The cache engine implements this to realize its eviction/promotion
/// policy; tests substitute simpler policies.
pub trait EvictionHooks {
    /// Produce a slot for a new entry. The slot may still carry a stale key;
    /// the index detaches that key from the tree before reuse.
    fn allocate(&mut self, arena: &mut NodeArena) -> Result<SlotId, CacheError>;

    /// Called after key and value are written into a freshly allocated slot,
    /// before the slot is linked into the tree.
    fn on_create(&mut self, arena: &mut NodeArena, slot: SlotId) -> HookOutcome;

    /// Called when an existing key is about to be refreshed. A fatal outcome
    /// aborts before the stored value changes.
    fn on_update(&mut self, arena: &mut NodeArena, slot: SlotId) -> HookOutcome;

    /// Called on every successful lookup, before the value is returned.
    fn on_read(&mut self, arena: &mut NodeArena, slot: SlotId) -> HookOutcome;
}

/// Key-ordered search tree over occupied arena slots.
pub struct LookupIndex {
    root: Option<SlotId>,
    len: usize,
}

/// Key of an occupied tree slot. A free slot inside the tree is a broken
/// structural invariant.
fn node_key(arena: &NodeArena, slot: SlotId) -> &str {
    arena
        .slot(slot)
        .key
        .as_deref()
        .expect("lookup tree references a free slot")
}

impl LookupIndex {
    pub(crate) fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of occupied entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no entry is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find(&self, arena: &NodeArena, key: &str) -> Option<SlotId> {
        let mut cur = self.root;
        while let Some(n) = cur {
            cur = match key.cmp(node_key(arena, n)) {
                Ordering::Less => arena.slot(n).left,
                Ordering::Equal => return Some(n),
                Ordering::Greater => arena.slot(n).right,
            };
        }
        None
    }

    /// Look up `key`, notifying the read hook on a hit.
    ///
    /// A miss is [`CacheError::NotFound`], expected and non-fatal, distinct
    /// from a fatal hook outcome.
    pub(crate) fn get(
        &self,
        arena: &mut NodeArena,
        key: &str,
        hooks: &mut impl EvictionHooks,
    ) -> Result<u32, CacheError> {
        let slot = self.find(arena, key).ok_or(CacheError::NotFound)?;
        if let HookOutcome::Fatal = hooks.on_read(arena, slot) {
            return Err(CacheError::HookFatal("read hook"));
        }
        Ok(arena.slot(slot).value)
    }

    /// Insert a new mapping or refresh an existing one.
    pub(crate) fn insert_or_update(
        &mut self,
        arena: &mut NodeArena,
        key: &str,
        value: u32,
        hooks: &mut impl EvictionHooks,
    ) -> Result<(), CacheError> {
        if let Some(slot) = self.find(arena, key) {
            // Hook first: a fatal outcome must leave the stored value
            // untouched.
            if let HookOutcome::Fatal = hooks.on_update(arena, slot) {
                return Err(CacheError::HookFatal("update hook"));
            }
            arena.slot_mut(slot).value = value;
            return Ok(());
        }

        let slot = hooks.allocate(arena)?;
        if let Some(stale) = arena.slot(slot).key.clone() {
            // The slot is being reclaimed from a least-recently-used entry.
            // Detach its old key before the slot changes meaning; structural
            // removal guarantees the freed slot is this one.
            let freed = self.remove(arena, &stale);
            debug_assert_eq!(freed, Some(slot));
        }
        {
            let s = arena.slot_mut(slot);
            s.key = Some(key.to_owned());
            s.value = value;
            s.left = None;
            s.right = None;
            s.red = true;
        }
        if let HookOutcome::Fatal = hooks.on_create(arena, slot) {
            // The slot stays free and out of the tree.
            arena.slot_mut(slot).key = None;
            return Err(CacheError::HookFatal("create hook"));
        }
        let root = Self::insert_below(arena, self.root, slot);
        arena.slot_mut(root).red = false;
        self.root = Some(root);
        self.len += 1;
        Ok(())
    }

    /// Detach `key` from the tree. Returns the physical slot that held it,
    /// now free, or `None` if the key was absent.
    pub(crate) fn remove(&mut self, arena: &mut NodeArena, key: &str) -> Option<SlotId> {
        let (root, freed) = Self::remove_below(arena, self.root, key);
        self.root = root;
        if let Some(f) = freed {
            let s = arena.slot_mut(f);
            s.key = None;
            s.left = None;
            s.right = None;
            s.red = false;
            self.len -= 1;
        }
        if let Some(r) = self.root {
            arena.slot_mut(r).red = false;
        }
        freed
    }

    fn insert_below(arena: &mut NodeArena, at: Option<SlotId>, slot: SlotId) -> SlotId {
        let Some(n) = at else {
            return slot;
        };
        match node_key(arena, slot).cmp(node_key(arena, n)) {
            Ordering::Less => {
                let left = arena.slot(n).left;
                let child = Self::insert_below(arena, left, slot);
                arena.slot_mut(n).left = Some(child);
            }
            Ordering::Greater => {
                let right = arena.slot(n).right;
                let child = Self::insert_below(arena, right, slot);
                arena.slot_mut(n).right = Some(child);
            }
            Ordering::Equal => {
                // The caller resolved existence before descending here.
                debug_assert!(false, "insert_below reached an existing key");
            }
        }
        Self::fixup(arena, n)
    }

    fn remove_below(
        arena: &mut NodeArena,
        at: Option<SlotId>,
        key: &str,
    ) -> (Option<SlotId>, Option<SlotId>) {
        let Some(n) = at else {
            return (None, None);
        };
        match key.cmp(node_key(arena, n)) {
            Ordering::Less => {
                let left = arena.slot(n).left;
                let (child, freed) = Self::remove_below(arena, left, key);
                arena.slot_mut(n).left = child;
                (Some(n), freed)
            }
            Ordering::Greater => {
                let right = arena.slot(n).right;
                let (child, freed) = Self::remove_below(arena, right, key);
                arena.slot_mut(n).right = child;
                (Some(n), freed)
            }
            Ordering::Equal => {
                let (left, right) = {
                    let s = arena.slot(n);
                    (s.left, s.right)
                };
                match (left, right) {
                    (None, child) | (child, None) => (child, Some(n)),
                    (Some(left), Some(right)) => {
                        // Splice the in-order successor into this position so
                        // the freed physical slot is `n` itself.
                        let (rest, succ) = Self::detach_min(arena, right);
                        let n_red = arena.slot(n).red;
                        let s = arena.slot_mut(succ);
                        s.left = Some(left);
                        s.right = rest;
                        s.red = n_red;
                        (Some(succ), Some(n))
                    }
                }
            }
        }
    }

    /// Unlink the minimum of the subtree rooted at `n`; returns the
    /// remaining subtree and the detached minimum.
    fn detach_min(arena: &mut NodeArena, n: SlotId) -> (Option<SlotId>, SlotId) {
        match arena.slot(n).left {
            None => {
                let rest = arena.slot(n).right;
                arena.slot_mut(n).right = None;
                (rest, n)
            }
            Some(l) => {
                let (rest, min) = Self::detach_min(arena, l);
                arena.slot_mut(n).left = rest;
                (Some(n), min)
            }
        }
    }

    // Left-leaning red-black fixups, applied bottom-up after insertion.

    fn is_red(arena: &NodeArena, n: Option<SlotId>) -> bool {
        n.is_some_and(|n| arena.slot(n).red)
    }

    fn fixup(arena: &mut NodeArena, mut h: SlotId) -> SlotId {
        if Self::is_red(arena, arena.slot(h).right) && !Self::is_red(arena, arena.slot(h).left) {
            h = Self::rotate_left(arena, h);
        }
        let left = arena.slot(h).left;
        if Self::is_red(arena, left) && Self::is_red(arena, left.and_then(|l| arena.slot(l).left)) {
            h = Self::rotate_right(arena, h);
        }
        if Self::is_red(arena, arena.slot(h).left) && Self::is_red(arena, arena.slot(h).right) {
            Self::flip_colors(arena, h);
        }
        h
    }

    fn rotate_left(arena: &mut NodeArena, h: SlotId) -> SlotId {
        let x = arena
            .slot(h)
            .right
            .expect("rotate_left requires a right child");
        let moved = arena.slot(x).left;
        arena.slot_mut(h).right = moved;
        arena.slot_mut(x).left = Some(h);
        let h_red = arena.slot(h).red;
        arena.slot_mut(x).red = h_red;
        arena.slot_mut(h).red = true;
        x
    }

    fn rotate_right(arena: &mut NodeArena, h: SlotId) -> SlotId {
        let x = arena
            .slot(h)
            .left
            .expect("rotate_right requires a left child");
        let moved = arena.slot(x).right;
        arena.slot_mut(h).left = moved;
        arena.slot_mut(x).right = Some(h);
        let h_red = arena.slot(h).red;
        arena.slot_mut(x).red = h_red;
        arena.slot_mut(h).red = true;
        x
    }

    fn flip_colors(arena: &mut NodeArena, h: SlotId) {
        arena.slot_mut(h).red = true;
        if let Some(l) = arena.slot(h).left {
            arena.slot_mut(l).red = false;
        }
        if let Some(r) = arena.slot(h).right {
            arena.slot_mut(r).red = false;
        }
    }

    /// Keys in tree order, asserting nothing along the way.
    #[cfg(test)]
    pub(crate) fn in_order_keys(&self, arena: &NodeArena) -> Vec<String> {
        fn walk(arena: &NodeArena, at: Option<SlotId>, out: &mut Vec<String>) {
            if let Some(n) = at {
                walk(arena, arena.slot(n).left, out);
                out.push(node_key(arena, n).to_owned());
                walk(arena, arena.slot(n).right, out);
            }
        }
        let mut out = Vec::new();
        walk(arena, self.root, &mut out);
        out
    }

    /// Longest root-to-leaf path, counted in nodes.
    #[cfg(test)]
    pub(crate) fn depth(&self, arena: &NodeArena) -> usize {
        fn walk(arena: &NodeArena, at: Option<SlotId>) -> usize {
            match at {
                None => 0,
                Some(n) => {
                    1 + walk(arena, arena.slot(n).left).max(walk(arena, arena.slot(n).right))
                }
            }
        }
        walk(arena, self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out slots from a plain free list; all access hooks succeed.
    struct FreeListHooks {
        free: Vec<SlotId>,
    }

    impl FreeListHooks {
        fn new(capacity: u32) -> Self {
            Self {
                free: (0..capacity).rev().map(SlotId).collect(),
            }
        }
    }

    impl EvictionHooks for FreeListHooks {
        fn allocate(&mut self, _arena: &mut NodeArena) -> Result<SlotId, CacheError> {
            self.free.pop().ok_or(CacheError::LadderExhausted)
        }
        fn on_create(&mut self, _arena: &mut NodeArena, _slot: SlotId) -> HookOutcome {
            HookOutcome::Success
        }
        fn on_update(&mut self, _arena: &mut NodeArena, _slot: SlotId) -> HookOutcome {
            HookOutcome::Success
        }
        fn on_read(&mut self, _arena: &mut NodeArena, _slot: SlotId) -> HookOutcome {
            HookOutcome::Success
        }
    }

    /// Answers each access hook with a configurable outcome.
    struct FailingHooks {
        inner: FreeListHooks,
        create: HookOutcome,
        update: HookOutcome,
        read: HookOutcome,
    }

    impl FailingHooks {
        fn new(capacity: u32) -> Self {
            Self {
                inner: FreeListHooks::new(capacity),
                create: HookOutcome::Success,
                update: HookOutcome::Success,
                read: HookOutcome::Success,
            }
        }
    }

    impl EvictionHooks for FailingHooks {
        fn allocate(&mut self, arena: &mut NodeArena) -> Result<SlotId, CacheError> {
            self.inner.allocate(arena)
        }
        fn on_create(&mut self, _arena: &mut NodeArena, _slot: SlotId) -> HookOutcome {
            self.create
        }
        fn on_update(&mut self, _arena: &mut NodeArena, _slot: SlotId) -> HookOutcome {
            self.update
        }
        fn on_read(&mut self, _arena: &mut NodeArena, _slot: SlotId) -> HookOutcome {
            self.read
        }
    }

    fn setup(capacity: u32) -> (NodeArena, LookupIndex, FreeListHooks) {
        (
            NodeArena::new(capacity as usize),
            LookupIndex::new(),
            FreeListHooks::new(capacity),
        )
    }

    #[test]
    fn insert_then_get() {
        let (mut arena, mut index, mut hooks) = setup(8);
        index
            .insert_or_update(&mut arena, "b.example", 2, &mut hooks)
            .unwrap();
        index
            .insert_or_update(&mut arena, "a.example", 1, &mut hooks)
            .unwrap();
        index
            .insert_or_update(&mut arena, "c.example", 3, &mut hooks)
            .unwrap();

        assert_eq!(index.get(&mut arena, "a.example", &mut hooks), Ok(1));
        assert_eq!(index.get(&mut arena, "b.example", &mut hooks), Ok(2));
        assert_eq!(index.get(&mut arena, "c.example", &mut hooks), Ok(3));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn miss_is_not_found() {
        let (mut arena, index, mut hooks) = setup(4);
        assert_eq!(
            index.get(&mut arena, "nowhere.example", &mut hooks),
            Err(CacheError::NotFound)
        );
    }

    #[test]
    fn update_overwrites_in_place() {
        let (mut arena, mut index, mut hooks) = setup(4);
        index
            .insert_or_update(&mut arena, "x.example", 1, &mut hooks)
            .unwrap();
        index
            .insert_or_update(&mut arena, "x.example", 9, &mut hooks)
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&mut arena, "x.example", &mut hooks), Ok(9));
    }

    #[test]
    fn fatal_update_hook_leaves_value_untouched() {
        let mut arena = NodeArena::new(4);
        let mut index = LookupIndex::new();
        let mut hooks = FailingHooks::new(4);

        index
            .insert_or_update(&mut arena, "x.example", 1, &mut hooks)
            .unwrap();
        hooks.update = HookOutcome::Fatal;
        assert_eq!(
            index.insert_or_update(&mut arena, "x.example", 9, &mut hooks),
            Err(CacheError::HookFatal("update hook"))
        );
        hooks.update = HookOutcome::Success;
        assert_eq!(index.get(&mut arena, "x.example", &mut hooks), Ok(1));
    }

    #[test]
    fn fatal_create_hook_leaves_slot_free() {
        let mut arena = NodeArena::new(4);
        let mut index = LookupIndex::new();
        let mut hooks = FailingHooks::new(4);

        hooks.create = HookOutcome::Fatal;
        assert_eq!(
            index.insert_or_update(&mut arena, "x.example", 1, &mut hooks),
            Err(CacheError::HookFatal("create hook"))
        );
        assert_eq!(index.len(), 0);
        hooks.create = HookOutcome::Success;
        assert_eq!(
            index.get(&mut arena, "x.example", &mut hooks),
            Err(CacheError::NotFound)
        );
    }

    #[test]
    fn fatal_read_hook_aborts_lookup() {
        let mut arena = NodeArena::new(4);
        let mut index = LookupIndex::new();
        let mut hooks = FailingHooks::new(4);

        index
            .insert_or_update(&mut arena, "x.example", 1, &mut hooks)
            .unwrap();
        hooks.read = HookOutcome::Fatal;
        assert_eq!(
            index.get(&mut arena, "x.example", &mut hooks),
            Err(CacheError::HookFatal("read hook"))
        );
    }

    #[test]
    fn recoverable_hook_error_does_not_abort() {
        let mut arena = NodeArena::new(4);
        let mut index = LookupIndex::new();
        let mut hooks = FailingHooks::new(4);
        hooks.create = HookOutcome::Error;
        hooks.update = HookOutcome::Error;
        hooks.read = HookOutcome::Error;

        // Create proceeds and the entry lands in the tree.
        index
            .insert_or_update(&mut arena, "x.example", 1, &mut hooks)
            .unwrap();
        assert_eq!(index.len(), 1);

        // Read proceeds and returns the value.
        assert_eq!(index.get(&mut arena, "x.example", &mut hooks), Ok(1));

        // Update proceeds and the value is overwritten.
        index
            .insert_or_update(&mut arena, "x.example", 9, &mut hooks)
            .unwrap();
        assert_eq!(index.get(&mut arena, "x.example", &mut hooks), Ok(9));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn in_order_traversal_is_sorted() {
        let (mut arena, mut index, mut hooks) = setup(16);
        for key in ["m", "c", "x", "a", "t", "e", "q", "b"] {
            index.insert_or_update(&mut arena, key, 0, &mut hooks).unwrap();
        }
        let keys = index.in_order_keys(&arena);
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn remove_leaf_and_internal_nodes() {
        let (mut arena, mut index, mut hooks) = setup(16);
        for key in ["d", "b", "f", "a", "c", "e", "g"] {
            index.insert_or_update(&mut arena, key, 0, &mut hooks).unwrap();
        }
        // Leaf, one-child and two-children cases.
        for key in ["a", "f", "d"] {
            assert!(index.remove(&mut arena, key).is_some());
            let keys = index.in_order_keys(&arena);
            let mut sorted = keys.clone();
            sorted.sort();
            assert_eq!(keys, sorted);
            assert!(!keys.contains(&key.to_owned()));
        }
        assert_eq!(index.len(), 4);
        assert!(index.remove(&mut arena, "zz").is_none());
    }

    #[test]
    fn remove_frees_the_exact_slot_holding_the_key() {
        let (mut arena, mut index, mut hooks) = setup(8);
        for key in ["d", "b", "f"] {
            index.insert_or_update(&mut arena, key, 0, &mut hooks).unwrap();
        }
        let slot_of_d = index.find(&arena, "d").unwrap();
        assert_eq!(index.remove(&mut arena, "d"), Some(slot_of_d));
        assert!(arena.slot(slot_of_d).key.is_none());
    }

    #[test]
    fn sorted_insertion_stays_balanced() {
        let n: u32 = 1000;
        let (mut arena, mut index, mut hooks) = setup(n + 8);
        for i in 0..n {
            let key = format!("host{i:06}.example");
            index.insert_or_update(&mut arena, &key, i, &mut hooks).unwrap();
        }
        assert_eq!(index.len(), n as usize);
        // A red-black tree of 1000 keys is at most ~20 levels deep; a plain
        // BST fed sorted keys would be 1000.
        assert!(
            index.depth(&arena) <= 24,
            "depth {} suggests the fixups are not balancing",
            index.depth(&arena)
        );
    }
}
