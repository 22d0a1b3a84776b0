//! Preallocated slot arena shared by the recency ladder and the lookup index.
//!
//! All entries are allocated once, up front, and reused for the lifetime of
//! the cache; nothing is individually freed. Links between slots are
//! `Option<SlotId>` indices rather than pointers, so an absent link is
//! explicit and out-of-range access is impossible without an invalid id.

/// Index of a slot in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One reusable cache entry, intrusively linked into both structures.
///
/// A slot is *free* while `key` is `None`: it is chained in the recency
/// ladder but absent from the lookup tree. Writing a key makes it
/// *occupied*: reachable from the tree root by key order and still chained
/// in the ladder at some position.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    /// Domain name; `None` marks the slot free.
    pub(crate) key: Option<String>,
    /// Raw IPv4 address.
    pub(crate) value: u32,

    // Lookup tree links.
    pub(crate) left: Option<SlotId>,
    pub(crate) right: Option<SlotId>,
    /// Left-leaning red-black balance flag.
    pub(crate) red: bool,

    // Recency ladder links.
    pub(crate) next: Option<SlotId>,
    pub(crate) prev: Option<SlotId>,
}

/// Contiguous block of `capacity` reusable slots.
pub struct NodeArena {
    slots: Box<[Slot]>,
}

impl NodeArena {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::default);
        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    /// Number of slots, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn contains(&self, id: SlotId) -> bool {
        id.index() < self.slots.len()
    }

    #[inline]
    pub(crate) fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, id: SlotId) -> &mut Slot {
        &mut self.slots[id.index()]
    }
}
