//! Recency ladder: an intrusive doubly linked list over arena slots.
//!
//! The list runs from `bottom` (least recently used) to `top` (most recently
//! used) and initially chains every slot of the arena in arena order. The
//! ladder tracks structure only; it does not distinguish a free bottom slot
//! from a stale occupied one. Whoever calls [`RecencyList::release_bottom`]
//! must detach any stale key from the lookup tree before reusing the slot.

use crate::arena::{NodeArena, SlotId};
use crate::error::CacheError;

/// Smallest capacity with meaningful positions: bottom, middle and top.
pub const MIN_VIABLE_CAPACITY: usize = 3;

/// How far a promotion moves a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Promote {
    /// Straight to the most-recently-used end.
    ToTop,
    /// Swap with the next-higher slot.
    OneUp,
}

/// Outcome of a successful [`RecencyList::promote`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Promotion {
    /// The slot moved.
    Moved,
    /// The slot already sat at the top; not an error.
    AtTop,
}

/// Doubly linked recency order over the arena.
#[derive(Debug, PartialEq)]
pub struct RecencyList {
    capacity: usize,
    bottom: Option<SlotId>,
    top: Option<SlotId>,
}

impl RecencyList {
    /// Chain every slot of a fresh arena bottom..top in arena order.
    pub(crate) fn new(arena: &mut NodeArena) -> Result<Self, CacheError> {
        let capacity = arena.capacity();
        if capacity < MIN_VIABLE_CAPACITY {
            return Err(CacheError::CapacityTooSmall(capacity));
        }
        // Slot indices are 32-bit; a wider capacity would truncate the chain.
        let cap = u32::try_from(capacity).map_err(|_| CacheError::CapacityTooLarge(capacity))?;
        for i in 0..cap {
            let slot = arena.slot_mut(SlotId(i));
            slot.prev = i.checked_sub(1).map(SlotId);
            slot.next = (i + 1 < cap).then(|| SlotId(i + 1));
        }
        Ok(Self {
            capacity,
            bottom: Some(SlotId(0)),
            top: Some(SlotId(cap - 1)),
        })
    }

    /// Configured capacity.
    pub fn max_size(&self) -> usize {
        self.capacity
    }

    /// Detach and return the least-recently-used slot.
    ///
    /// Blindly hands out whatever sits at the bottom, free or occupied.
    pub(crate) fn release_bottom(&mut self, arena: &mut NodeArena) -> Result<SlotId, CacheError> {
        let freed = self.bottom.ok_or(CacheError::LadderExhausted)?;
        let next = arena.slot(freed).next;
        self.bottom = next;
        match next {
            Some(n) => arena.slot_mut(n).prev = None,
            None => self.top = None,
        }
        let slot = arena.slot_mut(freed);
        slot.next = None;
        slot.prev = None;
        Ok(freed)
    }

    /// Move `slot` toward the top. O(1) for both modes.
    pub(crate) fn promote(
        &mut self,
        arena: &mut NodeArena,
        slot: SlotId,
        how: Promote,
    ) -> Result<Promotion, CacheError> {
        if !arena.contains(slot) {
            return Err(CacheError::InvalidSlot(slot));
        }
        match how {
            Promote::ToTop => self.promote_to_top(arena, slot),
            Promote::OneUp => self.promote_one_up(arena, slot),
        }
    }

    fn promote_to_top(
        &mut self,
        arena: &mut NodeArena,
        slot: SlotId,
    ) -> Result<Promotion, CacheError> {
        let top = self.top.ok_or(CacheError::LadderExhausted)?;
        if top == slot {
            return Ok(Promotion::AtTop);
        }
        // A freshly released slot arrives detached; a linked slot is
        // unlinked first. Unlinking cannot touch `top` since slot != top.
        if self.is_linked(arena, slot) {
            self.unlink(arena, slot);
        }
        arena.slot_mut(top).next = Some(slot);
        let s = arena.slot_mut(slot);
        s.prev = Some(top);
        s.next = None;
        self.top = Some(slot);
        Ok(Promotion::Moved)
    }

    fn promote_one_up(
        &mut self,
        arena: &mut NodeArena,
        slot: SlotId,
    ) -> Result<Promotion, CacheError> {
        let Some(above) = arena.slot(slot).next else {
            // No successor: already the top. Repair the top pointer if it
            // drifted before reporting the no-op.
            if self.top != Some(slot) {
                self.top = Some(slot);
            }
            return Ok(Promotion::AtTop);
        };

        let below = arena.slot(slot).prev;
        let after = arena.slot(above).next;

        // below <-> above
        arena.slot_mut(above).prev = below;
        match below {
            Some(b) => arena.slot_mut(b).next = Some(above),
            None => self.bottom = Some(above),
        }
        // above <-> slot
        arena.slot_mut(above).next = Some(slot);
        arena.slot_mut(slot).prev = Some(above);
        // slot <-> after
        arena.slot_mut(slot).next = after;
        match after {
            Some(a) => arena.slot_mut(a).prev = Some(slot),
            None => self.top = Some(slot),
        }
        Ok(Promotion::Moved)
    }

    fn is_linked(&self, arena: &NodeArena, slot: SlotId) -> bool {
        let s = arena.slot(slot);
        s.prev.is_some() || s.next.is_some() || self.bottom == Some(slot)
    }

    fn unlink(&mut self, arena: &mut NodeArena, slot: SlotId) {
        let (prev, next) = {
            let s = arena.slot(slot);
            (s.prev, s.next)
        };
        match prev {
            Some(p) => arena.slot_mut(p).next = next,
            None => self.bottom = next,
        }
        match next {
            Some(n) => arena.slot_mut(n).prev = prev,
            None => self.top = prev,
        }
        let s = arena.slot_mut(slot);
        s.prev = None;
        s.next = None;
    }

    /// Walk bottom -> top, asserting that forward and backward links mirror
    /// each other, and return the chain.
    #[cfg(test)]
    pub(crate) fn chain(&self, arena: &NodeArena) -> Vec<SlotId> {
        let mut out = Vec::new();
        let mut prev = None;
        let mut cur = self.bottom;
        while let Some(n) = cur {
            assert_eq!(arena.slot(n).prev, prev, "broken backward link at {n:?}");
            out.push(n);
            assert!(out.len() <= arena.capacity(), "cycle in recency chain");
            prev = cur;
            cur = arena.slot(n).next;
        }
        assert_eq!(self.top, prev, "top pointer does not end the chain");
        out
    }
}
