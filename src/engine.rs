//! Cache engine: one arena, dual-indexed by the recency ladder and the
//! lookup index, wired together through the eviction hooks.
//!
//! The wiring realizes an approximate LRU:
//!
//! - allocation -> [`RecencyList::release_bottom`]: claim the bottom slot,
//!   free or least-recently-used;
//! - create -> promote `ToTop`: new entries start most-recently-used;
//! - update and read -> promote `OneUp`: each touch nudges an entry one rung
//!   toward the top.
//!
//! The one-rung promotion trades strict LRU precision for O(1) worst-case
//! work per touch; an entry has to be touched repeatedly to climb, and a
//! hot entry near the top is never relocated wholesale.

use crate::arena::{NodeArena, SlotId};
use crate::error::CacheError;
use crate::index::{EvictionHooks, HookOutcome, LookupIndex};
use crate::ladder::{Promote, RecencyList, MIN_VIABLE_CAPACITY};
use crate::Ipv4Raw;

/// Hook adapter borrowing the ladder for the duration of one operation.
struct LadderPolicy<'a> {
    ladder: &'a mut RecencyList,
}

impl EvictionHooks for LadderPolicy<'_> {
    fn allocate(&mut self, arena: &mut NodeArena) -> Result<SlotId, CacheError> {
        self.ladder.release_bottom(arena)
    }

    fn on_create(&mut self, arena: &mut NodeArena, slot: SlotId) -> HookOutcome {
        match self.ladder.promote(arena, slot, Promote::ToTop) {
            Ok(_) => HookOutcome::Success,
            Err(_) => HookOutcome::Fatal,
        }
    }

    fn on_update(&mut self, arena: &mut NodeArena, slot: SlotId) -> HookOutcome {
        match self.ladder.promote(arena, slot, Promote::OneUp) {
            Ok(_) => HookOutcome::Success,
            Err(_) => HookOutcome::Fatal,
        }
    }

    fn on_read(&mut self, arena: &mut NodeArena, slot: SlotId) -> HookOutcome {
        match self.ladder.promote(arena, slot, Promote::OneUp) {
            Ok(_) => HookOutcome::Success,
            Err(_) => HookOutcome::Fatal,
        }
    }
}

/// Single-threaded fixed-capacity cache core. [`crate::DnsCache`] wraps it
/// in a lock for concurrent use.
pub struct CacheEngine {
    arena: NodeArena,
    ladder: RecencyList,
    index: LookupIndex,
}

impl CacheEngine {
    /// Smallest capacity the ladder can meaningfully order.
    pub const MIN_VIABLE_CAPACITY: usize = MIN_VIABLE_CAPACITY;

    /// Build an engine with a fixed entry count, allocated once here.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity < MIN_VIABLE_CAPACITY {
            return Err(CacheError::CapacityTooSmall(capacity));
        }
        // Checked before the arena allocation so an oversize request fails
        // without reserving anything.
        if u32::try_from(capacity).is_err() {
            return Err(CacheError::CapacityTooLarge(capacity));
        }
        let mut arena = NodeArena::new(capacity);
        let ladder = RecencyList::new(&mut arena)?;
        Ok(Self {
            arena,
            ladder,
            index: LookupIndex::new(),
        })
    }

    /// Insert or refresh a mapping, evicting the least-recently-used entry
    /// if every slot is occupied.
    pub fn insert(&mut self, fqdn: &str, addr: Ipv4Raw) -> Result<(), CacheError> {
        let mut policy = LadderPolicy {
            ladder: &mut self.ladder,
        };
        self.index
            .insert_or_update(&mut self.arena, fqdn, addr, &mut policy)
    }

    /// Look up a domain, counting the access as a touch.
    pub fn lookup(&mut self, fqdn: &str) -> Result<Ipv4Raw, CacheError> {
        let mut policy = LadderPolicy {
            ladder: &mut self.ladder,
        };
        self.index.get(&mut self.arena, fqdn, &mut policy)
    }

    /// Current occupied count.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no entry is occupied.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Configured capacity.
    pub fn max_size(&self) -> usize {
        self.ladder.max_size()
    }

    /// Structural self-check used by the property tests.
    #[cfg(test)]
    pub(crate) fn validate(&self) {
        let chain = self.ladder.chain(&self.arena);
        assert_eq!(
            chain.len(),
            self.max_size(),
            "recency chain must cover every slot between operations"
        );
        let keys = self.index.in_order_keys(&self.arena);
        assert_eq!(keys.len(), self.len(), "tree size must match the counter");
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "tree order violated: {keys:?}"
        );
        assert!(self.len() <= self.max_size());
    }
}
