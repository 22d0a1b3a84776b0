//! Error taxonomy.
//!
//! Three families, kept deliberately distinct:
//!
//! 1. Construction-time configuration errors ([`CacheError::CapacityTooSmall`],
//!    [`CacheError::CapacityTooLarge`]) fail the constructor.
//! 2. Runtime failures (an exhausted ladder, an out-of-range slot, or a
//!    fatal hook outcome) indicate a broken invariant and surface to the
//!    caller of the mutating operation.
//! 3. [`CacheError::NotFound`] is the expected, non-fatal outcome of looking
//!    up a domain that is not cached; callers match on it explicitly.

use thiserror::Error;

use crate::arena::SlotId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Every failure the cache can report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// Requested capacity is below the minimum the recency ladder can
    /// meaningfully order (three: a bottom, a middle and a top).
    #[error("capacity {0} is below the minimum viable capacity")]
    CapacityTooSmall(usize),

    /// Requested capacity exceeds the 32-bit slot index space.
    #[error("capacity {0} exceeds the addressable slot range")]
    CapacityTooLarge(usize),

    /// The looked-up domain is not cached. Expected, non-fatal.
    #[error("domain not cached")]
    NotFound,

    /// The recency ladder had no slot to hand out. With a well-formed engine
    /// this cannot happen; seeing it means the ladder lost track of a slot.
    #[error("recency ladder has no reclaimable slot")]
    LadderExhausted,

    /// A slot index that does not belong to the arena was passed in.
    #[error("slot {0:?} is out of range for the arena")]
    InvalidSlot(SlotId),

    /// A create/update/read hook reported a fatal outcome, aborting the
    /// enclosing operation.
    #[error("fatal outcome from the {0}")]
    HookFatal(&'static str),

    /// The process-wide handle was initialized twice.
    #[error("shared cache already initialized")]
    AlreadyInitialized,
}
