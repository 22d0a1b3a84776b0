//! # dnscache
//!
//! A bounded-capacity cache mapping fully qualified domain names to IPv4
//! addresses, meant as a fast lookup layer in front of a resolver or proxy.
//! It is not a resolver itself: nothing here touches the network.
//!
//! ## Architecture
//!
//! Every entry lives in one preallocated slot arena ([`arena::NodeArena`]);
//! after construction no entry is ever allocated or freed. Two intrusive
//! structures index the same slots:
//!
//! 1. **Recency ladder** ([`ladder::RecencyList`]), a doubly linked list from
//!    least- to most-recently-used. The bottom slot is reclaimed whenever a
//!    new key needs storage.
//! 2. **Lookup index** ([`index::LookupIndex`]), a left-leaning red-black
//!    search tree keyed by domain name.
//!
//! [`engine::CacheEngine`] wires the two through the index's eviction hooks:
//! new entries jump to the top of the ladder, and every read or refresh
//! nudges an entry a single rung up. The one-rung promotion is a deliberate
//! approximation of LRU that keeps every touch O(1).
//!
//! [`DnsCache`] is the thread-safe surface: one exclusive lock around the
//! engine, textual addresses converted at the boundary ([`addr`]), misses
//! reported as empty strings. [`global`] offers an optional process-wide
//! construct-once handle.
//!
//! ## Example
//!
//! ```rust
//! use dnscache::DnsCache;
//!
//! let cache = DnsCache::new(3).unwrap();
//! cache.update("google.com", "1.2.3.4").unwrap();
//! assert_eq!(cache.resolve("google.com"), "1.2.3.4");
//! assert_eq!(cache.resolve("unknown.example"), "");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod addr;
pub mod arena;
pub mod cache;
pub mod engine;
pub mod error;
pub mod global;
pub mod index;
pub mod ladder;

#[cfg(test)]
mod proptests;

pub use cache::DnsCache;
pub use engine::CacheEngine;
pub use error::{CacheError, Result};

/// Fully qualified domain name, the cache key.
pub type Fqdn = String;

/// Raw 32-bit IPv4 address, the cache value.
pub type Ipv4Raw = u32;
