//! Thread-safe cache facade.
//!
//! One exclusive lock serializes every operation for its full duration. The
//! inner structures are not independently thread-safe; the lock is the sole
//! source of safety here, and no internal reference ever escapes; callers
//! only receive owned copies.

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::addr::{format_ipv4, parse_ipv4, UNKNOWN_ADDR};
use crate::engine::CacheEngine;
use crate::error::CacheError;

/// Fixed-capacity domain-name-to-IPv4 cache, safe to share across threads.
///
/// ```
/// use dnscache::DnsCache;
///
/// let cache = DnsCache::new(3).unwrap();
/// cache.update("example.com", "93.184.216.34").unwrap();
/// assert_eq!(cache.resolve("example.com"), "93.184.216.34");
/// assert_eq!(cache.resolve("missing.example"), "");
/// ```
pub struct DnsCache {
    engine: Mutex<CacheEngine>,
}

impl DnsCache {
    /// Build a cache holding at most `capacity` entries, preallocated here.
    /// Capacities below [`DnsCache::min_viable_capacity`] fail.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Ok(Self {
            engine: Mutex::new(CacheEngine::new(capacity)?),
        })
    }

    /// Smallest accepted capacity.
    pub const fn min_viable_capacity() -> usize {
        CacheEngine::MIN_VIABLE_CAPACITY
    }

    /// Insert or refresh a mapping.
    ///
    /// Unparsable address text is stored as the unknown-address sentinel
    /// rather than failing the call. A fatal internal failure does
    /// propagate; see DESIGN.md for that decision.
    pub fn update(&self, fqdn: &str, ip: &str) -> Result<(), CacheError> {
        let raw = match parse_ipv4(ip) {
            Some(raw) => raw,
            None => {
                debug!(fqdn, ip, "unparsable address text, storing sentinel");
                UNKNOWN_ADDR
            }
        };
        trace!(fqdn, ip, "cache update");
        self.engine.lock().insert(fqdn, raw)
    }

    /// Resolve a domain to its cached textual address, or an empty string
    /// when the domain is not cached. Absence and internal failure are
    /// indistinguishable at this boundary; failures are logged.
    pub fn resolve(&self, fqdn: &str) -> String {
        match self.engine.lock().lookup(fqdn) {
            Ok(raw) => {
                trace!(fqdn, "cache hit");
                format_ipv4(raw)
            }
            Err(CacheError::NotFound) => {
                trace!(fqdn, "cache miss");
                String::new()
            }
            Err(err) => {
                warn!(fqdn, %err, "cache lookup failed");
                String::new()
            }
        }
    }

    /// Current occupied count, always `<= max_size()`.
    pub fn len(&self) -> usize {
        self.engine.lock().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.engine.lock().is_empty()
    }

    /// Configured capacity.
    pub fn max_size(&self) -> usize {
        self.engine.lock().max_size()
    }
}
