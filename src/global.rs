//! Process-wide construct-once handle.
//!
//! Explicit dependency injection for callers that want one shared cache:
//! [`init`] once at startup, [`instance`] everywhere else. There is no
//! implicit construction; before `init` the accessor simply answers `None`.

use once_cell::sync::OnceCell;

use crate::cache::DnsCache;
use crate::error::CacheError;

static INSTANCE: OnceCell<DnsCache> = OnceCell::new();

/// Construct the shared cache.
///
/// The first successful call wins; later calls fail with
/// [`CacheError::AlreadyInitialized`]. A failed construction (for example a
/// too-small capacity) leaves the handle uninitialized, so `init` may be
/// retried.
pub fn init(capacity: usize) -> Result<&'static DnsCache, CacheError> {
    let mut fresh = false;
    let cache = INSTANCE.get_or_try_init(|| {
        fresh = true;
        DnsCache::new(capacity)
    })?;
    if fresh {
        Ok(cache)
    } else {
        Err(CacheError::AlreadyInitialized)
    }
}

/// The shared cache, if [`init`] has succeeded.
pub fn instance() -> Option<&'static DnsCache> {
    INSTANCE.get()
}
