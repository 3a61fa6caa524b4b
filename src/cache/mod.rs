//! TTL response cache for the home feed.

mod lock;
mod middleware;
mod store;

pub use middleware::{CacheState, response_cache_layer};
pub use store::{CacheKey, CachedResponse, ResponseCache};

use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(20);
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub(crate) fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY).expect("default is non-zero"))
    }
}
