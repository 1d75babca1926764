/// Identity Resolution System
///
/// Handles handle -> numeric ID resolution and the durable identifier cache
/// that sits in front of it.

pub mod cache;
pub mod resolver;

pub use cache::IdCache;
pub use resolver::HttpNameResolver;

use crate::error::CheckResult;
use async_trait::async_trait;
use serde::Serialize;

/// Maximum number of entries returned by a stats sample
pub const STATS_SAMPLE_SIZE: usize = 10;

/// Handle resolution backend
///
/// Implementations report every failure as `CheckError::NotFound`; a missing
/// handle and an unreachable lookup service look the same to the caller.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolve a handle to the raw ID text reported by the lookup service
    async fn resolve(&self, handle: &str) -> CheckResult<String>;
}

/// Read-only view of the identifier cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    /// Up to `STATS_SAMPLE_SIZE` entries in insertion order
    pub sample: Vec<(String, String)>,
}
