/// Ban Checker - resolves an identifier and queries its ban status
///
/// Resolution order:
/// 1. Check the identifier cache (fast path), evicting corrupt entries
/// 2. Use the identifier directly if it is all digits
/// 3. Otherwise resolve it through the name resolver
/// 4. Cache the mapping and query the ban server
use crate::{
    ban_query::{BanQuery, BanStatus, UdpBanClient},
    codec::Rid,
    config::CheckerConfig,
    error::{CheckError, CheckResult},
    identity::{CacheStats, HttpNameResolver, IdCache, NameResolver},
    metrics,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result shape handed to the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub ok: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Load the identifier cache from its snapshot
pub fn initialize_cache(snapshot_path: impl Into<PathBuf>) -> IdCache {
    IdCache::open(snapshot_path)
}

/// Main entry point - combines the cache, name resolver and ban query client
#[derive(Clone)]
pub struct BanChecker {
    cache: IdCache,
    resolver: Arc<dyn NameResolver>,
    ban_query: Arc<dyn BanQuery>,
}

impl BanChecker {
    pub fn new(
        cache: IdCache,
        resolver: Arc<dyn NameResolver>,
        ban_query: Arc<dyn BanQuery>,
    ) -> Self {
        Self {
            cache,
            resolver,
            ban_query,
        }
    }

    /// Build a checker with the HTTP resolver, UDP client and snapshot cache
    pub fn from_config(config: &CheckerConfig) -> CheckResult<Self> {
        config.validate()?;

        let cache = initialize_cache(config.cache.snapshot_path.clone());
        let resolver = Arc::new(HttpNameResolver::new(&config.resolver)?);
        let ban_query = Arc::new(UdpBanClient::new(&config.ban_server));

        Ok(Self::new(cache, resolver, ban_query))
    }

    pub fn cache(&self) -> &IdCache {
        &self.cache
    }

    /// Resolve `identifier` and report its ban status
    ///
    /// Never fails; every error is folded into a failed `CheckOutcome`.
    pub async fn resolve_and_check(&self, identifier: &str, use_cache: bool) -> CheckOutcome {
        match self.check(identifier, use_cache).await {
            Ok(message) => CheckOutcome::success(message),
            Err(e) => {
                debug!("Ban check for {} failed ({}): {}", identifier, e.kind(), e);
                CheckOutcome::failure(e.to_string())
            }
        }
    }

    async fn check(&self, identifier: &str, use_cache: bool) -> CheckResult<String> {
        if use_cache {
            if let Some(cached) = self.cache.get(identifier).await {
                match Rid::parse(&cached) {
                    Some(rid) => {
                        let status = self.ban_query.query(&rid).await?;
                        return Ok(describe(identifier, &cached, &status));
                    }
                    None => {
                        warn!("Evicting corrupt cache entry {} -> {:?}", identifier, cached);
                        self.cache.remove(identifier).await;
                        metrics::record_cache_repair();
                    }
                }
            }
        }

        let rid_text = if is_numeric_id(identifier) {
            identifier.to_string()
        } else {
            self.resolver.resolve(identifier).await?
        };

        if rid_text.is_empty() {
            return Err(CheckError::NotFound(identifier.to_string()));
        }

        if use_cache {
            self.cache.put(identifier, rid_text.clone()).await;
        }

        let rid = Rid::parse(&rid_text)
            .ok_or_else(|| CheckError::InvalidState(rid_text.clone()))?;

        let status = self.ban_query.query(&rid).await?;
        Ok(describe(identifier, &rid_text, &status))
    }

    /// Empty the identifier cache, returning how many entries were removed
    pub async fn clear_cache(&self) -> usize {
        self.cache.clear().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

/// True when the identifier is a non-empty run of ASCII digits
pub fn is_numeric_id(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

fn describe(identifier: &str, rid: &str, status: &BanStatus) -> String {
    match status {
        BanStatus::NotBanned => format!("{} (RID: {}) is not banned", identifier, rid),
        BanStatus::Banned { reason } => {
            format!("{} (RID: {}) is banned - reason: {}", identifier, rid, reason)
        }
    }
}
