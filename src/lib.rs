/// BE Checker - player ban status lookups
///
/// Resolves a player identifier (numeric ID or handle) to a numeric ID,
/// memoizes the mapping in a durable cache, and asks the anti-cheat ban
/// server for the player's ban status over UDP.

pub mod ban_query;
pub mod checker;
pub mod codec;
pub mod config;
pub mod error;
pub mod identity;
pub mod metrics;

pub use ban_query::{BanQuery, BanStatus, UdpBanClient};
pub use checker::{initialize_cache, BanChecker, CheckOutcome};
pub use codec::Rid;
pub use config::CheckerConfig;
pub use error::{CheckError, CheckResult};
pub use identity::{CacheStats, HttpNameResolver, IdCache, NameResolver};
