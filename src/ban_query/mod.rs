/// Ban Query System
///
/// Talks to the anti-cheat ban server over its unauthenticated UDP protocol:
/// one request datagram carrying a random header and the ban token, one reply
/// datagram carrying the echoed header and an optional ban reason.

pub mod client;
pub mod decode;

pub use client::UdpBanClient;
pub use decode::decode_reason;

use crate::{codec::Rid, error::CheckResult};
use async_trait::async_trait;
use serde::Serialize;

/// Ban status reported by the ban server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BanStatus {
    NotBanned,
    Banned { reason: String },
}

impl BanStatus {
    /// Build a status from a decoded reply; an empty reason means not banned
    pub fn from_reason(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if reason.is_empty() {
            BanStatus::NotBanned
        } else {
            BanStatus::Banned { reason }
        }
    }

    pub fn is_banned(&self) -> bool {
        matches!(self, BanStatus::Banned { .. })
    }

    /// Server-supplied reason, empty when not banned
    pub fn reason(&self) -> &str {
        match self {
            BanStatus::NotBanned => "",
            BanStatus::Banned { reason } => reason,
        }
    }
}

/// Ban query backend trait
///
/// Exactly one request per call, no retries.
#[async_trait]
pub trait BanQuery: Send + Sync {
    /// Query the ban status of a numeric ID
    async fn query(&self, rid: &Rid) -> CheckResult<BanStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_reason() {
        assert_eq!(BanStatus::from_reason(""), BanStatus::NotBanned);

        let status = BanStatus::from_reason("cheating");
        assert!(status.is_banned());
        assert_eq!(status.reason(), "cheating");
    }
}
