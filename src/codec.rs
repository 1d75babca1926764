/// Ban token encoding
///
/// The ban server does not accept raw numeric IDs. Each ID is rendered to
/// decimal, Base64-encoded, prefixed with `BE` and hashed with MD5; the
/// lowercase hex digest is what goes on the wire.
use base64::{engine::general_purpose, Engine as _};
use md5::{Digest, Md5};
use std::fmt;

/// Literal prefix hashed in front of the Base64 text
const TOKEN_PREFIX: &str = "BE";

/// Length of an encoded token in characters
pub const TOKEN_LEN: usize = 32;

/// Numeric player ID of any size, held as canonical decimal text
///
/// Canonical means ASCII digits only, no sign and no leading zeros ("0" for
/// zero). IDs are never bounded to a machine integer width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rid(String);

impl Rid {
    /// Parse decimal text; `None` unless it is a non-empty run of ASCII digits
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let trimmed = text.trim_start_matches('0');
        if trimmed.is_empty() {
            Some(Rid("0".to_string()))
        } else {
            Some(Rid(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for Rid {
    fn from(rid: u64) -> Self {
        Rid(rid.to_string())
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a numeric ID into the 32-character token the ban server expects
pub fn encode(rid: &Rid) -> String {
    let encoded = general_purpose::STANDARD.encode(rid.as_str().as_bytes());

    let mut hasher = Md5::new();
    hasher.update(TOKEN_PREFIX.as_bytes());
    hasher.update(encoded.as_bytes());

    hex::encode(hasher.finalize())
}
