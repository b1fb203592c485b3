//! Request signing.
//!
//! The remote API recomputes the digest of `timestamp + private + public`
//! and rejects requests whose `hash` parameter differs, so the concatenation
//! order, second precision and lowercase rendering are all load-bearing.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowercase hexadecimal MD5 digest sent as the `hash` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignedHash(String);

impl SignedHash {
    /// The 32-character hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the request signature for `timestamp` (Unix seconds).
///
/// # Examples
/// ```
/// use apibdd::sign;
///
/// let hash = sign(1, "1234", "abcd");
/// assert_eq!(hash.as_str(), "ffd275c5130566a2916217b101f26150");
/// assert_eq!(hash.as_str().len(), 32);
/// ```
#[must_use]
pub fn sign(timestamp: u64, public_key: &str, private_key: &str) -> SignedHash {
    let input = format!("{timestamp}{private_key}{public_key}");
    SignedHash(format!("{:x}", md5::compute(input.as_bytes())))
}

/// Source of the request timestamp.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn unix_seconds(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

/// A clock frozen at a given second, for reproducible requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn unix_seconds(&self) -> u64 {
        self.0
    }
}
