//! TTL policy and metadata conversion

use serde::{Deserialize, Serialize};

/// PTTL reply for a key without expiry
const PTTL_NO_EXPIRY: i64 = -1;

/// Decides whether writes carry an expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    seconds: u64,
}

impl TtlPolicy {
    /// `0` disables expiry
    pub fn new(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn is_enabled(&self) -> bool {
        self.seconds > 0
    }

    /// Expiry to attach to a write, `None` for a plain SET
    pub fn expiry(&self) -> Option<u64> {
        self.is_enabled().then_some(self.seconds)
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }
}

/// Entry metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Remaining lifetime in seconds, `None` when the entry never expires
    pub ttl: Option<f64>,
}

impl Metadata {
    /// Convert a PTTL reply. Returns `None` when the key does not exist.
    pub fn from_pttl(pttl_ms: i64) -> Option<Self> {
        match pttl_ms {
            PTTL_NO_EXPIRY => Some(Self { ttl: None }),
            ms if ms < PTTL_NO_EXPIRY => None,
            ms => Some(Self {
                ttl: Some(ms as f64 / 1000.0),
            }),
        }
    }
}
