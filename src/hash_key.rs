//! Fixed-width encoding of band hash values into sortable byte keys.
//!
//! Each hash value is truncated to its low `bytes()` bytes and written
//! big-endian, so a key is the plain concatenation of its values:
//!
//! ```text
//! values  = [0x0102, 0x0304, 0x0506]     (Narrow, 2 bytes each)
//! key     = 01 02 | 03 04 | 05 06
//! key[..4] == encode(values[..2])        (prefix property)
//! ```
//!
//! The prefix property is what lets a band table built from K-value keys
//! answer queries that only constrain the first K' < K values.

use serde::{Deserialize, Serialize};

/// Encoded band key. Length is always a multiple of the value width.
pub type HashKey = Vec<u8>;

/// Width of a single encoded hash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashValueSize {
    /// 16-bit values; wider hash values are truncated
    Narrow,
    /// 32-bit values; wider hash values are truncated
    #[default]
    Medium,
    /// Full 64-bit values
    Wide,
}

impl HashValueSize {
    /// Number of bytes each hash value occupies in a key
    pub const fn bytes(self) -> usize {
        match self {
            Self::Narrow => 2,
            Self::Medium => 4,
            Self::Wide => 8,
        }
    }

    /// Encode a run of hash values into a key of `values.len() * bytes()` bytes.
    pub fn encode(self, values: &[u64]) -> HashKey {
        let mut key = Vec::with_capacity(values.len() * self.bytes());
        for &v in values {
            match self {
                Self::Narrow => key.extend_from_slice(&(v as u16).to_be_bytes()),
                Self::Medium => key.extend_from_slice(&(v as u32).to_be_bytes()),
                Self::Wide => key.extend_from_slice(&v.to_be_bytes()),
            }
        }
        key
    }
}

impl std::fmt::Display for HashValueSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Narrow => write!(f, "narrow"),
            Self::Medium => write!(f, "medium"),
            Self::Wide => write!(f, "wide"),
        }
    }
}

impl std::str::FromStr for HashValueSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "narrow" | "16" | "u16" => Ok(Self::Narrow),
            "medium" | "32" | "u32" => Ok(Self::Medium),
            "wide" | "64" | "u64" => Ok(Self::Wide),
            _ => Err(format!(
                "Unknown hash value size: '{s}'. Valid options: narrow, medium, wide"
            )),
        }
    }
}
