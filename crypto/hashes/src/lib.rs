//! 32-byte opaque block identifiers and a handful of domain-level newtypes
//! built on top of them.

use faster_hex::{hex_decode, hex_string};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub const HASH_SIZE: usize = 32;

/// A 32-byte opaque block (or transaction) identifier. Ordered lexicographically
/// on the underlying bytes, which is the only ordering consensus code may rely on
/// for hash tie-breaks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Hash([u8; HASH_SIZE]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashParseError {
    #[error("invalid hash hex string: {0}")]
    InvalidHex(String),
    #[error("invalid hash length: expected {HASH_SIZE} bytes, got {0}")]
    InvalidLength(usize),
}

impl Hash {
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Builds a hash from a little-endian u64, useful for deterministic test fixtures.
    pub fn from_u64_word(word: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        bytes[..8].copy_from_slice(&word.to_le_bytes());
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, HashParseError> {
        if slice.len() != HASH_SIZE {
            return Err(HashParseError::InvalidLength(slice.len()));
        }
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; HASH_SIZE];
        hex_decode(s.as_bytes(), &mut bytes).map_err(|_| HashParseError::InvalidHex(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_string(&self.0))
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// `blockhash::NONE` is used in rare cases as the "no hash" sentinel.
pub const NONE: Hash = Hash([0u8; HASH_SIZE]);

/// `blockhash::ORIGIN` represents a synthetic "virtual genesis": every locally
/// known block is in its future. Used as the selected-parent of the genesis
/// block's GHOSTDAG data.
pub const ORIGIN: Hash = Hash([0xfeu8; HASH_SIZE]);

pub trait HashExtensions {
    fn is_none(&self) -> bool;
    fn is_origin(&self) -> bool;
}

impl HashExtensions for Hash {
    fn is_none(&self) -> bool {
        *self == NONE
    }

    fn is_origin(&self) -> bool {
        *self == ORIGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_hex() {
        let h = Hash::from_u64_word(42);
        let s = h.to_string();
        let parsed: Hash = s.parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        let a = Hash::from_bytes([1u8; HASH_SIZE]);
        let b = Hash::from_bytes([2u8; HASH_SIZE]);
        assert!(a < b);
    }

    #[test]
    fn none_and_origin_are_distinct() {
        assert_ne!(NONE, ORIGIN);
        assert!(NONE.is_none());
        assert!(ORIGIN.is_origin());
    }
}
