//! A 256-bit unsigned integer, used as a proof-of-work target, plus the
//! compact ("bits") encoding used on the wire.
//!
//! The limb layout is little-endian: `0` is the least-significant 64 bits.

use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uint256([u64; 4]);

impl Uint256 {
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    pub const MAX: Self = Self([u64::MAX; 4]);

    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0, 0])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&limb| limb == 0)
    }

    pub fn as_u64(&self) -> u64 {
        self.0[0]
    }

    /// Number of bits required to represent this value (0 for zero).
    pub fn bit_length(&self) -> u32 {
        for i in (0..4).rev() {
            if self.0[i] != 0 {
                return (i as u32) * 64 + (64 - self.0[i].leading_zeros());
            }
        }
        0
    }

    pub fn shl(&self, bits: u32) -> Self {
        if bits == 0 {
            return *self;
        }
        if bits >= 256 {
            return Self::ZERO;
        }
        let limb_shift = (bits / 64) as usize;
        let bit_shift = bits % 64;
        let mut out = [0u64; 4];
        for i in (0..4).rev() {
            if i < limb_shift {
                continue;
            }
            let src = i - limb_shift;
            let mut val = self.0[src] << bit_shift;
            if bit_shift != 0 && src > 0 {
                val |= self.0[src - 1] >> (64 - bit_shift);
            }
            out[i] = val;
        }
        Self(out)
    }

    pub fn shr(&self, bits: u32) -> Self {
        if bits == 0 {
            return *self;
        }
        if bits >= 256 {
            return Self::ZERO;
        }
        let limb_shift = (bits / 64) as usize;
        let bit_shift = bits % 64;
        let mut out = [0u64; 4];
        for i in 0..4 {
            let src = i + limb_shift;
            if src >= 4 {
                continue;
            }
            let mut val = self.0[src] >> bit_shift;
            if bit_shift != 0 && src + 1 < 4 {
                val |= self.0[src + 1] << (64 - bit_shift);
            }
            out[i] = val;
        }
        Self(out)
    }

    /// Multiplies by a `u64`, saturating to [`Uint256::MAX`] on overflow.
    pub fn saturating_mul_u64(&self, rhs: u64) -> Self {
        if rhs == 0 || self.is_zero() {
            return Self::ZERO;
        }
        let mut result = [0u64; 4];
        let mut carry: u128 = 0;
        for i in 0..4 {
            let prod = (self.0[i] as u128) * (rhs as u128) + carry;
            result[i] = prod as u64;
            carry = prod >> 64;
        }
        if carry != 0 {
            return Self::MAX;
        }
        Self(result)
    }

    /// Divides by a `u64`. Panics on division by zero, matching the only
    /// callers of this operation, all of which divide by a validated
    /// non-zero window size or target time.
    pub fn div_u64(&self, rhs: u64) -> Self {
        assert_ne!(rhs, 0, "division by zero");
        let mut result = [0u64; 4];
        let mut rem: u128 = 0;
        for i in (0..4).rev() {
            let cur = (rem << 64) | self.0[i] as u128;
            result[i] = (cur / rhs as u128) as u64;
            rem = cur % rhs as u128;
        }
        Self(result)
    }

    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Decodes the 32-bit compact ("bits") encoding of a 256-bit target,
    /// following the same layout as Bitcoin's `nBits`/`arith_uint256::SetCompact`.
    /// A negative-flagged or overflowing encoding decodes to zero.
    pub fn from_compact(bits: u32) -> Self {
        let size = (bits >> 24) as u32;
        let mut word = (bits & 0x007f_ffff) as u64;
        let is_negative = bits & 0x0080_0000 != 0;
        if is_negative || word == 0 {
            return Self::ZERO;
        }
        if size <= 3 {
            word >>= 8 * (3 - size);
            Self::from_u64(word)
        } else {
            let shift = 8 * (size - 3);
            if shift >= 256 {
                return Self::ZERO;
            }
            Self::from_u64(word).shl(shift)
        }
    }

    /// Encodes this value into the compact ("bits") representation.
    pub fn to_compact(&self) -> u32 {
        if self.is_zero() {
            return 0;
        }
        let mut size = (self.bit_length() + 7) / 8;
        let mut compact: u32 = if size <= 3 {
            (self.as_u64() << (8 * (3 - size))) as u32
        } else {
            self.shr(8 * (size - 3)).as_u64() as u32
        };
        // The sign bit (0x00800000) must never be set on a positive value;
        // if it would be, shift one more byte out and bump the size.
        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }
        compact | (size << 24)
    }
}

impl PartialOrd for Uint256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uint256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}{:016x}{:016x}{:016x}", self.0[3], self.0[2], self.0[1], self.0[0])
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Default for Uint256 {
    fn default() -> Self {
        Self::ZERO
    }
}
