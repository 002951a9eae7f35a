//! Signed 64-bit fixed-point amount with 10^-8 precision.

use std::fmt;
use std::iter::Sum;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::io::{BinaryReader, BinaryWriter, Serializable};

const SCALE: i64 = 100_000_000;

/// A token amount. One whole token is `10^8` raw units.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed8(i64);

impl Fixed8 {
    pub const ZERO: Fixed8 = Fixed8(0);
    pub const ONE: Fixed8 = Fixed8(SCALE);
    pub const SATOSHI: Fixed8 = Fixed8(1);
    pub const MAX: Fixed8 = Fixed8(i64::MAX);

    /// Builds from raw `10^-8` units.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Builds from a whole-token count.
    pub fn from_whole(tokens: u64) -> Result<Self> {
        let raw = (tokens as i64).checked_mul(SCALE).ok_or(CoreError::Overflow)?;
        Ok(Self(raw))
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0.checked_add(other.0).map(Self).ok_or(CoreError::Overflow)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0.checked_sub(other.0).map(Self).ok_or(CoreError::Overflow)
    }

    /// True when this amount is representable at the given decimal precision
    /// (0..=8): all lower digits are zero.
    pub fn fits_precision(self, precision: u8) -> bool {
        debug_assert!(precision <= 8);
        let divisor = 10_i64.pow(8 - precision as u32);
        self.0 % divisor == 0
    }
}

impl Neg for Fixed8 {
    type Output = Fixed8;

    fn neg(self) -> Fixed8 {
        Fixed8(-self.0)
    }
}

impl Sum for Fixed8 {
    fn sum<I: Iterator<Item = Fixed8>>(iter: I) -> Fixed8 {
        iter.fold(Fixed8::ZERO, |acc, x| Fixed8(acc.0.saturating_add(x.0)))
    }
}

impl fmt::Display for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE as u64;
        let frac = abs % SCALE as u64;
        if frac == 0 {
            write!(f, "{sign}{whole}")
        } else {
            let frac = format!("{frac:08}");
            write!(f, "{sign}{whole}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl fmt::Debug for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed8({self})")
    }
}

impl Serializable for Fixed8 {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_i64(self.0);
    }

    fn deserialize(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self(reader.read_i64()?))
    }

    fn size(&self) -> usize {
        8
    }
}
