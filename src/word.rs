//! The typed word discipline for FEB cells.
//!
//! A [`FebCell`](crate::cell::FebCell) synchronizes exactly one machine word.
//! Any `Copy` type of the same width can flow through a cell, but the width
//! requirement is a *compile-time* property: a mismatch is a programming
//! error, not a runtime condition. [`Word`] is therefore a sealed trait
//! implemented only for the word-sized primitives, with a `const` size
//! assertion baked into each impl. There is no runtime size check anywhere.
//!
//! Pointer-width types (`usize`/`isize`) participate only on 64-bit targets,
//! where they actually are word-sized.

/// Number of bytes in the synchronized word.
pub const WORD_BYTES: usize = 8;

mod sealed {
    pub trait Sealed {}
}

/// A value exactly one machine word wide, convertible to and from its raw
/// bit pattern.
///
/// Sealed: the implementing set is fixed to the word-sized primitives.
/// Conversions are lossless bit casts; a round trip through
/// [`to_bits`](Word::to_bits) / [`from_bits`](Word::from_bits) is identity.
pub trait Word: Copy + Send + Sync + sealed::Sealed + 'static {
    /// Returns the raw bit pattern of the value.
    fn to_bits(self) -> u64;

    /// Reconstructs the value from a raw bit pattern.
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_word_int {
    ($($t:ty),*) => {
        $(
            const _: () = assert!(core::mem::size_of::<$t>() == WORD_BYTES);

            impl sealed::Sealed for $t {}

            impl Word for $t {
                #[inline]
                fn to_bits(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_bits(bits: u64) -> Self {
                    bits as Self
                }
            }
        )*
    };
}

impl_word_int!(u64, i64);

#[cfg(target_pointer_width = "64")]
impl_word_int!(usize, isize);

const _: () = assert!(core::mem::size_of::<f64>() == WORD_BYTES);

impl sealed::Sealed for f64 {}

impl Word for f64 {
    #[inline]
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trips() {
        assert_eq!(u64::from_bits(42u64.to_bits()), 42);
        assert_eq!(i64::from_bits((-7i64).to_bits()), -7);
        assert_eq!(i64::from_bits(i64::MIN.to_bits()), i64::MIN);
    }

    #[test]
    fn float_round_trips_preserve_bits() {
        let v = -0.0f64;
        assert_eq!(f64::from_bits(Word::to_bits(v)).to_bits(), v.to_bits());
        let nan = f64::NAN;
        assert!(f64::from_bits(Word::to_bits(nan)).is_nan());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn pointer_width_round_trips() {
        assert_eq!(usize::from_bits(usize::MAX.to_bits()), usize::MAX);
        assert_eq!(isize::from_bits((-1isize).to_bits()), -1);
    }
}
