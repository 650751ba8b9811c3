//! Conversion from caller-supplied integers to sequence positions.

/// A value that can be used to index a sequence.
///
/// Implemented for every primitive integer up to 64 bits so callers can pass
/// whatever they have at hand, including negative numbers. A negative index is
/// not a panic or a wrap-around: it is reported as a domain error.
pub trait SequenceIndex: Copy {
    /// The position this index denotes, or `None` if it is not a valid
    /// `usize` (negative, or too large for the platform).
    fn to_position(self) -> Option<usize>;

    /// Lossless widening used in error reports.
    fn to_i128(self) -> i128;
}

macro_rules! impl_sequence_index {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SequenceIndex for $ty {
                #[inline]
                fn to_position(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                #[inline]
                fn to_i128(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

impl_sequence_index!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_positions() {
        assert_eq!(0u8.to_position(), Some(0));
        assert_eq!(42u64.to_position(), Some(42));
        assert_eq!(usize::MAX.to_position(), Some(usize::MAX));
    }

    #[test]
    fn test_negative_indices_have_no_position() {
        assert_eq!((-1i32).to_position(), None);
        assert_eq!(i64::MIN.to_position(), None);
        assert_eq!((-1i32).to_i128(), -1);
        assert_eq!(i64::MIN.to_i128(), i64::MIN as i128);
    }
}
