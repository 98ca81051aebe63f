//! Zig-zag mapping between signed integers and same-width unsigned integers.
//!
//! `0 → 0, -1 → 1, 1 → 2, -2 → 3, …`, so values of small magnitude map to
//! small unsigned numbers and stay short once varlen-coded.

use crate::element::Unsigned;

/// Signed integer with a zig-zag counterpart of the same width.
pub trait ZigZag: Copy {
    type Unsigned: Unsigned;

    fn zigzag(self) -> Self::Unsigned;
    fn unzigzag(u: Self::Unsigned) -> Self;
}

macro_rules! impl_zigzag {
    ($($s:ty => $u:ty),* $(,)?) => {$(
        impl ZigZag for $s {
            type Unsigned = $u;

            #[inline]
            fn zigzag(self) -> $u {
                // `>>` on a signed type is arithmetic: all ones for negatives
                ((self << 1) ^ (self >> (<$s>::BITS - 1))) as $u
            }

            #[inline]
            fn unzigzag(u: $u) -> $s {
                ((u >> 1) as $s) ^ -((u & 1) as $s)
            }
        }
    )*};
}

impl_zigzag!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128);

#[inline]
pub fn zigzag<S: ZigZag>(n: S) -> S::Unsigned {
    n.zigzag()
}

#[inline]
pub fn unzigzag<S: ZigZag>(u: S::Unsigned) -> S {
    S::unzigzag(u)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_interleave() {
        let mapped: Vec<u32> = [0i32, -1, 1, -2, 2, -3, 3].iter().map(|&n| zigzag(n)).collect();
        assert_eq!(mapped, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_extremes_do_not_overflow() {
        assert_eq!(zigzag(i8::MAX), 254u8);
        assert_eq!(zigzag(i8::MIN), 255u8);
        assert_eq!(unzigzag::<i8>(255), i8::MIN);
        assert_eq!(zigzag(i64::MIN), u64::MAX);
        assert_eq!(unzigzag::<i64>(u64::MAX), i64::MIN);
        assert_eq!(unzigzag::<i128>(zigzag(i128::MIN)), i128::MIN);
        assert_eq!(unzigzag::<i128>(zigzag(i128::MAX)), i128::MAX);
    }

    #[test]
    fn test_exhaustive_i8_bijection() {
        let mut seen = [false; 256];
        for n in i8::MIN..=i8::MAX {
            let u = zigzag(n);
            assert!(!seen[u as usize], "zigzag({n}) collides");
            seen[u as usize] = true;
            assert_eq!(unzigzag::<i8>(u), n);
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_exhaustive_i16_round_trip() {
        for n in i16::MIN..=i16::MAX {
            assert_eq!(unzigzag::<i16>(zigzag(n)), n);
        }
    }
}
