use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Result};
use crate::varlen::{read_varlen, write_varlen, ByteReader};
use crate::zigzag::ZigZag;

/// Unsigned integer that can be varlen-coded.
pub trait Unsigned: Copy + Eq + fmt::Debug {
    const BITS: u32;
    const NAME: &'static str;

    fn to_u128(self) -> u128;

    /// Narrowing conversion; callers guarantee `v` fits.
    fn from_u128(v: u128) -> Self;
}

macro_rules! impl_unsigned {
    ($($u:ty),*) => {$(
        impl Unsigned for $u {
            const BITS: u32 = <$u>::BITS;
            const NAME: &'static str = stringify!($u);

            #[inline]
            fn to_u128(self) -> u128 {
                self as u128
            }

            #[inline]
            fn from_u128(v: u128) -> Self {
                v as $u
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64, u128);

/// One-byte tag identifying the element type of an encoded array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    I8 = 1,
    I16 = 2,
    I32 = 3,
    I64 = 4,
    I128 = 5,
    U8 = 9,
    U16 = 10,
    U32 = 11,
    U64 = 12,
    U128 = 13,
}

impl ElementType {
    pub const ALL: [ElementType; 10] = [
        ElementType::I8,
        ElementType::I16,
        ElementType::I32,
        ElementType::I64,
        ElementType::I128,
        ElementType::U8,
        ElementType::U16,
        ElementType::U32,
        ElementType::U64,
        ElementType::U128,
    ];

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::I128 => "i128",
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::U32 => "u32",
            ElementType::U64 => "u64",
            ElementType::U128 => "u128",
        }
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::I32 | ElementType::U32 => 4,
            ElementType::I64 | ElementType::U64 => 8,
            ElementType::I128 | ElementType::U128 => 16,
        }
    }

    pub fn is_signed(self) -> bool {
        (self.tag() as usize) < 8
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| CodecError::Encode(format!("unknown element type '{s}'")))
    }
}

/// Integer element type that arrays can be encoded over.
///
/// Deltas between neighbouring elements are taken in `i128`. For every type of
/// up to 64 bits that is at least one bit wider than the element, so a delta
/// always fits; the 128-bit types report `None` when it does not.
pub trait Element: Copy + PartialEq + Default + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;
    const BITS: u32;
    const SIGNED: bool;

    /// Writes `self` as varlen, zig-zag mapped first when the type is signed.
    fn write_autozz(self, buf: &mut Vec<u8>);

    /// Inverse of [`Element::write_autozz`].
    fn read_autozz(reader: &mut ByteReader<'_>) -> Result<Self>;

    /// `next - prev`, or `None` if it does not fit into `i128`.
    fn delta(prev: Self, next: Self) -> Option<i128>;

    /// `self + delta`, or `None` if the result is outside the type.
    fn add_delta(self, delta: i128) -> Option<Self>;

    fn write_le(self, buf: &mut Vec<u8>);

    /// Reads one element from exactly `size_of::<Self>()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element_common {
    ($t:ty, $tag:expr, $signed:expr) => {
        const ELEMENT_TYPE: ElementType = $tag;
        const BITS: u32 = <$t>::BITS;
        const SIGNED: bool = $signed;

        #[inline]
        fn write_le(self, buf: &mut Vec<u8>) {
            buf.extend_from_slice(&self.to_le_bytes());
        }

        #[inline]
        fn read_le(bytes: &[u8]) -> Self {
            let mut raw = [0u8; std::mem::size_of::<$t>()];
            raw.copy_from_slice(bytes);
            <$t>::from_le_bytes(raw)
        }
    };
}

macro_rules! impl_narrow_delta {
    ($t:ty) => {
        #[inline]
        fn delta(prev: Self, next: Self) -> Option<i128> {
            Some(next as i128 - prev as i128)
        }

        #[inline]
        fn add_delta(self, delta: i128) -> Option<Self> {
            (self as i128).checked_add(delta).and_then(|v| <$t>::try_from(v).ok())
        }
    };
}

macro_rules! impl_signed_element {
    ($($t:ty => $tag:expr),* $(,)?) => {$(
        impl Element for $t {
            impl_element_common!($t, $tag, true);
            impl_narrow_delta!($t);

            #[inline]
            fn write_autozz(self, buf: &mut Vec<u8>) {
                write_varlen(buf, self.zigzag());
            }

            #[inline]
            fn read_autozz(reader: &mut ByteReader<'_>) -> Result<Self> {
                Ok(<$t>::unzigzag(read_varlen(reader)?))
            }
        }
    )*};
}

macro_rules! impl_unsigned_element {
    ($($t:ty => $tag:expr),* $(,)?) => {$(
        impl Element for $t {
            impl_element_common!($t, $tag, false);
            impl_narrow_delta!($t);

            #[inline]
            fn write_autozz(self, buf: &mut Vec<u8>) {
                write_varlen(buf, self);
            }

            #[inline]
            fn read_autozz(reader: &mut ByteReader<'_>) -> Result<Self> {
                read_varlen(reader)
            }
        }
    )*};
}

impl_signed_element!(
    i8 => ElementType::I8,
    i16 => ElementType::I16,
    i32 => ElementType::I32,
    i64 => ElementType::I64,
);

impl_unsigned_element!(
    u8 => ElementType::U8,
    u16 => ElementType::U16,
    u32 => ElementType::U32,
    u64 => ElementType::U64,
);

impl Element for i128 {
    impl_element_common!(i128, ElementType::I128, true);

    fn write_autozz(self, buf: &mut Vec<u8>) {
        write_varlen(buf, self.zigzag());
    }

    fn read_autozz(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(i128::unzigzag(read_varlen(reader)?))
    }

    fn delta(prev: Self, next: Self) -> Option<i128> {
        next.checked_sub(prev)
    }

    fn add_delta(self, delta: i128) -> Option<Self> {
        self.checked_add(delta)
    }
}

impl Element for u128 {
    impl_element_common!(u128, ElementType::U128, false);

    fn write_autozz(self, buf: &mut Vec<u8>) {
        write_varlen(buf, self);
    }

    fn read_autozz(reader: &mut ByteReader<'_>) -> Result<Self> {
        read_varlen(reader)
    }

    fn delta(prev: Self, next: Self) -> Option<i128> {
        if next >= prev {
            i128::try_from(next - prev).ok()
        } else {
            0i128.checked_sub_unsigned(prev - next)
        }
    }

    fn add_delta(self, delta: i128) -> Option<Self> {
        self.checked_add_signed(delta)
    }
}

/// Little-endian fixed-width bytes of `data`.
pub fn to_le_bytes<T: Element>(data: &[T]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() * T::ELEMENT_TYPE.size());
    for &x in data {
        x.write_le(&mut buf);
    }
    buf
}

/// Inverse of [`to_le_bytes`]; a length that is not a multiple of the
/// element size is malformed.
pub fn from_le_bytes<T: Element>(bytes: &[u8]) -> Result<Vec<T>> {
    let size = T::ELEMENT_TYPE.size();
    if bytes.len() % size != 0 {
        return Err(crate::error::DecodeError::TrailingBytes {
            count: bytes.len() % size,
        }
        .into());
    }
    Ok(bytes.chunks_exact(size).map(T::read_le).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for t in ElementType::ALL {
            assert_eq!(ElementType::from_tag(t.tag()), Some(t));
            assert_eq!(t.name().parse::<ElementType>().unwrap(), t);
        }
        assert_eq!(ElementType::from_tag(0), None);
        assert!("f32".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_signedness_and_size() {
        assert!(ElementType::I64.is_signed());
        assert!(!ElementType::U8.is_signed());
        assert_eq!(ElementType::U128.size(), 16);
        assert_eq!(<i32 as Element>::ELEMENT_TYPE, ElementType::I32);
        assert!(<i16 as Element>::SIGNED);
    }

    #[test]
    fn test_deltas_of_extremes() {
        assert_eq!(i64::delta(i64::MIN, i64::MAX), Some(u64::MAX as i128));
        assert_eq!(u64::delta(u64::MAX, 0), Some(-(u64::MAX as i128)));
        assert_eq!(i128::delta(i128::MIN, i128::MAX), None);
        assert_eq!(u128::delta(0, u128::MAX), None);
        assert_eq!(u128::delta(1 << 127, 0), Some(i128::MIN));
    }

    #[test]
    fn test_add_delta_checks_range() {
        assert_eq!(5u8.add_delta(250), Some(255));
        assert_eq!(5u8.add_delta(251), None);
        assert_eq!(0u8.add_delta(-1), None);
        assert_eq!(i128::MAX.add_delta(1), None);
        assert_eq!(u128::MAX.add_delta(-1), Some(u128::MAX - 1));
    }

    #[test]
    fn test_le_bytes() {
        let bytes = to_le_bytes(&[1u16, 0x0203]);
        assert_eq!(bytes, vec![1, 0, 3, 2]);
        assert_eq!(from_le_bytes::<u16>(&bytes).unwrap(), vec![1, 0x0203]);
        assert!(from_le_bytes::<u16>(&bytes[..3]).is_err());
    }
}
