//! # Variable-length integers
//!
//! Unsigned integers are written LSB-first in groups of 7 bits, one group per
//! byte. The high bit of each byte is the continuation flag: set when more
//! bytes follow, clear on the last byte.
//!
//! ```text
//!   0 -> [0x00]
//! 127 -> [0x7F]
//! 128 -> [0x80, 0x01]
//! 300 -> [0xAC, 0x02]
//! ```
//!
//! The encoder always emits the minimal number of bytes. The decoder rejects
//! values that do not fit the requested type instead of wrapping, and never
//! reads past the end of its input.

use crate::element::{Element, Unsigned};
use crate::error::{CodecError, DecodeError, Result};

const PAYLOAD_MASK: u8 = 0x7f;
const CONTINUATION: u8 = 0x80;

/// Cursor over an encoded byte slice.
///
/// Tracks how many bytes have been consumed, which is what the sequential
/// decoders report as their position.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(DecodeError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }
}

/// Maximum number of bytes a canonical varlen of a `bits`-wide value can take.
#[inline]
pub const fn max_varlen_len(bits: u32) -> usize {
    bits.div_ceil(7) as usize
}

/// Appends the varlen encoding of `value` to `buf`.
pub fn write_varlen<U: Unsigned>(buf: &mut Vec<u8>, value: U) {
    let mut value = value.to_u128();
    loop {
        let mut byte = (value as u8) & PAYLOAD_MASK;
        value >>= 7;
        if value != 0 {
            byte |= CONTINUATION;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Number of bytes [`write_varlen`] would emit for `value`.
pub fn varlen_len<U: Unsigned>(value: U) -> usize {
    let bits = 128 - value.to_u128().leading_zeros();
    max_varlen_len(bits).max(1)
}

/// Reads one varlen-coded value of type `U`.
///
/// Fails with [`CodecError::Overflow`] when the value needs more than
/// `U::BITS` bits and with [`DecodeError::Truncated`] when the input ends
/// before the terminating byte.
pub fn read_varlen<U: Unsigned>(reader: &mut ByteReader<'_>) -> Result<U> {
    read_varlen_bits(reader, U::BITS, U::NAME).map(U::from_u128)
}

/// Reads a varlen value of at most `bits` bits (`bits <= 128`).
pub(crate) fn read_varlen_bits(
    reader: &mut ByteReader<'_>,
    bits: u32,
    type_name: &'static str,
) -> Result<u128> {
    let overflow = || CodecError::Overflow { type_name, bits };
    let mut value = 0u128;
    for i in 0..max_varlen_len(bits) {
        let byte = reader.read_u8()?;
        let payload = (byte & PAYLOAD_MASK) as u128;
        let shift = 7 * i as u32;
        // shift < bits holds for every i below max_varlen_len(bits)
        if shift + 7 > bits && payload >> (bits - shift) != 0 {
            return Err(overflow());
        }
        value |= payload << shift;
        if byte & CONTINUATION == 0 {
            return Ok(value);
        }
    }
    Err(overflow())
}

/// Reads an element, undoing the zig-zag mapping when `T` is signed.
#[inline]
pub fn read_autozz_varlen<T: Element>(reader: &mut ByteReader<'_>) -> Result<T> {
    T::read_autozz(reader)
}

/// Writes an element, zig-zag mapping it first when `T` is signed.
#[inline]
pub fn write_autozz_varlen<T: Element>(buf: &mut Vec<u8>, value: T) {
    value.write_autozz(buf)
}
