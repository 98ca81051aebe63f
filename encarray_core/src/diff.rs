//! # Varlen diff codec
//!
//! Stores the first element literally and every following element as the
//! signed difference from its predecessor:
//!
//! ```text
//! [x0: autozz varlen][x1 - x0: zigzag varlen]...[x(n-1) - x(n-2): zigzag varlen]
//! ```
//!
//! There is no length prefix and no separator; the element count travels with
//! the array shape. Differences are taken in `i128`, so for element types of up
//! to 64 bits every delta fits. For `i128`/`u128` a delta outside `i128` is a
//! [`CodecError::Range`] at encode time.
//!
//! Decoding is strictly sequential: element `i` needs the bytes of elements
//! `0..=i`, so random access costs `O(i)` while a full decode is `O(n)`.

use log::trace;

use crate::codec::{ArrayCodec, DecodePolicy};
use crate::element::Element;
use crate::error::{CodecError, DecodeError, Result};
use crate::format::CODEC_VARLEN_DIFF;
use crate::varlen::{read_varlen_bits, write_varlen, ByteReader};
use crate::zigzag::ZigZag;

/// Delta + zig-zag + varlen codec for integer arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VarlenDiffArrayCodec;

impl VarlenDiffArrayCodec {
    /// Sequential decoder over `encoded`.
    pub fn decoder<'a, T: Element>(&self, encoded: &'a [u8]) -> DiffDecoder<'a, T> {
        DiffDecoder::new(encoded)
    }

    fn write_elements<T: Element>(
        encoded: &mut Vec<u8>,
        tail: Option<T>,
        data: &[T],
    ) -> Result<()> {
        let mut prev = tail;
        for &x in data {
            match prev {
                None => x.write_autozz(encoded),
                Some(p) => {
                    let delta = T::delta(p, x).ok_or_else(|| CodecError::Range {
                        prev: p.to_string(),
                        next: x.to_string(),
                    })?;
                    write_varlen(encoded, delta.zigzag());
                }
            }
            prev = Some(x);
        }
        Ok(())
    }
}

/// Number of bytes that terminate a varlen value (continuation bit clear).
fn count_terminators(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b & 0x80 == 0).count()
}

impl ArrayCodec for VarlenDiffArrayCodec {
    fn id(&self) -> u16 {
        CODEC_VARLEN_DIFF
    }

    fn name(&self) -> &'static str {
        "varlen-diff"
    }

    fn encode_data<T: Element>(&self, encoded: &mut Vec<u8>, data: &[T]) -> Result<()> {
        encoded.clear();
        Self::write_elements(encoded, None, data)?;
        trace!("varlen-diff: {} elements -> {} bytes", data.len(), encoded.len());
        Ok(())
    }

    fn decode_data<T: Element>(
        &self,
        decoded: &mut Vec<T>,
        encoded: &[u8],
        policy: DecodePolicy,
    ) -> Result<()> {
        match policy {
            DecodePolicy::Resize => {
                decoded.clear();
                decoded.reserve(count_terminators(encoded));
                for x in self.decoder::<T>(encoded) {
                    decoded.push(x?);
                }
            }
            DecodePolicy::Presized => self.decode_presized(decoded, encoded)?,
        }
        Ok(())
    }

    fn decode_presized<T: Element>(&self, out: &mut [T], encoded: &[u8]) -> Result<()> {
        let expected = out.len();
        let mut decoder = self.decoder::<T>(encoded);
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = match decoder.next() {
                Some(x) => x?,
                None => return Err(CodecError::ShapeMismatch { expected, actual: i }),
            };
        }
        let rest = &encoded[decoder.position()..];
        if let Some(&last) = rest.last() {
            if last & 0x80 != 0 {
                return Err(DecodeError::TrailingBytes { count: rest.len() }.into());
            }
            return Err(CodecError::ShapeMismatch {
                expected,
                actual: expected + count_terminators(rest),
            });
        }
        Ok(())
    }

    fn decoded_len<T: Element>(&self, encoded: &[u8]) -> Option<usize> {
        match encoded.last() {
            Some(&last) if last & 0x80 != 0 => None,
            _ => Some(count_terminators(encoded)),
        }
    }

    // every value ends in exactly one byte with the continuation bit clear
    fn max_decoded_len<T: Element>(&self, encoded: &[u8]) -> Option<usize> {
        Some(count_terminators(encoded))
    }

    fn supports_append(&self) -> bool {
        true
    }

    fn append_data<T: Element>(
        &self,
        encoded: &mut Vec<u8>,
        tail: Option<T>,
        data: &[T],
    ) -> Result<()> {
        Self::write_elements(encoded, tail, data)
    }

    fn decode_element<T: Element>(&self, encoded: &[u8], len: usize, index: usize) -> Result<T> {
        if index >= len {
            return Err(CodecError::IndexOutOfBounds { index, len });
        }
        match self.decoder::<T>(encoded).nth(index) {
            Some(x) => x,
            None => Err(CodecError::ShapeMismatch {
                expected: len,
                actual: count_terminators(encoded),
            }),
        }
    }
}

/// Iterator decoding a varlen-diff stream one element at a time.
///
/// Stops at the end of the input; yields one error and then stops when the
/// stream is malformed.
#[derive(Debug, Clone)]
pub struct DiffDecoder<'a, T> {
    reader: ByteReader<'a>,
    prev: Option<T>,
    failed: bool,
}

impl<'a, T: Element> DiffDecoder<'a, T> {
    pub fn new(encoded: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(encoded),
            prev: None,
            failed: false,
        }
    }

    /// Bytes consumed by the elements decoded so far.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    fn read_next(&mut self) -> Result<T> {
        match self.prev {
            None => T::read_autozz(&mut self.reader),
            Some(prev) => {
                // a zig-zagged delta of a B-bit type needs at most B + 1 bits
                let bits = (T::BITS + 1).min(128);
                let delta = i128::unzigzag(read_varlen_bits(
                    &mut self.reader,
                    bits,
                    T::ELEMENT_TYPE.name(),
                )?);
                prev.add_delta(delta).ok_or(CodecError::Overflow {
                    type_name: T::ELEMENT_TYPE.name(),
                    bits: T::BITS,
                })
            }
        }
    }
}

impl<T: Element> Iterator for DiffDecoder<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }
        match self.read_next() {
            Ok(x) => {
                self.prev = Some(x);
                Some(Ok(x))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zigzag::zigzag;

    fn encode<T: Element>(data: &[T]) -> Vec<u8> {
        let mut buf = Vec::new();
        VarlenDiffArrayCodec.encode_data(&mut buf, data).unwrap();
        buf
    }

    fn decode<T: Element>(buf: &[u8]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        VarlenDiffArrayCodec.decode_data(&mut out, buf, DecodePolicy::Resize)?;
        Ok(out)
    }

    #[test]
    fn test_signed_scenario_bytes() {
        let data = [5i32, 7, 3, 3, 10];
        let buf = encode(&data);
        // 5 -> zz 10; deltas 2, -4, 0, 7 -> zz 4, 7, 0, 14
        assert_eq!(buf, vec![10, 4, 7, 0, 14]);
        assert_eq!(zigzag(-4i32), 7);
        assert_eq!(decode::<i32>(&buf).unwrap(), data);
    }

    #[test]
    fn test_unsigned_first_value_is_plain() {
        let buf = encode(&[5u32, 7]);
        assert_eq!(buf, vec![5, 4]);
        // a decreasing unsigned sequence still uses zig-zag deltas
        let buf = encode(&[200u8, 0]);
        assert_eq!(buf, vec![0xc8, 0x01, 0x8f, 0x03]);
        assert_eq!(decode::<u8>(&buf).unwrap(), vec![200, 0]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(encode::<i64>(&[]).is_empty());
        assert_eq!(decode::<i64>(&[]).unwrap(), Vec::<i64>::new());
        assert_eq!(encode(&[-3i64]), vec![5]);
        assert_eq!(decode::<i64>(&[5]).unwrap(), vec![-3]);
    }

    #[test]
    fn test_extreme_64_bit_deltas() {
        let data = [i64::MIN, i64::MAX, i64::MIN, 0];
        assert_eq!(decode::<i64>(&encode(&data)).unwrap(), data);
        let data = [0u64, u64::MAX, 0, u64::MAX];
        assert_eq!(decode::<u64>(&encode(&data)).unwrap(), data);
    }

    #[test]
    fn test_128_bit_delta_out_of_range() {
        let mut buf = Vec::new();
        let err = VarlenDiffArrayCodec
            .encode_data(&mut buf, &[i128::MIN, i128::MAX])
            .unwrap_err();
        assert!(matches!(err, CodecError::Range { .. }));

        let data = [u128::MAX, u128::MAX - 5, 3];
        let err = VarlenDiffArrayCodec.encode_data(&mut buf, &data).unwrap_err();
        assert!(matches!(err, CodecError::Range { .. }));

        let data = [i128::MAX, 0, i128::MIN + 1];
        assert_eq!(decode::<i128>(&encode(&data)).unwrap(), data);
    }

    #[test]
    fn test_decoded_value_out_of_type_range() {
        // 250 followed by a delta of +10 does not fit u8
        let mut buf = Vec::new();
        write_varlen(&mut buf, 250u8);
        write_varlen(&mut buf, zigzag(10i32));
        assert!(matches!(
            decode::<u8>(&buf),
            Err(CodecError::Overflow { type_name: "u8", .. })
        ));
    }

    #[test]
    fn test_presized_shape_checks() {
        let buf = encode(&[1i16, 2, 3]);

        let mut out = vec![0i16; 3];
        VarlenDiffArrayCodec
            .decode_data(&mut out, &buf, DecodePolicy::Presized)
            .unwrap();
        assert_eq!(out, vec![1, 2, 3]);

        let mut short = vec![0i16; 2];
        assert!(matches!(
            VarlenDiffArrayCodec.decode_data(&mut short, &buf, DecodePolicy::Presized),
            Err(CodecError::ShapeMismatch { expected: 2, actual: 3 })
        ));

        let mut long = vec![0i16; 4];
        assert!(matches!(
            VarlenDiffArrayCodec.decode_data(&mut long, &buf, DecodePolicy::Presized),
            Err(CodecError::ShapeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_truncated_and_trailing_bytes() {
        let mut buf = encode(&[1000u32, 5000]);
        buf.pop();
        assert!(matches!(
            decode::<u32>(&buf),
            Err(CodecError::Decode(DecodeError::Truncated { .. }))
        ));

        let mut buf = encode(&[1u32, 2]);
        buf.push(0x80);
        let mut out = vec![0u32; 2];
        assert!(matches!(
            VarlenDiffArrayCodec.decode_data(&mut out, &buf, DecodePolicy::Presized),
            Err(CodecError::Decode(DecodeError::TrailingBytes { count: 1 }))
        ));
        assert_eq!(VarlenDiffArrayCodec.decoded_len::<u32>(&buf), None);
    }

    #[test]
    fn test_decoded_len_counts_values() {
        let buf = encode(&[0u64, 1 << 40, 3, 1 << 20]);
        assert_eq!(VarlenDiffArrayCodec.decoded_len::<u64>(&buf), Some(4));
        assert_eq!(VarlenDiffArrayCodec.decoded_len::<u64>(&[]), Some(0));
    }

    #[test]
    fn test_append_matches_full_encoding() {
        let mut buf = encode(&[5i32, 7]);
        VarlenDiffArrayCodec
            .append_data(&mut buf, Some(7i32), &[3, 3, 10])
            .unwrap();
        assert_eq!(buf, encode(&[5i32, 7, 3, 3, 10]));
    }

    #[test]
    fn test_max_decoded_len_bounds_claimed_lengths() {
        let buf = encode(&[300u32, 1, 2]);
        assert_eq!(VarlenDiffArrayCodec.max_decoded_len::<u32>(&buf), Some(3));
        let mut open = buf.clone();
        open.push(0x80);
        assert_eq!(VarlenDiffArrayCodec.decoded_len::<u32>(&open), None);
        assert_eq!(VarlenDiffArrayCodec.max_decoded_len::<u32>(&open), Some(3));
    }

    #[test]
    fn test_decode_presized_writes_in_place() {
        let buf = encode(&[-1i64, 40, -300]);
        let mut out = [0i64; 3];
        VarlenDiffArrayCodec.decode_presized(&mut out, &buf).unwrap();
        assert_eq!(out, [-1, 40, -300]);
        assert!(matches!(
            VarlenDiffArrayCodec.decode_presized(&mut [0i64; 4], &buf),
            Err(CodecError::ShapeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_decoder_stops_after_error() {
        let buf = [0x80u8];
        let mut decoder = VarlenDiffArrayCodec.decoder::<u8>(&buf);
        assert!(decoder.next().unwrap().is_err());
        assert!(decoder.next().is_none());
    }
}
