use encarray_core::element::{from_le_bytes, to_le_bytes};
use encarray_core::format::CODEC_PLAIN;
use encarray_core::{ArrayCodec, CodecError, DecodeError, DecodePolicy, Element, Result};

/// No-op codec: elements stored as fixed-width little-endian bytes.
///
/// Useful for:
/// - Verifying the container round-trip independently of any real encoding.
/// - Data with no locality, where a delta encoding would only add bytes.
///
/// The only bundled codec with O(1) element access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainArrayCodec;

impl ArrayCodec for PlainArrayCodec {
    fn id(&self) -> u16 {
        CODEC_PLAIN
    }

    fn name(&self) -> &'static str {
        "plain"
    }

    fn encode_data<T: Element>(&self, encoded: &mut Vec<u8>, data: &[T]) -> Result<()> {
        encoded.clear();
        self.append_data(encoded, None, data)
    }

    fn decode_data<T: Element>(
        &self,
        decoded: &mut Vec<T>,
        encoded: &[u8],
        policy: DecodePolicy,
    ) -> Result<()> {
        fill_decoded(decoded, encoded, policy)
    }

    fn decode_presized<T: Element>(&self, out: &mut [T], encoded: &[u8]) -> Result<()> {
        fill_slice(out, encoded)
    }

    fn decoded_len<T: Element>(&self, encoded: &[u8]) -> Option<usize> {
        let size = T::ELEMENT_TYPE.size();
        (encoded.len() % size == 0).then_some(encoded.len() / size)
    }

    fn supports_append(&self) -> bool {
        true
    }

    fn append_data<T: Element>(
        &self,
        encoded: &mut Vec<u8>,
        _tail: Option<T>,
        data: &[T],
    ) -> Result<()> {
        for &x in data {
            x.write_le(encoded);
        }
        Ok(())
    }

    fn decode_element<T: Element>(&self, encoded: &[u8], len: usize, index: usize) -> Result<T> {
        if index >= len {
            return Err(CodecError::IndexOutOfBounds { index, len });
        }
        let size = T::ELEMENT_TYPE.size();
        let bytes = encoded
            .get(index * size..(index + 1) * size)
            .ok_or(CodecError::ShapeMismatch {
                expected: len,
                actual: encoded.len() / size,
            })?;
        Ok(T::read_le(bytes))
    }
}

/// Turns little-endian element bytes into `decoded` according to `policy`.
///
/// Shared by every codec that compresses the plain byte layout.
pub(crate) fn fill_decoded<T: Element>(
    decoded: &mut Vec<T>,
    raw: &[u8],
    policy: DecodePolicy,
) -> Result<()> {
    match policy {
        DecodePolicy::Resize => *decoded = from_le_bytes::<T>(raw)?,
        DecodePolicy::Presized => fill_slice(decoded, raw)?,
    }
    Ok(())
}

/// Reads exactly `out.len()` little-endian elements from `raw` into `out`.
pub(crate) fn fill_slice<T: Element>(out: &mut [T], raw: &[u8]) -> Result<()> {
    let size = T::ELEMENT_TYPE.size();
    if raw.len() % size != 0 {
        return Err(DecodeError::TrailingBytes {
            count: raw.len() % size,
        }
        .into());
    }
    if raw.len() / size != out.len() {
        return Err(CodecError::ShapeMismatch {
            expected: out.len(),
            actual: raw.len() / size,
        });
    }
    for (slot, chunk) in out.iter_mut().zip(raw.chunks_exact(size)) {
        *slot = T::read_le(chunk);
    }
    Ok(())
}

/// Little-endian bytes of `data`, the input every compressing codec starts from.
pub(crate) fn plain_bytes<T: Element>(data: &[T]) -> Vec<u8> {
    to_le_bytes(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_little_endian() {
        let enc = PlainArrayCodec.encode(&[1i16, -2]).unwrap();
        assert_eq!(enc.code_units(), &[1, 0, 0xfe, 0xff]);
        assert_eq!(enc.get(1).unwrap(), -2);
    }

    #[test]
    fn test_append_and_infer_length() {
        let mut enc = PlainArrayCodec.encode(&[7u32]).unwrap();
        enc.append(&[8, 9]).unwrap();
        assert_eq!(PlainArrayCodec.decoded_len::<u32>(enc.code_units()), Some(3));
        assert_eq!(enc.to_vec().unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn test_decode_presized_in_place() {
        let bytes = plain_bytes(&[-5i32, 6]);
        let mut out = [0i32; 2];
        PlainArrayCodec.decode_presized(&mut out, &bytes).unwrap();
        assert_eq!(out, [-5, 6]);
        assert!(matches!(
            PlainArrayCodec.decode_presized(&mut out, &bytes[..7]),
            Err(CodecError::Decode(DecodeError::TrailingBytes { count: 3 }))
        ));
    }

    #[test]
    fn test_presized_mismatch() {
        let bytes = plain_bytes(&[1u8, 2, 3]);
        let mut out = vec![0u8; 2];
        assert!(matches!(
            PlainArrayCodec.decode_data(&mut out, &bytes, DecodePolicy::Presized),
            Err(CodecError::ShapeMismatch { expected: 2, actual: 3 })
        ));
        PlainArrayCodec
            .decode_data(&mut out, &bytes, DecodePolicy::Resize)
            .unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }
}
