use std::fmt;

use crate::array::RawArray;
use crate::element::Element;
use crate::encoded::EncodedArray;
use crate::error::{CodecError, Result};

/// How [`ArrayCodec::decode_data`] treats the destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// `decoded.len()` is the expected element count. A stream holding a
    /// different number of elements is a [`CodecError::ShapeMismatch`].
    Presized,
    /// `decoded` is cleared and filled with every encoded element. Only
    /// codecs that can tell where their data ends support this.
    Resize,
}

/// Core array codec abstraction.
///
/// A codec is a plain value describing an encoding strategy; all of its state
/// is parameters, so equal codecs always decode each other's output.
/// Implementations only need [`encode_data`] and [`decode_data`]; the rest of
/// the encoded-array API is generic over them.
///
/// Decoding a whole buffer must run in time linear in the number of encoded
/// bytes. Single-element access may be as slow as decoding everything before
/// the element.
///
/// [`encode_data`]: ArrayCodec::encode_data
/// [`decode_data`]: ArrayCodec::decode_data
pub trait ArrayCodec: Clone + PartialEq + fmt::Debug {
    /// Stable codec ID stored in container headers.
    fn id(&self) -> u16;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Replaces the contents of `encoded` with the encoding of `data`.
    ///
    /// Same codec and same data always give the same bytes.
    fn encode_data<T: Element>(&self, encoded: &mut Vec<u8>, data: &[T]) -> Result<()>;

    /// Reconstructs the elements held in `encoded` into `decoded`.
    fn decode_data<T: Element>(
        &self,
        decoded: &mut Vec<T>,
        encoded: &[u8],
        policy: DecodePolicy,
    ) -> Result<()>;

    /// Number of elements in `encoded`, for codecs whose stream is
    /// self-describing. `None` when it cannot be told from the bytes alone.
    fn decoded_len<T: Element>(&self, _encoded: &[u8]) -> Option<usize> {
        None
    }

    /// Upper bound on the number of elements `encoded` can hold.
    ///
    /// Checked before a buffer of a claimed length is allocated, so an
    /// untrusted length cannot force a huge allocation. Defaults to
    /// [`decoded_len`](ArrayCodec::decoded_len).
    fn max_decoded_len<T: Element>(&self, encoded: &[u8]) -> Option<usize> {
        self.decoded_len::<T>(encoded)
    }

    /// Decodes exactly `out.len()` elements straight into `out`.
    ///
    /// The default goes through a temporary buffer; bundled codecs write in
    /// place.
    fn decode_presized<T: Element>(&self, out: &mut [T], encoded: &[u8]) -> Result<()> {
        let mut decoded = out.to_vec();
        self.decode_data(&mut decoded, encoded, DecodePolicy::Presized)?;
        out.copy_from_slice(&decoded);
        Ok(())
    }

    fn supports_append(&self) -> bool {
        false
    }

    /// Encodes `data` after existing content whose last element is `tail`.
    ///
    /// Only called when [`supports_append`](ArrayCodec::supports_append)
    /// returns true. On error the caller restores `encoded` to its old length.
    fn append_data<T: Element>(
        &self,
        _encoded: &mut Vec<u8>,
        _tail: Option<T>,
        _data: &[T],
    ) -> Result<()> {
        Err(CodecError::AppendUnsupported { codec: self.name() })
    }

    /// Element `index` of an encoding holding `len` elements.
    ///
    /// The default decodes the whole buffer; sequential codecs stop early.
    fn decode_element<T: Element>(&self, encoded: &[u8], len: usize, index: usize) -> Result<T> {
        if index >= len {
            return Err(CodecError::IndexOutOfBounds { index, len });
        }
        let mut decoded = vec![T::default(); len];
        self.decode_data(&mut decoded, encoded, DecodePolicy::Presized)?;
        Ok(decoded[index])
    }

    /// Encodes `data` into a ready-to-use one-dimensional [`EncodedArray`].
    fn encode<T: Element>(&self, data: &[T]) -> Result<EncodedArray<T, Self>> {
        EncodedArray::from_slice(self.clone(), data)
    }

    /// Encodes a shaped array into an [`EncodedArray`] of the same shape.
    fn encode_array<T: Element>(&self, array: &RawArray<T>) -> Result<EncodedArray<T, Self>> {
        EncodedArray::encode(self.clone(), array)
    }
}
