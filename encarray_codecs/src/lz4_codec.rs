use encarray_core::format::CODEC_LZ4;
use encarray_core::{ArrayCodec, DecodeError, DecodePolicy, Element, Result};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::plain::{fill_decoded, fill_slice, plain_bytes};

/// LZ4 block over the plain little-endian element layout.
///
/// Fastest decompression of the compressing codecs. The block carries its
/// uncompressed size in a 4-byte prefix, so the element count is known
/// without decompressing.
///
/// Best for: hot data where decode speed matters more than size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lz4ArrayCodec;

impl Lz4ArrayCodec {
    fn decompress(encoded: &[u8]) -> Result<Vec<u8>> {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        decompress_size_prepended(encoded)
            .map_err(|e| DecodeError::Malformed(format!("lz4: {e}")).into())
    }
}

impl ArrayCodec for Lz4ArrayCodec {
    fn id(&self) -> u16 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn encode_data<T: Element>(&self, encoded: &mut Vec<u8>, data: &[T]) -> Result<()> {
        *encoded = compress_prepend_size(&plain_bytes(data));
        Ok(())
    }

    fn decode_data<T: Element>(
        &self,
        decoded: &mut Vec<T>,
        encoded: &[u8],
        policy: DecodePolicy,
    ) -> Result<()> {
        fill_decoded(decoded, &Self::decompress(encoded)?, policy)
    }

    fn decode_presized<T: Element>(&self, out: &mut [T], encoded: &[u8]) -> Result<()> {
        fill_slice(out, &Self::decompress(encoded)?)
    }

    fn decoded_len<T: Element>(&self, encoded: &[u8]) -> Option<usize> {
        if encoded.is_empty() {
            return Some(0);
        }
        let prefix: [u8; 4] = encoded.get(..4)?.try_into().ok()?;
        let raw_len = u32::from_le_bytes(prefix) as usize;
        let size = T::ELEMENT_TYPE.size();
        (raw_len % size == 0).then_some(raw_len / size)
    }
}
