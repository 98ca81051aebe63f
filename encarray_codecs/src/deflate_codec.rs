use std::io::{Read, Write};

use encarray_core::format::CODEC_DEFLATE;
use encarray_core::{ArrayCodec, CodecError, DecodeError, DecodePolicy, Element, Result};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::plain::{fill_decoded, fill_slice, plain_bytes};

/// Raw deflate stream over the plain little-endian element layout.
///
/// Best for: interchange with tools that only speak zlib-family formats.
#[derive(Debug, Clone, Copy)]
pub struct DeflateArrayCodec {
    /// Compression level (0 = store, 9 = smallest).
    pub level: u32,
}

impl Default for DeflateArrayCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

// Same as zstd: the level only matters when encoding.
impl PartialEq for DeflateArrayCodec {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for DeflateArrayCodec {}

impl DeflateArrayCodec {
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }

    fn decompress(encoded: &[u8]) -> Result<Vec<u8>> {
        let mut raw = Vec::new();
        if encoded.is_empty() {
            return Ok(raw);
        }
        DeflateDecoder::new(encoded)
            .read_to_end(&mut raw)
            .map_err(|e| DecodeError::Malformed(format!("deflate: {e}")))?;
        Ok(raw)
    }
}

impl ArrayCodec for DeflateArrayCodec {
    fn id(&self) -> u16 {
        CODEC_DEFLATE
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    fn encode_data<T: Element>(&self, encoded: &mut Vec<u8>, data: &[T]) -> Result<()> {
        let to_encode_error = |e: std::io::Error| CodecError::Encode(format!("deflate: {e}"));
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(&plain_bytes(data)).map_err(to_encode_error)?;
        *encoded = encoder.finish().map_err(to_encode_error)?;
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
        let raw = Self::decompress(encoded).ok()?;
        let size = T::ELEMENT_TYPE.size();
        (raw.len() % size == 0).then_some(raw.len() / size)
    }
}
