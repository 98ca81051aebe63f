use encarray_core::format::CODEC_ZSTD;
use encarray_core::{ArrayCodec, CodecError, DecodeError, DecodePolicy, Element, Result};
use log::debug;

use crate::plain::{fill_decoded, fill_slice, plain_bytes};

/// Zstandard over the plain little-endian element layout.
///
/// The whole array is one zstd frame, so appending would mean recompressing
/// everything; the codec does not support it.
///
/// Best for: large arrays with repeated values or byte patterns.
#[derive(Debug, Clone, Copy)]
pub struct ZstdArrayCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdArrayCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

// The level is not stored in containers and any level decodes any frame.
impl PartialEq for ZstdArrayCodec {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ZstdArrayCodec {}

impl ZstdArrayCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    fn decompress(encoded: &[u8]) -> Result<Vec<u8>> {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        zstd::decode_all(encoded)
            .map_err(|e| DecodeError::Malformed(format!("zstd: {e}")).into())
    }
}

impl ArrayCodec for ZstdArrayCodec {
    fn id(&self) -> u16 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn encode_data<T: Element>(&self, encoded: &mut Vec<u8>, data: &[T]) -> Result<()> {
        let raw = plain_bytes(data);
        *encoded = zstd::bulk::compress(&raw, self.level)
            .map_err(|e| CodecError::Encode(format!("zstd level {}: {e}", self.level)))?;
        debug!("zstd: {} raw bytes -> {} bytes", raw.len(), encoded.len());
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
