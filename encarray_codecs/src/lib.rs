mod deflate_codec;
mod lz4_codec;
mod plain;
mod zstd_codec;

pub use deflate_codec::DeflateArrayCodec;
pub use lz4_codec::Lz4ArrayCodec;
pub use plain::PlainArrayCodec;
pub use zstd_codec::ZstdArrayCodec;

use encarray_core::format::{CODEC_DEFLATE, CODEC_LZ4, CODEC_PLAIN, CODEC_VARLEN_DIFF, CODEC_ZSTD};
use encarray_core::{ArrayCodec, CodecError, DecodePolicy, Element, Result, VarlenDiffArrayCodec};

/// Any bundled codec, chosen at runtime.
///
/// `ArrayCodec` is generic over the element type, so it cannot be a trait
/// object; this enum is what the CLI and container readers hold instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyCodec {
    Plain(PlainArrayCodec),
    VarlenDiff(VarlenDiffArrayCodec),
    Zstd(ZstdArrayCodec),
    Lz4(Lz4ArrayCodec),
    Deflate(DeflateArrayCodec),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            AnyCodec::Plain($c) => $body,
            AnyCodec::VarlenDiff($c) => $body,
            AnyCodec::Zstd($c) => $body,
            AnyCodec::Lz4($c) => $body,
            AnyCodec::Deflate($c) => $body,
        }
    };
}

impl ArrayCodec for AnyCodec {
    fn id(&self) -> u16 {
        dispatch!(self, c => c.id())
    }

    fn name(&self) -> &'static str {
        dispatch!(self, c => c.name())
    }

    fn encode_data<T: Element>(&self, encoded: &mut Vec<u8>, data: &[T]) -> Result<()> {
        dispatch!(self, c => c.encode_data(encoded, data))
    }

    fn decode_data<T: Element>(
        &self,
        decoded: &mut Vec<T>,
        encoded: &[u8],
        policy: DecodePolicy,
    ) -> Result<()> {
        dispatch!(self, c => c.decode_data(decoded, encoded, policy))
    }

    fn decoded_len<T: Element>(&self, encoded: &[u8]) -> Option<usize> {
        dispatch!(self, c => c.decoded_len::<T>(encoded))
    }

    fn max_decoded_len<T: Element>(&self, encoded: &[u8]) -> Option<usize> {
        dispatch!(self, c => c.max_decoded_len::<T>(encoded))
    }

    fn decode_presized<T: Element>(&self, out: &mut [T], encoded: &[u8]) -> Result<()> {
        dispatch!(self, c => c.decode_presized(out, encoded))
    }

    fn supports_append(&self) -> bool {
        dispatch!(self, c => c.supports_append())
    }

    fn append_data<T: Element>(
        &self,
        encoded: &mut Vec<u8>,
        tail: Option<T>,
        data: &[T],
    ) -> Result<()> {
        dispatch!(self, c => c.append_data(encoded, tail, data))
    }

    fn decode_element<T: Element>(&self, encoded: &[u8], len: usize, index: usize) -> Result<T> {
        dispatch!(self, c => c.decode_element(encoded, len, index))
    }
}

impl Default for AnyCodec {
    fn default() -> Self {
        AnyCodec::VarlenDiff(VarlenDiffArrayCodec)
    }
}

/// Resolve a codec from its on-disk `codec_id`.
///
/// Parameterised codecs come back with their default level; the level only
/// affects encoding, so any level decodes any stream.
pub fn codec_by_id(id: u16) -> Result<AnyCodec> {
    match id {
        CODEC_PLAIN => Ok(AnyCodec::Plain(PlainArrayCodec)),
        CODEC_VARLEN_DIFF => Ok(AnyCodec::VarlenDiff(VarlenDiffArrayCodec)),
        CODEC_ZSTD => Ok(AnyCodec::Zstd(ZstdArrayCodec::default())),
        CODEC_LZ4 => Ok(AnyCodec::Lz4(Lz4ArrayCodec)),
        CODEC_DEFLATE => Ok(AnyCodec::Deflate(DeflateArrayCodec::default())),
        _ => Err(CodecError::Format(format!(
            "unknown codec id {id}; supported: 0 (plain), 1 (varlen-diff), 2 (zstd), 3 (lz4), 4 (deflate)"
        ))),
    }
}

/// Every bundled codec with default parameters, in codec-ID order.
pub fn bundled_codecs() -> [AnyCodec; 5] {
    [
        AnyCodec::Plain(PlainArrayCodec),
        AnyCodec::VarlenDiff(VarlenDiffArrayCodec),
        AnyCodec::Zstd(ZstdArrayCodec::default()),
        AnyCodec::Lz4(Lz4ArrayCodec),
        AnyCodec::Deflate(DeflateArrayCodec::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use encarray_core::{EncodedArray, RawArray, Shape};

    fn sample() -> Vec<i64> {
        (0..500i64).map(|i| 1_000_000 + (i % 17) * 3 - i / 5).collect()
    }

    #[test]
    fn test_all_codecs_round_trip() {
        let data = sample();
        for codec in bundled_codecs() {
            let enc = codec.encode(&data).unwrap();
            assert_eq!(enc.to_vec().unwrap(), data, "codec {}", codec.name());
            assert_eq!(enc.get(123).unwrap(), data[123], "codec {}", codec.name());
        }
    }

    #[test]
    fn test_empty_round_trip() {
        for codec in bundled_codecs() {
            let enc = codec.encode::<u16>(&[]).unwrap();
            assert!(enc.to_vec().unwrap().is_empty(), "codec {}", codec.name());
        }
    }

    #[test]
    fn test_codec_by_id_matches_ids() {
        for codec in bundled_codecs() {
            assert_eq!(codec_by_id(codec.id()).unwrap(), codec);
        }
        assert!(matches!(codec_by_id(99), Err(CodecError::Format(_))));
    }

    #[test]
    fn test_append_support() {
        let appendable: Vec<&str> = bundled_codecs()
            .iter()
            .filter(|c| c.supports_append())
            .map(|c| c.name())
            .collect();
        assert_eq!(appendable, vec!["plain", "varlen-diff"]);

        let mut enc = ZstdArrayCodec::default().encode(&[1u8, 2]).unwrap();
        assert!(matches!(
            enc.append(&[3]),
            Err(CodecError::AppendUnsupported { codec: "zstd" })
        ));
        assert_eq!(enc.to_vec().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_shaped_from_encoded_infers_length() {
        let raw = RawArray::new(Shape::new(vec![2, 3]).unwrap(), vec![1u32, 2, 3, 4, 5, 6]).unwrap();
        for codec in bundled_codecs() {
            let enc = codec.encode_array(&raw).unwrap();
            let (codec, _shape, bytes) = enc.into_parts();
            let back = EncodedArray::<u32, _>::from_encoded(codec, bytes).unwrap();
            assert_eq!(back.len(), 6, "codec {}", codec.name());
        }
    }

    #[test]
    fn test_compression_level_does_not_change_identity() {
        assert_eq!(ZstdArrayCodec::new(19), ZstdArrayCodec::default());
        assert_eq!(DeflateArrayCodec::new(1), DeflateArrayCodec::default());
        assert_ne!(
            AnyCodec::Zstd(ZstdArrayCodec::new(19)),
            AnyCodec::Deflate(DeflateArrayCodec::new(19))
        );

        let data: Vec<i32> = (0..300).map(|i| i % 7).collect();
        let strong = AnyCodec::Zstd(ZstdArrayCodec::new(19)).encode(&data).unwrap();
        let (_, shape, bytes) = strong.clone().into_parts();
        let back = EncodedArray::<i32, _>::from_parts(codec_by_id(CODEC_ZSTD).unwrap(), shape, bytes)
            .unwrap();
        assert_eq!(back, strong);
    }

    #[test]
    fn test_decode_into_every_codec() {
        let data = sample();
        for codec in bundled_codecs() {
            let enc = codec.encode(&data).unwrap();
            let mut out = vec![0i64; data.len()];
            enc.decode_into(&mut out).unwrap();
            assert_eq!(out, data, "codec {}", codec.name());
        }
    }

    #[test]
    fn test_zstd_shrinks_repetitive_data() {
        let data = vec![42u64; 4096];
        let enc = AnyCodec::Zstd(ZstdArrayCodec::new(19)).encode(&data).unwrap();
        assert!(enc.encoded_size() < data.len());
    }

    #[test]
    fn test_corrupt_compressed_stream_is_malformed() {
        let garbage = [0xffu8; 16];
        for codec in [
            AnyCodec::Zstd(ZstdArrayCodec::default()),
            AnyCodec::Deflate(DeflateArrayCodec::default()),
        ] {
            let mut out = Vec::<u32>::new();
            assert!(
                codec.decode_data(&mut out, &garbage, DecodePolicy::Resize).is_err(),
                "codec {}",
                codec.name()
            );
        }
    }
}
