//! Property-based tests for the varlen / zig-zag / diff wire format.

use encarray_core::{
    read_varlen, unzigzag, write_varlen, zigzag, ArrayCodec, ByteReader, DecodePolicy,
    EncodedArray, VarlenDiffArrayCodec,
};
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 512;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn varlen_round_trip_u64(v in any::<u64>()) {
        let mut buf = Vec::new();
        write_varlen(&mut buf, v);
        let mut reader = ByteReader::new(&buf);
        prop_assert_eq!(read_varlen::<u64>(&mut reader).unwrap(), v);
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn varlen_round_trip_u128(v in any::<u128>()) {
        let mut buf = Vec::new();
        write_varlen(&mut buf, v);
        prop_assert_eq!(read_varlen::<u128>(&mut ByteReader::new(&buf)).unwrap(), v);
    }

    #[test]
    fn varlen_is_minimal(v in any::<u64>()) {
        let mut buf = Vec::new();
        write_varlen(&mut buf, v);
        let bits = 64 - v.leading_zeros() as usize;
        prop_assert_eq!(buf.len(), bits.div_ceil(7).max(1));
        // the final byte carries data unless the value is zero
        prop_assert!(v == 0 || *buf.last().unwrap() != 0);
    }

    #[test]
    fn varlen_rejects_values_wider_than_target(v in 256u32..) {
        let mut buf = Vec::new();
        write_varlen(&mut buf, v);
        prop_assert!(read_varlen::<u8>(&mut ByteReader::new(&buf)).is_err());
    }

    #[test]
    fn zigzag_round_trip_i64(n in any::<i64>()) {
        prop_assert_eq!(unzigzag::<i64>(zigzag(n)), n);
    }

    #[test]
    fn zigzag_round_trip_i128(n in any::<i128>()) {
        prop_assert_eq!(unzigzag::<i128>(zigzag(n)), n);
    }

    #[test]
    fn zigzag_keeps_small_magnitudes_small(n in -64i32..64) {
        prop_assert!(zigzag(n) < 128);
    }

    #[test]
    fn diff_round_trip_i64(data in prop::collection::vec(any::<i64>(), 0..200)) {
        let enc = VarlenDiffArrayCodec.encode(&data).unwrap();
        prop_assert_eq!(enc.to_vec().unwrap(), data);
    }

    #[test]
    fn diff_round_trip_u8(data in prop::collection::vec(any::<u8>(), 0..200)) {
        let enc = VarlenDiffArrayCodec.encode(&data).unwrap();
        let mut out: Vec<u8> = Vec::new();
        VarlenDiffArrayCodec
            .decode_data(&mut out, enc.code_units(), DecodePolicy::Resize)
            .unwrap();
        prop_assert_eq!(out, data);
    }

    #[test]
    fn diff_round_trip_u64(data in prop::collection::vec(any::<u64>(), 0..200)) {
        let enc = VarlenDiffArrayCodec.encode(&data).unwrap();
        prop_assert_eq!(enc.to_vec().unwrap(), data);
    }

    #[test]
    fn diff_append_matches_one_shot(
        data in prop::collection::vec(any::<i32>(), 0..100),
        split in 0usize..100,
    ) {
        let split = split.min(data.len());
        let mut enc = EncodedArray::new(VarlenDiffArrayCodec);
        enc.append(&data[..split]).unwrap();
        enc.append(&data[split..]).unwrap();
        prop_assert_eq!(enc, VarlenDiffArrayCodec.encode(&data).unwrap());
    }

    #[test]
    fn diff_decoding_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut out = Vec::new();
        let _ = VarlenDiffArrayCodec.decode_data::<i16>(&mut out, &bytes, DecodePolicy::Resize);
        let _ = EncodedArray::<u32, _>::from_encoded(VarlenDiffArrayCodec, bytes);
    }
}
