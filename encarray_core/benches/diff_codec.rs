use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use encarray_core::{ArrayCodec, VarlenDiffArrayCodec};

/// Slowly drifting samples, the kind of data the diff codec is meant for.
fn sensor_samples(len: usize) -> Vec<i32> {
    let mut rng = 0x2545_F491_4F6C_DD1Du64;
    let mut value = 20_000i32;
    (0..len)
        .map(|_| {
            rng ^= rng << 13;
            rng ^= rng >> 7;
            rng ^= rng << 17;
            value += (rng % 33) as i32 - 16;
            value
        })
        .collect()
}

fn bench_diff_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("varlen_diff");
    for len in [1_000usize, 100_000] {
        let data = sensor_samples(len);
        let enc = VarlenDiffArrayCodec.encode(&data).unwrap();
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("encode", len), &data, |b, data| {
            let mut buf = Vec::new();
            b.iter(|| VarlenDiffArrayCodec.encode_data(&mut buf, black_box(data)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decode_all", len), &enc, |b, enc| {
            b.iter(|| black_box(enc.to_vec().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("get_last", len), &enc, |b, enc| {
            b.iter(|| black_box(enc.get(len - 1).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_diff_codec);
criterion_main!(benches);
