use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use opentoken::{AttributeMap, CipherSuite, OpenToken};

// Helper function to create attributes of a given count
fn create_attributes(count: usize) -> AttributeMap {
    (0..count)
        .map(|i| (format!("attribute-{i}"), format!("value-{i}-{}", "x".repeat(32))))
        .collect()
}

fn create_context(cipher: CipherSuite) -> OpenToken {
    OpenToken::builder("Password1")
        .cipher(cipher)
        .build()
        .expect("Failed to build context")
}

// Benchmark: encode per cipher suite
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let attributes = create_attributes(10);

    for cipher in CipherSuite::ALL {
        let ctx = create_context(cipher);
        group.bench_with_input(BenchmarkId::from_parameter(cipher), &cipher, |b, _| {
            b.iter(|| ctx.encode(black_box(&attributes)).expect("Failed to encode"));
        });
    }

    group.finish();
}

// Benchmark: decode per cipher suite
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let attributes = create_attributes(10);

    for cipher in CipherSuite::ALL {
        let ctx = create_context(cipher);
        let text = ctx.encode(&attributes).expect("Failed to encode");
        let now = Utc::now();
        group.bench_with_input(BenchmarkId::from_parameter(cipher), &cipher, |b, _| {
            b.iter(|| {
                ctx.decode_at(black_box(&text), now)
                    .expect("Failed to decode")
            });
        });
    }

    group.finish();
}

// Benchmark: payload size scaling
fn bench_payload_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip_by_attribute_count");
    let ctx = create_context(CipherSuite::Aes128Cbc);
    let now = Utc::now();

    for count in [1, 10, 100].iter() {
        let attributes = create_attributes(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let text = ctx.encode(black_box(&attributes)).expect("Failed to encode");
                ctx.decode_at(&text, now).expect("Failed to decode")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_payload_size);
criterion_main!(benches);
