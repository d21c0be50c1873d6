//! Criterion benchmark untuk twoway/control codec
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use twoway::protocol::{
    decode_control, decode_twoway, encode_control, encode_twoway_best_effort, from_fixed_point,
    to_fixed_point, ControlHeader, Timeval, TwowayHeader,
};

fn bench_twoway(c: &mut Criterion) {
    let mut group = c.benchmark_group("twoway");
    group.throughput(Throughput::Elements(1));

    let header = TwowayHeader::request(1, Timeval::new(1_700_000_000, 500_000));

    group.bench_function("encode_60", |b| {
        let mut buf = [0u8; 60];
        b.iter(|| encode_twoway_best_effort(black_box(&header), None, &mut buf));
    });

    group.bench_function("encode_payload", |b| {
        let mut buf = [0u8; 256];
        b.iter(|| {
            encode_twoway_best_effort(black_box(&header), Some("<tcyc>1234</tcyc>"), &mut buf)
        });
    });

    let mut encoded = [0u8; 256];
    encode_twoway_best_effort(&header, Some("<tcyc>1234</tcyc>"), &mut encoded).ok();
    group.bench_function("decode_payload", |b| {
        b.iter(|| decode_twoway(black_box(&encoded)).map(|f| f.consumed));
    });

    group.finish();
}

fn bench_control(c: &mut Criterion) {
    let mut group = c.benchmark_group("control");
    let header = ControlHeader::new(0x1234ABCD);
    let xml = "<config><plugin>cycles</plugin><size>128</size></config>";

    group.bench_function("encode", |b| {
        let mut buf = [0u8; 128];
        b.iter(|| encode_control(black_box(&header), Some(xml), &mut buf));
    });

    let mut encoded = [0u8; 128];
    let n = encode_control(&header, Some(xml), &mut encoded).unwrap_or(8);
    group.bench_function("decode", |b| {
        b.iter(|| decode_control(black_box(&encoded[..n])).map(|f| f.consumed));
    });

    group.finish();
}

fn bench_timestamp(c: &mut Criterion) {
    let mut group = c.benchmark_group("timestamp");

    group.bench_function("to_fixed_point", |b| {
        let mut usec = 0u32;
        b.iter(|| {
            usec = (usec + 1) % 1_000_000;
            to_fixed_point(black_box(1_700_000_000), black_box(usec))
        });
    });

    group.bench_function("from_fixed_point", |b| {
        let mut v = 0x6553_F100_8000_0000u64;
        b.iter(|| {
            v = v.wrapping_add(4295);
            from_fixed_point(black_box(v))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_twoway, bench_control, bench_timestamp);
criterion_main!(benches);
