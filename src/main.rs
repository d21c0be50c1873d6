//! Twoway - codec micro benchmark
//!
//! Mengukur latency encode/decode dan konversi timestamp di hot path.
//! Untuk reflector/probe, lihat src/bin/.

use std::hint::black_box;
use std::time::Instant;

use twoway::protocol::{
    decode_control, decode_twoway, encode_control, encode_twoway_best_effort, from_fixed_point,
    to_fixed_point, ControlHeader, Timeval, TwowayHeader,
};

fn main() {
    println!("🚀 Twoway Codec - micro benchmark");
    println!("=================================\n");

    benchmark_twoway();
    benchmark_control();
    benchmark_timestamp();

    println!("\n✅ All benchmarks complete!");
    println!("\nTo start reflector: cargo run --release --bin twoway_reflector -- --port 7878");
}

fn report(label: &str, iterations: usize, elapsed_ns: f64) {
    let per_op = elapsed_ns / iterations as f64;
    println!(
        "  {:<16} {:.2} ns/op ({:.2} M ops/sec)",
        label,
        per_op,
        1_000.0 / per_op
    );
}

fn benchmark_twoway() {
    println!("📊 Twoway Header (60 bytes + payload)");
    println!("-------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    let mut buf = vec![0u8; 128];
    let header = TwowayHeader::request(1, Timeval::now());

    let start = Instant::now();
    for i in 0..ITERATIONS {
        let mut h = header;
        h.seq0 = i as u32;
        let _ = black_box(encode_twoway_best_effort(&h, Some("<tcyc>42</tcyc>"), &mut buf));
    }
    report("Encode:", ITERATIONS, start.elapsed().as_nanos() as f64);

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let _ = black_box(decode_twoway(black_box(&buf)));
    }
    report("Decode:", ITERATIONS, start.elapsed().as_nanos() as f64);
    println!();
}

fn benchmark_control() {
    println!("📊 Control Header (8 bytes + XML)");
    println!("---------------------------------");

    const ITERATIONS: usize = 1_000_000;
    let mut buf = vec![0u8; 256];
    let header = ControlHeader::new(0x1234ABCD);
    let xml = "<config><plugin>cycles</plugin></config>";

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let _ = black_box(encode_control(&header, Some(xml), &mut buf));
    }
    report("Encode:", ITERATIONS, start.elapsed().as_nanos() as f64);

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let _ = black_box(decode_control(black_box(&buf)));
    }
    report("Decode:", ITERATIONS, start.elapsed().as_nanos() as f64);
    println!();
}

fn benchmark_timestamp() {
    println!("📊 Fixed-Point Timestamp");
    println!("------------------------");

    const ITERATIONS: usize = 10_000_000;
    let now = Timeval::now();

    let start = Instant::now();
    let mut acc = 0u64;
    for i in 0..ITERATIONS {
        acc ^= to_fixed_point(now.sec, (i % 1_000_000) as u32);
    }
    black_box(acc);
    report("to_fixed:", ITERATIONS, start.elapsed().as_nanos() as f64);

    let start = Instant::now();
    for i in 0..ITERATIONS {
        black_box(from_fixed_point(acc.wrapping_add(i as u64)));
    }
    report("from_fixed:", ITERATIONS, start.elapsed().as_nanos() as f64);
}
