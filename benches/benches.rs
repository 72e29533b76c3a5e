use rand::Rng;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use guppi::unpack::unpack;
use guppi::Reader;

const BLOCK_SIZE: usize = 1 << 20;

fn random_block() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..BLOCK_SIZE).map(|_| rng.gen::<u8>()).collect()
}

fn bench_unpack(c: &mut Criterion) {
    let block = random_block();
    let mut group = c.benchmark_group("unpack");
    group.throughput(Throughput::Bytes(BLOCK_SIZE as u64));
    group.bench_function("4bit_dual", |b| {
        b.iter(|| unpack(&block, 4, 2).unwrap());
    });
    group.bench_function("8bit_single", |b| {
        b.iter(|| unpack(&block, 8, 1).unwrap());
    });
    group.finish();
}

fn bench_next_frame(c: &mut Criterion) {
    let mut dat = Vec::new();
    for card in [
        "PKTFMT  = 'VDIF    '".to_string(),
        "OBSBW   = 64.0".to_string(),
        "OBSFREQ = 3000.0".to_string(),
        "STT_IMJD= 57388".to_string(),
        "STT_SMJD= 0".to_string(),
        "STT_OFFS= 0".to_string(),
        format!("BLOCSIZE= {BLOCK_SIZE}"),
        "NBITS   = 4".to_string(),
        "END".to_string(),
    ] {
        dat.extend(format!("{card:<80}").bytes());
    }
    for _ in 0..4 {
        dat.extend(random_block());
    }

    let mut group = c.benchmark_group("reader");
    group.throughput(Throughput::Bytes(4 * BLOCK_SIZE as u64));
    group.bench_function("frames", move |b| {
        b.iter(|| {
            let mut reader = Reader::new(Cursor::new(&dat), "bench_BD-4.raw");
            reader.frames().map(Result::unwrap).count()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_unpack, bench_next_frame);
criterion_main!(benches);
