//! L0 packet encoding/decoding benchmarks.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use teonet_l0::{byte_checksum, Decoder, Packet, CMD_ECHO};

const SIZES: [usize; 3] = [16, 256, 2000];

fn echo_packet(size: usize) -> Packet {
    Packet::text(CMD_ECHO, "ps-server", "x".repeat(size).as_bytes())
}

fn bench_packet_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_encode");

    for size in SIZES {
        let packet = echo_packet(size);

        group.throughput(Throughput::Bytes(packet.encoded_len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &packet, |b, packet| {
            b.iter(|| black_box(packet.encode().unwrap()));
        });
    }

    group.finish();
}

fn bench_packet_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_decode");

    for size in SIZES {
        let encoded = echo_packet(size).encode().unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let mut buf = encoded.clone();
                black_box(Packet::decode(&mut buf).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_packet_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_parse");

    for size in SIZES {
        let encoded = echo_packet(size).encode().unwrap().freeze();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| black_box(Packet::parse(encoded).unwrap()));
        });
    }

    group.finish();
}

fn bench_stream_decoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_decoder");

    // Many small packets arriving in one read
    for count in [10, 100] {
        let mut stream = Vec::new();
        for i in 0..count {
            let packet = Packet::new(CMD_ECHO, "peer", Bytes::from(format!("message {}\0", i)));
            stream.extend_from_slice(&packet.encode().unwrap());
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &stream, |b, stream| {
            b.iter(|| {
                let mut decoder = Decoder::new();
                decoder.extend(stream);
                let mut decoded = 0;
                while let Some(packet) = decoder.decode_packet().unwrap() {
                    black_box(packet);
                    decoded += 1;
                }
                decoded
            });
        });
    }

    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_checksum");

    for size in [8, 256, 2048] {
        let data = vec![0x42u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(byte_checksum(data)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_packet_encode,
    bench_packet_decode,
    bench_packet_parse,
    bench_stream_decoder,
    bench_checksum,
);

criterion_main!(benches);
