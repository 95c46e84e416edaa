use criterion::{black_box, criterion_group, criterion_main, Criterion};
use etherparse::PacketBuilder;
use sniffq::{Packet, ProtocolTally};

fn udp_frame() -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 10], [2, 0, 0, 0, 0, 5])
        .ipv4([192, 168, 1, 10], [192, 168, 1, 5], 64)
        .udp(5353, 53);
    let payload = [0u8; 512];
    let mut out = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut out, &payload).unwrap();
    out
}

fn bench_decode(c: &mut Criterion) {
    let frame = udp_frame();
    c.bench_function("decode udp frame", |b| {
        b.iter(|| Packet::decode(black_box(frame.clone())))
    });
}

fn bench_tally(c: &mut Criterion) {
    let packet = Packet::decode(udp_frame());
    let tally = ProtocolTally::new();
    c.bench_function("tally udp frame", |b| b.iter(|| tally.track(black_box(&packet))));
}

criterion_group!(benches, bench_decode, bench_tally);
criterion_main!(benches);
