use std::fmt::Write;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use halite_core::Spectator;

const TURNS: usize = 50;

fn recorded_stream(size: usize, ships_per_player: usize) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"{{"DEFAULT_MAP_WIDTH":{size},"DEFAULT_MAP_HEIGHT":{size},"MAX_TURNS":{TURNS},"game_seed":1}} "#
    );
    out.push_str("2 0\n0 1 1\n1 3 3\n");
    let _ = writeln!(out, "{size} {size}");
    for cell in 0..size * size {
        let _ = write!(out, "{} ", cell % 1000);
    }
    out.push('\n');

    for turn in 1..=TURNS {
        let _ = write!(out, "{turn}");
        for player in 0..2 {
            let _ = write!(out, " {player} {ships_per_player} 0 5000");
            for ship in 0..ships_per_player {
                let id = player * ships_per_player + ship;
                let _ = write!(out, " {id} {} {} {}", (ship + turn) % size, ship % size, turn);
            }
        }
        let _ = write!(out, " {size}");
        for x in 0..size {
            let _ = write!(out, " {x} {} {}", turn % size, turn);
        }
        out.push('\n');
    }
    out
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [32usize, 48, 64] {
        let stream = recorded_stream(size, size);
        group.bench_with_input(BenchmarkId::new("game", size), &stream, |b, stream| {
            b.iter_batched(
                || {
                    let mut spectator = Spectator::new();
                    for line in stream.lines() {
                        spectator.receive(line);
                    }
                    spectator
                },
                |mut spectator| {
                    spectator.pump().expect("recorded stream decodes");
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(decode_benches, bench_decode);
criterion_main!(decode_benches);
