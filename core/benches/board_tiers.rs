use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pokesweeper_core::*;

/// (label, side, mines) tiers matching the configurable board range.
const TIERS: [(&str, Coord, CellCount); 3] = [
    ("small", 5, 5),
    ("default", 10, 15),
    ("dense", 20, 120),
];

fn mine_pool(count: CellCount) -> Vec<MineAsset> {
    (1..=count)
        .map(|id| MineAsset::from_catalog(id, format!("Critter #{id}"), 24, 72))
        .collect()
}

fn bench_initialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("initialize");
    for (label, side, mines) in TIERS {
        let pool = mine_pool(mines);
        let input = (side, mines);
        group.bench_with_input(BenchmarkId::from_parameter(label), &input, |b, &(side, mines)| {
            let mut generator = RandomMinefieldGenerator::new(0x5eed);
            let start = (side / 2, side / 2);
            b.iter(|| {
                Board::initialize(start, side, mines, pool.clone(), &mut generator)
                    .map(|(board, _)| black_box(board))
            });
        });
    }
    group.finish();
}

fn bench_flood_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("flood_fill");
    for (label, side, mines) in TIERS {
        let mut generator = RandomMinefieldGenerator::new(0x5eed);
        let start = (0, 0);
        let pool = mine_pool(mines);
        let Ok((board, _)) = Board::initialize(start, side, mines, pool, &mut generator) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(label), &board, |b, board| {
            b.iter(|| {
                let mut board = board.clone();
                let opened = board.reveal_from(start).map(|reveal| reveal.count());
                black_box(opened)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_initialize, bench_flood_fill);
criterion_main!(benches);
