//! Criterion benchmarks for the annealing kernel and the schedule.
//!
//! Uses synthetic netlists (a random graph of two- to four-pin nets on a
//! square grid) to measure step throughput independent of any device.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use grid_anneal::schedule::{Annealer, CoolingSchedule, ScheduleConfig};
use grid_anneal::state::{AnnealState, PlacerConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `side x side` grid, one vertex per cell on a quarter of the cells and
/// as many random nets as vertices.
fn random_netlist(side: usize, wrap_around: bool) -> AnnealState {
    let mut rng = StdRng::seed_from_u64(7);
    let num_vertices = side * side / 4;
    let config = PlacerConfig::default()
        .with_wrap_around(wrap_around)
        .with_seed(42);
    let mut state =
        AnnealState::with_config(side, side, 1, num_vertices, num_vertices, config).unwrap();
    for x in 0..side {
        for y in 0..side {
            state.set_chip_resource(x, y, 0, 1).unwrap();
        }
    }

    let vertices: Vec<_> = (0..num_vertices)
        .map(|i| {
            let v = state.new_vertex(num_vertices).unwrap();
            state.set_vertex_resource(v, 0, 1).unwrap();
            let cell = i * 4;
            state
                .add_vertex_to_chip(v, cell % side, cell / side, true)
                .unwrap();
            v
        })
        .collect();
    for _ in 0..num_vertices {
        let fanout = rng.random_range(2..=4);
        let net = state.new_net(fanout).unwrap();
        let mut members = Vec::with_capacity(fanout);
        while members.len() < fanout {
            let v = vertices[rng.random_range(0..num_vertices)];
            if !members.contains(&v) {
                members.push(v);
                state.add_vertex_to_net(net, v).unwrap();
            }
        }
    }
    state
}

fn bench_run_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_steps");
    group.sample_size(10);

    for &side in &[16, 32, 64] {
        for wrap in [false, true] {
            let id = format!("{side}x{side}{}", if wrap { "_torus" } else { "" });
            let state = random_netlist(side, wrap);
            group.bench_with_input(BenchmarkId::from_parameter(id), &state, |b, s| {
                b.iter_batched(
                    || s.clone(),
                    |mut s| black_box(s.run_steps(10_000, side / 4, 1.0)),
                    criterion::BatchSize::LargeInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");
    group.sample_size(10);

    for &side in &[16, 32] {
        let state = random_netlist(side, false);
        let config = ScheduleConfig::default()
            .with_cooling(CoolingSchedule::Adaptive)
            .with_max_stages(50);
        group.bench_with_input(
            BenchmarkId::from_parameter(side),
            &(state, config),
            |b, (s, c)| {
                b.iter_batched(
                    || s.clone(),
                    |mut s| black_box(Annealer::run(&mut s, black_box(c)).unwrap()),
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_run_steps, bench_schedule);
criterion_main!(benches);
