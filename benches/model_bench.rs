//! Criterion benchmarks for precomputation and model construction.
//!
//! Uses synthetic instances: ports on a line with one canal, a single
//! vessel type, and commodities between random port pairs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_liner::instance::{
    Canal, CanalPassage, Commodity, FuelType, Instance, Port, PortCall, VesselType,
};
use u_liner::network::{all_possible_loads, ModelConfig, NetworkModel, Precomputed};

// ===========================================================================
// Synthetic instance
// ===========================================================================

fn code(i: usize) -> String {
    format!("PT{i:03}")
}

fn synthetic(ports: usize, commodities: usize, seed: u64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut inst = Instance::new();
    inst.add_fuel_type(FuelType::new("IFO", 600).unwrap()).unwrap();
    let vessel = VesselType::new("Panamax", 4_000, 3_800, 6, 25_000, 12, 22)
        .unwrap()
        .with_fuel("IFO", 18, 90.0)
        .unwrap();
    inst.add_vessel_type(vessel).unwrap();

    let call = PortCall {
        productivity: 90,
        manoeuvring_in: 2,
        manoeuvring_out: 2,
        call_cost: 8_000,
        waiting_time: 1,
    };
    for i in 0..ports {
        let port = Port::new(&code(i), 10_000, 14.0, 60)
            .unwrap()
            .with_call("Panamax", call)
            .unwrap();
        inst.add_port(port).unwrap();
    }
    let canal = Canal::new("CANAL", 5_000, 12.0, 14)
        .unwrap()
        .with_passage(
            "Panamax",
            CanalPassage {
                cost: 150_000,
                waiting_time: 6,
            },
        )
        .unwrap();
    inst.add_canal(canal).unwrap();

    for i in 0..ports {
        for j in 0..ports {
            if i != j {
                let d = 150 * (i as i64 - j as i64).abs();
                inst.add_distance(&code(i), &code(j), d).unwrap();
            }
        }
        inst.add_distance(&code(i), "CANAL", 200 + 50 * i as i64).unwrap();
        inst.add_distance("CANAL", &code(i), 200 + 50 * i as i64).unwrap();
    }

    for _ in 0..commodities {
        let o = rng.random_range(0..ports);
        let d = (o + rng.random_range(1..ports)) % ports;
        let commodity = Commodity::new(
            &code(o),
            &code(d),
            rng.random_range(50..800),
            rng.random_range(300..1_500),
            "dry",
            0,
        )
        .unwrap();
        inst.add_commodity(commodity).unwrap();
    }
    inst
}

fn config() -> ModelConfig {
    ModelConfig::default()
        .with_rotations(2)
        .with_max_transshipments(1)
        .with_max_rotation_hours(24 * 7 * 6)
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_possible_loads(c: &mut Criterion) {
    let mut group = c.benchmark_group("possible_loads");
    for n in [10usize, 50, 200] {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let quantities: Vec<i64> = (0..n).map(|_| rng.random_range(1..500)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &quantities, |b, q| {
            b.iter(|| all_possible_loads(black_box(q)));
        });
    }
    group.finish();
}

fn bench_precompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("precompute");
    group.sample_size(20);
    for ports in [5usize, 10, 20] {
        let inst = synthetic(ports, 2 * ports, 42);
        let config = config();
        group.bench_with_input(BenchmarkId::from_parameter(ports), &inst, |b, inst| {
            b.iter(|| Precomputed::compute(black_box(inst), &config).unwrap());
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);
    for (ports, commodities) in [(4usize, 4usize), (6, 8), (8, 12)] {
        let inst = synthetic(ports, commodities, 7);
        group.bench_with_input(
            BenchmarkId::new(format!("p{ports}_k{commodities}"), ports),
            &inst,
            |b, inst| {
                b.iter(|| NetworkModel::build(black_box(inst), config()).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_possible_loads, bench_precompute, bench_build);
criterion_main!(benches);
