//! Benchmarks for the butterfly mixer at each fusion radix

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fastqaoa_sim::{MixerPlan, Radix};
use fastqaoa_state::StateVector;

fn bench_mixer_radix(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer");

    for num_qubits in [12, 16, 20].iter() {
        group.throughput(Throughput::Elements(1u64 << num_qubits));

        for radix in [Radix::Two, Radix::Four, Radix::Eight] {
            group.bench_with_input(
                BenchmarkId::new(format!("{radix:?}"), num_qubits),
                num_qubits,
                |b, &num_qubits| {
                    let mut plan = MixerPlan::new(num_qubits, radix).unwrap();
                    let mut state = StateVector::plus_state(num_qubits).unwrap();

                    b.iter(|| {
                        plan.apply(&mut state, black_box(0.37)).unwrap();
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_plan_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer_plan");

    for num_qubits in [12, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_qubits),
            num_qubits,
            |b, &num_qubits| {
                b.iter(|| MixerPlan::new(black_box(num_qubits), Radix::Eight).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_mixer_radix, bench_plan_construction);
criterion_main!(benches);
