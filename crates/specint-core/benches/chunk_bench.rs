//! Benchmarks for chunk evaluation
//!
//! Run with: cargo bench -p specint-core --bench chunk_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use specint_core::chunk::compute_sinr;
use specint_core::prelude::*;

fn bench_sinr(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_sinr");

    for bands in [16usize, 64, 256, 1024].iter() {
        let model = SpectrumModel::uniform(2.4e9, 1e5, *bands);
        let tracked = SpectrumValue::constant(model.clone(), 1e-15);
        let aggregate = SpectrumValue::constant(model.clone(), 3e-15);
        let noise = SpectrumValue::thermal_noise(model, 5.0);

        group.throughput(Throughput::Elements(*bands as u64));
        group.bench_with_input(BenchmarkId::new("bands", bands), bands, |b, _| {
            b.iter(|| compute_sinr(black_box(&tracked), black_box(&aggregate), black_box(&noise)))
        });
    }

    group.finish();
}

fn bench_reception(c: &mut Criterion) {
    let mut group = c.benchmark_group("reception");
    let model = SpectrumModel::uniform(2.4e9, 1e6, 64);
    let wanted = SpectrumValue::from_power_dbm(model.clone(), -70.0, 10..30).unwrap();
    let interferer = SpectrumValue::from_power_dbm(model.clone(), -85.0, 20..40).unwrap();

    for events in [1usize, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::new("medium_events", events), events, |b, &events| {
            b.iter(|| {
                let mut rx = SpectrumInterference::new(model.clone())
                    .with_error_model(BpskBerModel::new(1.0));
                rx.set_noise_psd(&SpectrumValue::thermal_noise(model.clone(), 5.0))
                    .unwrap();
                rx.add_signal(&wanted, SimTime::ZERO).unwrap();
                rx.start_rx(&wanted, SimTime::ZERO).unwrap();
                for n in 0..events as u64 {
                    rx.add_signal(&interferer, SimTime::from_micros(10 * n + 1)).unwrap();
                    rx.subtract_signal(&interferer, SimTime::from_micros(10 * n + 5)).unwrap();
                }
                black_box(rx.end_rx(SimTime::from_micros(10 * events as u64 + 10)).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sinr, bench_reception);
criterion_main!(benches);
