use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use field_augment::identity_map::{Handle, IdentityMap};
use std::sync::Arc;
use std::time::Duration;

fn owners(n: usize) -> Vec<Arc<u64>> {
    (0..n as u64).map(Arc::new).collect()
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("identity::insert_fresh_100k", |b| {
        b.iter_batched(
            || (IdentityMap::<u64, u64>::new(), owners(100_000)),
            |(mut m, os)| {
                for (i, o) in os.iter().enumerate() {
                    let _ = m.insert(o, i as u64);
                }
                black_box((m, os))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit(c: &mut Criterion) {
    c.bench_function("identity::find_hit", |b| {
        let mut m = IdentityMap::<u64, u64>::new();
        let os = owners(100_000);
        for (i, o) in os.iter().enumerate() {
            let _ = m.insert(o, i as u64);
        }
        let mut it = os.iter().cycle();
        b.iter(|| {
            let o = it.next().unwrap();
            black_box(m.find(o));
        })
    });
}

fn bench_remove_10k(c: &mut Criterion) {
    c.bench_function("identity::remove_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut m = IdentityMap::<u64, u64>::new();
                let os = owners(110_000);
                let handles: Vec<Handle> = os
                    .iter()
                    .enumerate()
                    .map(|(i, o)| m.insert(o, i as u64).0)
                    .collect();
                let to_remove: Vec<Handle> = handles.into_iter().step_by(11).collect();
                (m, os, to_remove)
            },
            |(mut m, os, to_remove)| {
                for h in to_remove {
                    let _ = m.remove(h);
                }
                black_box((m, os))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_sweep_half_dead(c: &mut Criterion) {
    c.bench_function("identity::sweep_half_dead_100k", |b| {
        b.iter_batched(
            || {
                let mut m = IdentityMap::<u64, u64>::new();
                let mut os = owners(100_000);
                for (i, o) in os.iter().enumerate() {
                    let _ = m.insert(o, i as u64);
                }
                os.truncate(50_000);
                (m, os)
            },
            |(mut m, os)| {
                black_box(m.retain_live(|_| true));
                black_box((m, os))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(6))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_find_hit, bench_remove_10k, bench_sweep_half_dead
}
criterion_main!(benches);
