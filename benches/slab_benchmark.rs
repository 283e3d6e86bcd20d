use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grove::{SlabArena, SlabConfig, SlabKey};

fn bench_slab_insert(c: &mut Criterion) {
    let size = 100_000;

    c.bench_function("slab_insert", |b| {
        b.iter(|| {
            let mut slab = SlabArena::new();
            for i in 0..size {
                black_box(slab.insert(i as u64));
            }
            black_box(slab.memory_size())
        });
    });

    c.bench_function("vec_push", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for i in 0..size {
                vec.push(black_box(i as u64));
            }
            black_box(vec.len())
        });
    });
}

fn bench_slab_churn(c: &mut Criterion) {
    let size = 10_000;

    c.bench_function("slab_remove_reinsert", |b| {
        let config = SlabConfig::default().with_min_slots_per_block(256);
        b.iter(|| {
            let mut slab = SlabArena::with_config(config);
            let keys: Vec<SlabKey> = (0..size).map(|i| slab.insert([i as u64; 4])).collect();
            for key in keys.iter().step_by(2) {
                black_box(slab.remove(*key));
            }
            for i in 0..size / 2 {
                black_box(slab.insert([i as u64; 4]));
            }
            black_box(slab.len())
        });
    });

    c.bench_function("slab_lookup", |b| {
        let mut slab = SlabArena::new();
        let keys: Vec<SlabKey> = (0..size).map(|i| slab.insert(i as u64)).collect();
        b.iter(|| {
            let mut sum = 0u64;
            for &key in &keys {
                sum += slab.get(key).copied().unwrap_or(0);
            }
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_slab_insert, bench_slab_churn);
criterion_main!(benches);
