//! Benchmarks for the reactivity hot path and the keyed diff.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use fresco_core::prelude::*;

fn bench_signal_propagation(c: &mut Criterion) {
    c.bench_function("signal_set_with_10_effects", |b| {
        let count = signal(0i64);
        let _effects: Vec<Effect> = (0..10)
            .map(|_| {
                let count = count.clone();
                watch_effect(move || {
                    black_box(count.get());
                })
            })
            .collect();

        let mut i = 0i64;
        b.iter(|| {
            i += 1;
            count.set(i);
        });
    });
}

fn bench_computed_chain(c: &mut Criterion) {
    c.bench_function("computed_chain_depth_8", |b| {
        let base = signal(1i64);

        let mut current = {
            let base = base.clone();
            computed(move || base.get())
        };
        for _ in 0..7 {
            let prev = current.clone();
            current = computed(move || prev.get() + 1);
        }

        let mut i = 1i64;
        b.iter(|| {
            i += 1;
            base.set(i);
            black_box(current.get());
        });
    });
}

fn bench_keyed_list_patch(c: &mut Criterion) {
    let build = |order: &[usize]| {
        let items: Vec<VNode> = order
            .iter()
            .map(|i| h("li", Props::new().key(i.to_string()), i.to_string()))
            .collect();
        h("ul", Props::new(), items)
    };

    c.bench_function("keyed_patch_reverse_100", |b| {
        let forward: Vec<usize> = (0..100).collect();
        let backward: Vec<usize> = (0..100).rev().collect();

        b.iter(|| {
            let container = DomNode::create_element("div");
            let old = build(&forward);
            fresco_core::render::mount(&old, &container);
            let new = build(&backward);
            fresco_core::render::patch(&old, &new, &container);
            black_box(container.child_count());
        });
    });
}

criterion_group!(
    benches,
    bench_signal_propagation,
    bench_computed_chain,
    bench_keyed_list_patch
);
criterion_main!(benches);
