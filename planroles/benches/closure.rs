use criterion::{Criterion, black_box, criterion_group, criterion_main};

use planroles::{ClosureOptions, RoleCatalog, StateRelations, derive_all};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const OBJECTS: [&str; 5] = ["a", "b", "c", "d", "e"];

/// Random per-state relations over two predicates. Seeded for determinism.
fn build_relations(states: usize) -> StateRelations<usize> {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let mut relations = StateRelations::new();

    for state in 0..states {
        relations.add_state(state);
        for predicate in ["on", "near"] {
            for _ in 0..rng.random_range(0..4) {
                let x = OBJECTS[rng.random_range(0..OBJECTS.len())];
                let y = OBJECTS[rng.random_range(0..OBJECTS.len())];
                relations.add_pair(state, predicate, x, y);
            }
        }
    }
    relations
}

fn bench_closure(c: &mut Criterion) {
    let relations = build_relations(64);
    let options = ClosureOptions {
        max_definitions: Some(256),
    };

    c.bench_function("discover_roles", |b| {
        b.iter(|| RoleCatalog::discover(black_box(relations.global()), &options))
    });

    let catalog = RoleCatalog::discover(relations.global(), &options);
    c.bench_function("derive_all_states", |b| {
        b.iter(|| derive_all(black_box(&catalog), black_box(&relations)))
    });
}

criterion_group!(benches, bench_closure);
criterion_main!(benches);
