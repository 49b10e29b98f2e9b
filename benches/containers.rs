//! Criterion micro-benchmarks for the allocators and the containers on top of them.

use compartment::{Allocator, ArenaAllocator, FixedBufferAllocator, List, Set, String, StringView, Table};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Benchmark: 10K small bump allocations, then one reset.
fn bench_arena_alloc_reset(c: &mut Criterion) {
    let mut arena = ArenaAllocator::new();
    c.bench_function("arena_alloc_reset_10k", |b| {
        b.iter(|| {
            for i in 0..10_000usize {
                black_box(arena.raw_alloc(16 + (i & 15)).unwrap());
            }
            arena.reset();
        });
    });
}

/// Benchmark: Same pattern through the wrapping scratch buffer.
fn bench_fixed_alloc(c: &mut Criterion) {
    let fixed = unsafe { FixedBufferAllocator::new() };
    c.bench_function("fixed_alloc_10k", |b| {
        b.iter(|| {
            for i in 0..10_000usize {
                black_box(fixed.raw_alloc(16 + (i & 15)).unwrap());
            }
        });
    });
}

/// Benchmark: Push 10K integers starting from the default capacity.
fn bench_list_push(c: &mut Criterion) {
    let mut arena = ArenaAllocator::new();
    c.bench_function("list_push_10k", |b| {
        b.iter(|| {
            {
                let mut list = List::new(&arena);
                for i in 0..10_000u64 {
                    list.push(i);
                }
                black_box(list.len());
            }
            arena.reset();
        });
    });
}

/// Benchmark: Fill a table from the default capacity, growing along the way.
fn bench_table_put(c: &mut Criterion) {
    let mut arena = ArenaAllocator::new();
    c.bench_function("table_put_10k", |b| {
        b.iter(|| {
            {
                let mut table = Table::new(&arena);
                for i in 0..10_000u64 {
                    table.put(i.wrapping_mul(0x9E37_79B9_7F4A_7C15), i);
                }
                black_box(table.len());
            }
            arena.reset();
        });
    });
}

/// Benchmark: Hit and miss lookups on a 10K entry table.
fn bench_table_get(c: &mut Criterion) {
    let arena = ArenaAllocator::new();
    let mut table = Table::new(&arena);
    for i in 0..10_000u64 {
        table.put(i * 2, i);
    }
    c.bench_function("table_get_hit_miss", |b| {
        b.iter(|| {
            let mut found = 0u64;
            for i in 0..1_000u64 {
                found += table.get(&black_box(i)).into_option().unwrap_or(0);
            }
            black_box(found);
        });
    });
}

/// Benchmark: Set of byte-string views hashed with FNV-1.
fn bench_set_views(c: &mut Criterion) {
    let words: Vec<std::string::String> = (0..2_000).map(|i| format!("word-{}", i)).collect();
    let mut arena = ArenaAllocator::new();
    c.bench_function("set_put_views_2k", |b| {
        b.iter(|| {
            {
                let mut set = Set::new(&arena);
                for word in &words {
                    set.put(StringView::from(word.as_str()));
                }
                black_box(set.has(&StringView::from("word-1999")));
            }
            arena.reset();
        });
    });
}

/// Benchmark: Two-pass formatting into an arena string.
fn bench_string_format(c: &mut Criterion) {
    let mut arena = ArenaAllocator::new();
    c.bench_function("string_format_append_1k", |b| {
        b.iter(|| {
            {
                let mut s = String::new(&arena);
                for i in 0..1_000 {
                    s.format_append(format_args!("{}:{};", i, black_box(i * 3)));
                }
                black_box(s.count());
            }
            arena.reset();
        });
    });
}

criterion_group!(
    benches,
    bench_arena_alloc_reset,
    bench_fixed_alloc,
    bench_list_push,
    bench_table_put,
    bench_table_get,
    bench_set_views,
    bench_string_format
);
criterion_main!(benches);
