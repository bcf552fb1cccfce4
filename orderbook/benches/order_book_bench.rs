// Benchmarks for the AVL-backed book (spec.md §5's amortized complexity
// bounds): add_order latency at varying depths, same-price FIFO append,
// reduce_order, best_bid/best_ask lookup, and a mixed workload.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orderbook::Book;

fn bench_add_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("book_add");

    group.bench_function("add_single_order", |b| {
        let mut book = Book::new();
        let mut uid = 1u64;
        b.iter(|| {
            let result = book.add_order(black_box(uid), black_box(0), black_box(100), black_box(10_050), black_box(true));
            black_box(result).ok();
            uid += 1;
        });
    });

    for depth in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("add_to_book_depth", depth), depth, |b, &depth| {
            let mut book = Book::new();
            for i in 0..depth {
                let _ = book.add_order(i as u64, 0, 100, 10_000 + i as i64, i % 2 == 0);
            }
            let mut uid = depth as u64 + 1;
            b.iter(|| {
                let result = book.add_order(black_box(uid), black_box(0), black_box(100), black_box(10_050), black_box(true));
                black_box(result).ok();
                uid += 1;
            });
        });
    }

    group.bench_function("add_same_price_level", |b| {
        let mut book = Book::new();
        let mut uid = 1u64;
        b.iter(|| {
            let result = book.add_order(black_box(uid), black_box(0), black_box(100), black_box(10_000), black_box(true));
            black_box(result).ok();
            uid += 1;
        });
    });

    group.bench_function("add_different_price_levels", |b| {
        let mut book = Book::new();
        let mut uid = 1u64;
        let mut price = 10_000i64;
        b.iter(|| {
            let result = book.add_order(black_box(uid), black_box(0), black_box(100), black_box(price), black_box(true));
            black_box(result).ok();
            uid += 1;
            price += 1;
        });
    });

    group.finish();
}

fn bench_reduce_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("book_reduce");

    for book_size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("reduce_existing", book_size), book_size, |b, &size| {
            let mut book = Book::new();
            for i in 0..size {
                let _ = book.add_order(i as u64, 0, 1_000_000, 10_000 + (i as i64 % 100), i % 2 == 0);
            }
            let mut uid = 0u64;
            b.iter(|| {
                let result = book.reduce_order(black_box(uid), black_box(1));
                black_box(result).ok();
                uid = (uid + 1) % size as u64;
            });
        });
    }

    group.finish();
}

fn bench_best_price_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("book_lookup");

    group.bench_function("best_bid_empty", |b| {
        let book = Book::new();
        b.iter(|| black_box(book.best_bid()));
    });

    group.bench_function("best_ask_empty", |b| {
        let book = Book::new();
        b.iter(|| black_box(book.best_ask()));
    });

    for num_levels in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("best_bid_levels", num_levels), num_levels, |b, &levels| {
            let mut book = Book::new();
            for i in 0..levels {
                let _ = book.add_order(i as u64, 0, 100, 10_000 - i as i64, true);
            }
            b.iter(|| black_box(book.best_bid()));
        });

        group.bench_with_input(BenchmarkId::new("best_ask_levels", num_levels), num_levels, |b, &levels| {
            let mut book = Book::new();
            for i in 0..levels {
                let _ = book.add_order(i as u64, 0, 100, 10_001 + i as i64, false);
            }
            b.iter(|| black_box(book.best_ask()));
        });
    }

    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("book_mixed");

    // 70% add (away from the touch, so matching never fires), 20% lookup, 10% reduce.
    group.bench_function("mixed_70_20_10", |b| {
        let mut book = Book::new();
        let mut uid = 1u64;
        let mut iteration = 0u64;
        b.iter(|| {
            let op = iteration % 10;
            match op {
                0..=6 => {
                    let side = uid % 2 == 0;
                    let price = if side { 9_000 - (uid as i64 % 100) } else { 11_000 + (uid as i64 % 100) };
                    let result = book.add_order(black_box(uid), black_box(0), black_box(100), black_box(price), black_box(side));
                    black_box(result).ok();
                    uid += 1;
                }
                7 | 8 => {
                    if iteration % 2 == 0 {
                        black_box(book.best_bid());
                    } else {
                        black_box(book.best_ask());
                    }
                }
                _ => {
                    let target = if uid > 10 { uid - 10 } else { 1 };
                    black_box(book.reduce_order(black_box(target), black_box(1))).ok();
                }
            }
            iteration += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_add_order,
    bench_reduce_order,
    bench_best_price_lookup,
    bench_mixed_workload,
);

criterion_main!(benches);
