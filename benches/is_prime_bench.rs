//! Criterion benchmark for the primality checker

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use prime_check::{DivisorBound, PrimalityChecker};

fn bench_is_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_prime");

    for bound in [DivisorBound::Half, DivisorBound::Sqrt] {
        let checker = PrimalityChecker::new(bound);
        for input in [7i64, 97, 997, 9973].iter() {
            group.bench_with_input(format!("{bound:?}/is_prime({input})"), input, |b, &input| {
                b.iter(|| checker.is_prime(black_box(input)))
            });
        }
    }

    group.finish();
}

fn bench_large_prime(c: &mut Criterion) {
    let checker = PrimalityChecker::default();

    c.bench_function("sqrt/is_prime(1_000_000_007)", |b| {
        b.iter(|| checker.is_prime(black_box(1_000_000_007)))
    });
}

fn bench_count_primes(c: &mut Criterion) {
    let checker = PrimalityChecker::default();

    c.bench_function("count_primes(100_000)", |b| {
        b.iter(|| checker.count_primes(black_box(100_000)))
    });
}

criterion_group!(benches, bench_is_prime, bench_large_prime, bench_count_primes);
criterion_main!(benches);
