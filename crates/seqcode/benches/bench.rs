use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use seqcode::{
    BasicIssuer, ConfigType, CycleStrategy, MemoryCache, MemoryStore, ParamPolicy, Params,
    Partition, SequenceIssuer, SerialConfig, SharedCache, Template, TemplateCache,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

use chrono::{NaiveDate, NaiveDateTime};

// Numbers issued per benchmark iteration (per-thread for multi-threaded).
const TOTAL_NUMBERS: usize = 4096;

const EXPRESSION: &str = "ENV${code}${YYYYMMddHHmmssSSS}#{000000}";

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_milli_opt(9, 5, 3, 42)
        .unwrap()
}

fn config() -> SerialConfig {
    SerialConfig::new("cfg", "Order", ConfigType::Number, EXPRESSION, "acme")
        .with_cycle(CycleStrategy::Yearly)
}

fn issuer() -> BasicIssuer {
    let cache: Arc<dyn SharedCache> = Arc::new(MemoryCache::new());
    BasicIssuer::new(Some(cache), Arc::new(MemoryStore::new()))
}

fn benchmark_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("template");
    group.throughput(Throughput::Elements(TOTAL_NUMBERS as u64));

    let template = Template::parse(EXPRESSION).unwrap();
    let params = Params::from([("code".to_string(), "HX".to_string())]);

    group.bench_function(format!("render/{TOTAL_NUMBERS}"), |b| {
        b.iter(|| {
            for n in 0..TOTAL_NUMBERS as u64 {
                black_box(
                    template
                        .render(n, now(), &params, ParamPolicy::Lenient)
                        .unwrap(),
                );
            }
        });
    });

    group.bench_function(format!("parse/{TOTAL_NUMBERS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_NUMBERS {
                black_box(Template::parse(black_box(EXPRESSION)).unwrap());
            }
        });
    });

    let cache = TemplateCache::new();
    group.bench_function(format!("cached/{TOTAL_NUMBERS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_NUMBERS {
                black_box(cache.get(EXPRESSION).unwrap());
            }
        });
    });

    group.finish();
}

fn benchmark_sequential_issuer(c: &mut Criterion) {
    let mut group = c.benchmark_group("issuer/sequential");
    group.throughput(Throughput::Elements(TOTAL_NUMBERS as u64));

    let config = config();
    let partition = Partition::new("acme", "default", config.cycle_strategy, now());

    group.bench_function(format!("elems/{TOTAL_NUMBERS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let issuer = issuer();
                for _ in 0..TOTAL_NUMBERS {
                    black_box(issuer.next_number(&config, &partition).unwrap());
                }
            }
            start.elapsed()
        });
    });

    group.finish();
}

fn benchmark_contended_issuer(c: &mut Criterion) {
    const THREADS: usize = 8;

    let mut group = c.benchmark_group("issuer/contended");
    group.throughput(Throughput::Elements((TOTAL_NUMBERS * THREADS) as u64));

    let config = config();
    let partition = Partition::new("acme", "default", config.cycle_strategy, now());

    group.bench_function(format!("threads/{THREADS}/elems/{TOTAL_NUMBERS}"), |b| {
        b.iter_custom(|iters| {
            let mut total = core::time::Duration::ZERO;
            for _ in 0..iters {
                let issuer = issuer();
                let barrier = Barrier::new(THREADS + 1);

                let elapsed = scope(|s| {
                    for _ in 0..THREADS {
                        s.spawn(|| {
                            barrier.wait();
                            for _ in 0..TOTAL_NUMBERS {
                                black_box(issuer.next_number(&config, &partition).unwrap());
                            }
                        });
                    }
                    barrier.wait();
                    let start = Instant::now();
                    // Joined when the scope ends.
                    start
                })
                .elapsed();
                total += elapsed;
            }
            total
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_template,
    benchmark_sequential_issuer,
    benchmark_contended_issuer,
);
criterion_main!(benches);
