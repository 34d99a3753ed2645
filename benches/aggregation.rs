use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use customs_core::{
    costs::{CostAggregator, CostCategory, CostLineItem},
    currency::CurrencyCode,
};

const CODES: [&str; 5] = ["USD", "KRW", "EUR", "JPY", "CNY"];

fn items(count: usize) -> Vec<CostLineItem> {
    (0..count)
        .map(|idx| {
            CostLineItem::new(format!("item {idx}"))
                .priced(100.0 + idx as f64, CODES[idx % CODES.len()])
                .in_category(CostCategory::ALL[idx % CostCategory::ALL.len()])
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let aggregator = CostAggregator::default();
    let display = CurrencyCode::new("USD");
    let mut group = c.benchmark_group("aggregate");
    for size in [10usize, 100, 1_000] {
        let sheet = items(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &sheet, |b, sheet| {
            b.iter(|| {
                let result = aggregator.aggregate(black_box(sheet), &display).unwrap();
                black_box(result);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
