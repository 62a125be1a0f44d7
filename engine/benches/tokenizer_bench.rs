use criterion::{criterion_group, criterion_main, Criterion};
use engine::tokenizer::{normalize, tokenize, MIN_INDEXED_LEN};

fn bench_tokenize(c: &mut Criterion) {
    let text = include_str!("../../README.md");
    c.bench_function("tokenize_readme", |b| b.iter(|| tokenize(text)));
    c.bench_function("tokenize_and_normalize_readme", |b| {
        b.iter(|| {
            tokenize(text)
                .into_iter()
                .filter_map(|t| normalize(t, MIN_INDEXED_LEN))
                .count()
        })
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
