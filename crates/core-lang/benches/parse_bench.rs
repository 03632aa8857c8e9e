use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use core_lang::parse;

fn bench_parse(c: &mut Criterion) {
    let plain = "echo hello world and some more words here";
    let quoted = r#"echo 'single   spaced' "double $HOME quoted" plain"#;
    let piped = "cat input | grep pattern | sort | uniq -c 1> counts.txt 2>> errors.log";

    c.bench_function("parse_plain_words", |b| {
        b.iter(|| parse(black_box(plain)))
    });
    c.bench_function("parse_quoted_variables", |b| {
        b.iter(|| parse(black_box(quoted)))
    });
    c.bench_function("parse_pipeline_redirects", |b| {
        b.iter(|| parse(black_box(piped)))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
