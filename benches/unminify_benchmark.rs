use criterion::{black_box, criterion_group, criterion_main, Criterion};
use oxc_allocator::Allocator;
use oxc_span::SourceType;
use unminify_rs::{parse_program, print_program, Unminifier};

const CHAIN: &str = "x = a !== null && a !== undefined && a.b !== null && a.b !== undefined ? a.b.c : undefined;\n";

const COALESCE: &str = "function name(r) {\n  var t, n, o;\n  return null !== (t = null == r || null === (n = r.app_info) || void 0 === n || null === (o = n.base_info) || void 0 === o ? void 0 : o.app_name) && void 0 !== t ? t : \"game\";\n}\n";

fn document(copies: usize) -> String {
    let mut source = String::new();
    for i in 0..copies {
        source.push_str(&CHAIN.replace("x =", &format!("x{} =", i)));
        source.push_str(&COALESCE.replace("function name", &format!("function name{}", i)));
    }
    source
}

fn unminify_benchmark(c: &mut Criterion) {
    let small = document(1);
    let large = document(200);
    let unminifier = Unminifier::default();

    c.bench_function("parse_and_print", |b| {
        b.iter(|| {
            let allocator = Allocator::default();
            let program = parse_program(&allocator, black_box(&large), SourceType::mjs()).unwrap();
            black_box(print_program(&program));
        });
    });

    c.bench_function("unminify_small", |b| {
        b.iter(|| black_box(unminifier.unminify(black_box(&small)).unwrap()));
    });

    c.bench_function("unminify_large", |b| {
        b.iter(|| black_box(unminifier.unminify(black_box(&large)).unwrap()));
    });
}

criterion_group!(benches, unminify_benchmark);
criterion_main!(benches);
