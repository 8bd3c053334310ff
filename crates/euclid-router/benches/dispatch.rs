//! Dispatch benchmarks.
//!
//! Run with: `cargo bench -p euclid-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use euclid_router::{MethodRouter, Router};
use http::Method;

fn build_router(num_routes: usize) -> Router<usize> {
    let mut router = Router::new();
    let third = num_routes / 3;

    for i in 0..third {
        router
            .insert(&format!("/v1/collection{i}"), MethodRouter::new().get(i).post(i + 1))
            .unwrap();
        router
            .route(Method::GET, &format!("/v1/collection{i}/{{itemId}}"), i)
            .unwrap();
        router
            .route(
                Method::GET,
                &format!("/v1/tenants/{{tenantId}}/collection{i}/{{itemId}}"),
                i,
            )
            .unwrap();
    }

    router
}

fn bench_lookup(c: &mut Criterion) {
    let router = build_router(120);

    c.bench_function("static_hit", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/v1/collection20")));
    });
    c.bench_function("param_hit", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/v1/collection20/981")));
    });
    c.bench_function("nested_param_hit", |b| {
        b.iter(|| {
            black_box(router.match_route(&Method::GET, "/v1/tenants/acme/collection7/981"))
        });
    });
    c.bench_function("wrong_method", |b| {
        b.iter(|| black_box(router.lookup(&Method::DELETE, "/v1/collection20")));
    });
    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.lookup(&Method::GET, "/v2/nothing/here")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [30, 300, 3000] {
        let router = build_router(num_routes);
        let path = format!("/v1/collection{}/77", num_routes / 6);

        group.bench_with_input(BenchmarkId::new("param_hit", num_routes), &path, |b, p| {
            b.iter(|| black_box(router.match_route(&Method::GET, p)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_scaling);
criterion_main!(benches);
