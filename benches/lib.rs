use criterion::{black_box, criterion_group, criterion_main, Criterion};
use statsline::{normalize, MetricType, MetricsClient, NopMetricSink};

fn new_nop_client() -> MetricsClient {
    MetricsClient::builder()
        .with_prefix("client.bench")
        .with_global_tags(["env:bench", "host:local"])
        .with_sink(NopMetricSink)
        .build()
}

fn benchmark_prepare(c: &mut Criterion) {
    let client = new_nop_client();

    c.bench_function("prepare_counter", |b| {
        b.iter(|| client.prepare(black_box("some.counter"), 123, &[], 1.0, MetricType::Counter, None))
    });

    c.bench_function("prepare_timer_sampled_tags", |b| {
        b.iter(|| {
            client.prepare(
                black_box("some.timer"),
                42,
                &["route:home", "method:get"],
                0.25,
                MetricType::Timer,
                None,
            )
        })
    });
}

fn benchmark_normalize(c: &mut Criterion) {
    c.bench_function("normalize_clean_key", |b| b.iter(|| normalize(black_box("some.clean.key"))));
    c.bench_function("normalize_dirty_key", |b| b.iter(|| normalize(black_box("GET /users/:id|@x"))));
}

fn benchmark_nop_client(c: &mut Criterion) {
    let client = new_nop_client();

    // Counters are representative of the cost of every metric type
    c.bench_function("nop_client_counter", |b| b.iter(|| client.count("some.counter", 123)));
    c.bench_function("nop_client_counter_tags", |b| {
        b.iter(|| client.count_with_tags("some.counter", 123).with_tag("tag:val").send())
    });
}

criterion_group!(benches, benchmark_prepare, benchmark_normalize, benchmark_nop_client);

criterion_main!(benches);
