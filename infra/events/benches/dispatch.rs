use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use herald_event_bus::{Event, EventBus, ReceiveRule, RegisterOptions};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Sink(AtomicU64);

impl Sink {
    fn take(&self, _event: &Event) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

fn populated(receivers: usize) -> (EventBus, Vec<Arc<Sink>>) {
    let bus = EventBus::new();
    let sinks: Vec<Arc<Sink>> = (0..receivers).map(|_| Arc::new(Sink::default())).collect();
    for (i, sink) in sinks.iter().enumerate() {
        let rule = match i % 4 {
            0 => ReceiveRule::all(),
            1 => ReceiveRule::category(format!("cat-{}", i % 16)),
            2 => ReceiveRule::subcategory(format!("cat-{}", i % 16), "hit"),
            _ => ReceiveRule::custom(format!("custom-{i}"), |e| e.category().ends_with('7')),
        };
        bus.register_method(sink, rule, RegisterOptions::new(), Sink::take);
    }
    (bus, sinks)
}

fn bench_post(c: &mut Criterion) {
    let mut group = c.benchmark_group("post");

    for receivers in [16_usize, 256, 4096] {
        let (bus, _sinks) = populated(receivers);
        group.throughput(Throughput::Elements(1));

        group.bench_with_input(BenchmarkId::new("category", receivers), &bus, |b, bus| {
            b.iter(|| bus.post(black_box(Event::new("cat-7"))));
        });

        group.bench_with_input(BenchmarkId::new("subcategory", receivers), &bus, |b, bus| {
            b.iter(|| bus.post(black_box(Event::new("cat-6").with_subcategory("hit"))));
        });
    }

    group.finish();
}

fn bench_register_unregister(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    for receivers in [16_usize, 1024] {
        let (bus, _sinks) = populated(receivers);
        let probe = Arc::new(Sink::default());

        group.bench_with_input(BenchmarkId::new("register_unregister", receivers), &bus, |b, bus| {
            b.iter(|| {
                bus.register_method(
                    &probe,
                    ReceiveRule::subcategory("cat-3", "probe"),
                    RegisterOptions::new(),
                    Sink::take,
                );
                bus.unregister(black_box(&probe))
            });
        });

        group.bench_with_input(BenchmarkId::new("dedup_hit", receivers), &bus, |b, bus| {
            let options = RegisterOptions::new().allow_duplication(false);
            bus.register_method(&probe, ReceiveRule::all(), options.clone(), Sink::take);
            b.iter(|| {
                bus.register_method(&probe, ReceiveRule::all(), options.clone(), Sink::take)
            });
            bus.unregister(&probe);
        });
    }

    group.finish();
}

criterion_group!(benches, bench_post, bench_register_unregister);
criterion_main!(benches);
