//! # Broker Sandbox Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Topic matcher | `matches` over typical filters |
//! | Event bus | publish fan-out to N listeners |
//! | Terminal | publish into a terminal with active subscriptions |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sandbox_bus::{matches, EventPublisher, InMemoryEventBus, ListenerControl, ManualClock, PublishedEvent};
use sandbox_terminal::{ContextTheme, SandboxConfig, SandboxContainer, TerminalApi};

fn bench_topic_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("topic-matcher");

    let cases = [
        ("exact", "sensors/kitchen/temp", "sensors/kitchen/temp"),
        ("single-level", "sensors/+/temp", "sensors/kitchen/temp"),
        ("multi-level", "sensors/#", "sensors/kitchen/temp/raw"),
        ("miss", "sensors/+/humidity", "sensors/kitchen/temp"),
    ];

    for (name, filter, topic) in cases {
        group.bench_function(name, |b| {
            b.iter(|| matches(black_box(filter), black_box(topic)));
        });
    }

    group.finish();
}

fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("event-bus");

    for listeners in [1usize, 10, 100] {
        let bus = InMemoryEventBus::new();
        let handles: Vec<_> = (0..listeners)
            .map(|_| bus.listen(|_| ListenerControl::Keep))
            .collect();

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(BenchmarkId::new("publish", listeners), &listeners, |b, _| {
            b.iter(|| {
                bus.publish(PublishedEvent::new(
                    "bench/topic",
                    "payload",
                    "bench",
                    DateTime::<Utc>::UNIX_EPOCH,
                ))
            });
        });

        drop(handles);
    }

    group.finish();
}

fn bench_terminal_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("terminal");

    let clock = Arc::new(ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH));
    let sandbox = match SandboxContainer::with_clock(SandboxConfig::default(), clock) {
        Ok(sandbox) => sandbox,
        Err(e) => panic!("default config rejected: {e}"),
    };
    let subscriber = sandbox.open_terminal(ContextTheme::Primary);
    subscriber.execute("mosquitto_sub -t 'bench/#' -v");
    let publisher = sandbox.open_terminal(ContextTheme::Primary);

    group.bench_function("mosquitto_pub", |b| {
        b.iter(|| publisher.execute(black_box("mosquitto_pub -t bench/load -m 42")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_topic_matching,
    bench_publish_fan_out,
    bench_terminal_publish
);
criterion_main!(benches);
