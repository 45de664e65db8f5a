use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use envelope_gate::{
    parse_rate_limits, DataCategory, DiscardReason, Envelope, EnvelopeItem, OutboundGate,
};
use std::time::Instant;

/// Benchmark directive parsing
fn bench_parse_rate_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_rate_limits");
    let now = Instant::now();

    group.bench_function("single_group", |b| {
        b.iter(|| parse_rate_limits(black_box("60:error:organization"), now))
    });

    group.bench_function("many_groups", |b| {
        let directive = "60:error;session:key, 2700:default;error;security:organization, \
                         x:transaction:key, 10::organization, 30:attachment;user_report:project";
        b.iter(|| parse_rate_limits(black_box(directive), now))
    });

    group.finish();
}

/// Benchmark the per-item gate decision
fn bench_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate");
    group.throughput(Throughput::Elements(1000));

    for state in ["unlimited", "limited", "global"].iter() {
        let gate = OutboundGate::new();
        match *state {
            "limited" => gate.update_rate_limits("3600:error:key"),
            "global" => gate.update_rate_limits("3600::organization"),
            _ => {}
        }

        group.bench_with_input(BenchmarkId::new("items", state), state, |b, _| {
            b.iter(|| {
                for _ in 0..1000 {
                    black_box(gate.gate(EnvelopeItem::new(DataCategory::Error, Vec::new())));
                }
                gate.tracker().drain();
            })
        });
    }

    group.bench_function("envelope_with_report", |b| {
        let gate = OutboundGate::new();
        gate.update_rate_limits("3600:transaction:key");
        b.iter(|| {
            let envelope = Envelope::from_items(vec![
                EnvelopeItem::new(DataCategory::Error, b"{}".to_vec()),
                EnvelopeItem::new(DataCategory::Transaction, b"{}".to_vec()),
                EnvelopeItem::new(DataCategory::Session, b"{}".to_vec()),
            ]);
            if let Some(mut envelope) = gate.gate_envelope(envelope) {
                gate.attach_client_report(&mut envelope);
                black_box(envelope);
            }
        })
    });

    group.finish();
}

/// Benchmark multi-threaded drop accounting
fn bench_concurrent_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_record");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        group.bench_with_input(
            BenchmarkId::new("threads", num_threads),
            num_threads,
            |b, &num_threads| {
                let gate = OutboundGate::new();

                b.iter(|| {
                    let mut handles = vec![];

                    for i in 0..num_threads {
                        let gate = gate.clone();
                        let handle = std::thread::spawn(move || {
                            let reason = DiscardReason::ALL[i % DiscardReason::ALL.len()];
                            for _ in 0..1000 {
                                gate.record_discarded(DataCategory::Error, reason, 1);
                            }
                        });
                        handles.push(handle);
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }

                    black_box(gate.prepare_client_report());
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_rate_limits,
    bench_gate,
    bench_concurrent_record
);
criterion_main!(benches);
