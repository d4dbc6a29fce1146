use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ems_sim::events::{EventKind, EventQueue};

const EVENT_COUNTS: &[usize] = &[128, 1_024, 8_192, 65_536];

fn bench_event_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue");

    for &count in EVENT_COUNTS {
        group.bench_with_input(BenchmarkId::new("push_pop", count), &count, |b, &count| {
            b.iter_batched(
                EventQueue::new,
                |mut queue| {
                    for idx in 0..count {
                        let kind = if idx % 2 == 0 {
                            EventKind::Call { patient: idx }
                        } else {
                            EventKind::ReturnBase { ambulance: idx % 8 }
                        };
                        // reversed times exercise the heap's reordering
                        queue.schedule((count - idx) as u64, kind);
                    }
                    while let Some(event) = queue.pop_due(u64::MAX) {
                        black_box(event);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_event_queue);
criterion_main!(benches);
