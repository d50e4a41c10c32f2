use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use yata_core::{snapshot_at, Doc, Event, Replayer};

const SIZES: &[usize] = &[100, 1_000];

fn typing_log(count: usize) -> Vec<Event> {
    let mut doc = Doc::new(1);
    (0..count)
        .map(|i| {
            let ch = char::from(b'a' + (i % 26) as u8);
            doc.insert_text(doc.len(), &ch.to_string()).unwrap()
        })
        .collect()
}

/// Two writers typing into the middle of a shared seed.
fn concurrent_log(count: usize) -> Vec<Event> {
    let mut a = Doc::new(1);
    let mut b = Doc::new(2);
    let seed = a.insert_text(0, "[]").unwrap();
    b.apply(&seed).unwrap();

    let mut log = vec![seed];
    for i in 0..count {
        let ch = char::from(b'a' + (i % 26) as u8).to_string();
        log.push(a.insert_text(1, &ch).unwrap());
        log.push(b.insert_text(b.len() - 1, &ch).unwrap());
    }
    log
}

fn local_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_typing");
    for &count in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, &count| {
            bench.iter(|| {
                let mut doc = Doc::new(1);
                for _ in 0..count {
                    doc.insert_text(doc.len(), "x").unwrap();
                }
                black_box(doc.len())
            })
        });
    }
    group.finish();
}

fn remote_integration(c: &mut Criterion) {
    let mut group = c.benchmark_group("remote_integration");
    for &count in SIZES {
        let log = concurrent_log(count);
        group.bench_with_input(BenchmarkId::new("in_order", count), &log, |bench, log| {
            bench.iter(|| {
                let mut doc = Doc::new(3);
                for event in log {
                    doc.apply(event).unwrap();
                }
                black_box(doc.len())
            })
        });
        group.bench_with_input(BenchmarkId::new("reversed", count), &log, |bench, log| {
            bench.iter(|| {
                let mut doc = Doc::new(3);
                for event in log.iter().rev() {
                    doc.apply(event).unwrap();
                }
                black_box(doc.len())
            })
        });
    }
    group.finish();
}

fn replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    for &count in SIZES {
        let log = typing_log(count);
        group.bench_with_input(BenchmarkId::new("incremental", count), &log, |bench, log| {
            bench.iter(|| black_box(Replayer::new(log).count()))
        });
        group.bench_with_input(BenchmarkId::new("snapshot_at_end", count), &log, |bench, log| {
            bench.iter(|| black_box(snapshot_at(log, log.len()).unwrap().len()))
        });
    }
    group.finish();
}

criterion_group!(benches, local_typing, remote_integration, replay);
criterion_main!(benches);
