//! Benchmarks for duplicate hand suppression

use classroom_vote::config::DedupConfig;
use classroom_vote::dedup::HandDeduplicator;
use classroom_vote::geometry::Point;
use classroom_vote::hand_candidate::{Acceptance, HandCandidate};
use classroom_vote::keypoints::Side;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

/// Random candidates over a 1920x1080 classroom; every third one is a ghost
/// of the previous hand
fn random_candidates(n: usize) -> Vec<HandCandidate> {
    let mut rng = rand::thread_rng();
    let mut candidates: Vec<HandCandidate> = Vec::with_capacity(n);

    for i in 0..n {
        let head_height = rng.gen_range(25.0..90.0_f32);
        let (wx, wy) = match candidates.last() {
            Some(prev) if i % 3 == 0 => (
                prev.wrist.x + rng.gen_range(-15.0..15.0),
                prev.wrist.y + rng.gen_range(-15.0..15.0),
            ),
            _ => (rng.gen_range(0.0..1920.0), rng.gen_range(0.0..540.0)),
        };

        candidates.push(HandCandidate {
            wrist: Point::new(wx, wy),
            elbow: Point::new(wx, wy + head_height * 1.2),
            shoulder: Point::new(wx + rng.gen_range(-20.0..20.0), wy + head_height * 2.5),
            nose: Point::new(wx, wy + head_height * 2.0),
            confidence: rng.gen_range(0.3..1.0),
            side: if rng.gen_bool(0.5) { Side::Left } else { Side::Right },
            head_id: i / 2,
            dedup_distance: (55.0 * head_height / 100.0).trunc().max(20.0),
            source_head_height: head_height,
            acceptance: Acceptance::Strict,
        });
    }

    candidates
}

fn benchmark_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");
    let dedup = HandDeduplicator::new(DedupConfig::default());

    for n in [10, 50, 200, 500] {
        let candidates = random_candidates(n);
        group.bench_with_input(BenchmarkId::new("candidates", n), &candidates, |b, candidates| {
            b.iter(|| black_box(dedup.dedup(black_box(candidates.clone()))));
        });
    }

    group.finish();
}

fn benchmark_is_duplicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_duplicate");
    let dedup = HandDeduplicator::new(DedupConfig::default());

    let accepted = dedup.dedup(random_candidates(100));
    let probe = random_candidates(1)[0];

    group.bench_function("against_accepted", |b| {
        b.iter(|| black_box(dedup.is_duplicate(black_box(&probe), black_box(&accepted))));
    });

    group.finish();
}

criterion_group!(benches, benchmark_dedup, benchmark_is_duplicate);
criterion_main!(benches);
