//! Benchmarks for landmark smoothing and overlay placement

use camera_effects::{
    detection::DetectionRecord,
    filters::{FaceSmoothing, LandmarkSmoother, SmoothingMode},
    placement::{placements_for, OverlayKind},
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use opencv::core::{Point2f, Rect2f};

/// Noisy 68-point sequences drifting slowly to the right
fn noisy_sequences(frames: usize) -> Vec<Vec<Point2f>> {
    (0..frames)
        .map(|i| {
            let drift = i as f32 * 0.5;
            (0..68)
                .map(|k| {
                    let angle = k as f32 / 68.0 * std::f32::consts::TAU;
                    Point2f::new(
                        320.0 + drift + 80.0 * angle.cos() + rand::random::<f32>() * 3.0,
                        240.0 + 100.0 * angle.sin() + rand::random::<f32>() * 3.0,
                    )
                })
                .collect()
        })
        .collect()
}

fn benchmark_smoother(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");
    let data = noisy_sequences(100);

    for alpha in [0.5f32, 0.7, 0.9] {
        let mut smoother = LandmarkSmoother::new(alpha);
        group.bench_with_input(BenchmarkId::new("single_update", alpha), &data[0], |b, sample| {
            b.iter(|| black_box(smoother.smooth(black_box(sample))));
        });

        group.bench_with_input(BenchmarkId::new("sequence_100", alpha), &data, |b, data| {
            b.iter(|| {
                smoother.reset();
                for sample in data {
                    black_box(smoother.smooth(black_box(sample)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_face_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("face_smoothing");
    let data = noisy_sequences(4);

    for faces in [1usize, 2, 4] {
        let detections: Vec<DetectionRecord> = data
            .iter()
            .take(faces)
            .enumerate()
            .map(|(i, landmarks)| {
                DetectionRecord::new(Rect2f::new(i as f32 * 150.0, 100.0, 140.0, 160.0), 0.9)
                    .with_landmarks(landmarks.clone())
            })
            .collect();

        for mode in [SmoothingMode::Shared, SmoothingMode::PerFace] {
            let mut smoothing = FaceSmoothing::new(mode, 0.7);
            group.bench_with_input(BenchmarkId::new(format!("{mode:?}"), faces), &detections, |b, detections| {
                b.iter(|| black_box(smoothing.smooth_all(black_box(detections))));
            });
        }
    }

    group.finish();
}

fn benchmark_placement(c: &mut Criterion) {
    let landmarks = noisy_sequences(1).remove(0);

    c.bench_function("placements_all", |b| {
        b.iter(|| black_box(placements_for(black_box(OverlayKind::All), black_box(&landmarks))));
    });
}

criterion_group!(benches, benchmark_smoother, benchmark_face_smoothing, benchmark_placement);
criterion_main!(benches);
