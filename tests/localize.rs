use std::cell::Cell;
use std::rc::Rc;

use bitarray::BitArray;
use imlocate::config::MatchOptions;
use imlocate::db::{BoundingBox, ReferenceRecord};
use imlocate::homography::{Homography, HomographyEstimator};
use imlocate::Localizer;

/// Synthetic binary descriptor. Distinct indices give every byte a distinct
/// value, so any two descriptors are at least 64 bits apart while an exact
/// copy matches at distance zero.
fn descriptor(index: usize) -> BitArray<64> {
    let mut bytes = [0u8; 64];
    for (j, b) in bytes.iter_mut().enumerate() {
        *b = index.wrapping_mul(31).wrapping_add(j.wrapping_mul(17)) as u8;
    }
    BitArray::new(bytes)
}

fn grid(count: usize, columns: usize, spacing: f32) -> Vec<[f32; 2]> {
    (0..count)
        .map(|i| [(i % columns) as f32 * spacing, (i / columns) as f32 * spacing])
        .collect()
}

fn translate(points: &[[f32; 2]], dx: f32, dy: f32) -> Vec<[f32; 2]> {
    points.iter().map(|p| [p[0] + dx, p[1] + dy]).collect()
}

struct CountingEstimator {
    calls: Rc<Cell<usize>>,
}

impl CountingEstimator {
    fn new() -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (Self { calls: calls.clone() }, calls)
    }
}

impl HomographyEstimator for CountingEstimator {
    fn estimate(&self, _src: &[[f64; 2]], _dst: &[[f64; 2]]) -> Option<Homography> {
        self.calls.set(self.calls.get() + 1);
        None
    }
}

#[test]
fn single_record_with_outlier_matches_is_placed_once() {
    let keypoints = grid(40, 8, 25.0);
    let descriptors: Vec<BitArray<64>> = (0..40).map(descriptor).collect();
    let record = ReferenceRecord {
        descriptors: descriptors.clone(),
        keypoints: keypoints.clone(),
        bbox: BoundingBox { x: 0, y: 0, width: 200, height: 120 },
    };

    // exact copies translated by (30, 40); the last ten query locations are
    // scattered, so they match by descriptor but disagree geometrically
    let mut query_keypoints = translate(&keypoints, 30.0, 40.0);
    for (i, point) in query_keypoints.iter_mut().enumerate().skip(30) {
        *point = [450.0 + (i * 37 % 100) as f32, 50.0 + (i * 61 % 300) as f32];
    }

    let localizer = Localizer::new(vec![record], MatchOptions::default());
    let placements = localizer.localize(&query_keypoints, &descriptors, (640, 480));

    assert_eq!(placements.len(), 1);
    let placement = &placements[0];
    assert_eq!(placement.record, 0);
    assert_eq!(placement.inliers, 30);
    for corner in &placement.corners {
        assert!(corner[0].is_finite() && corner[1].is_finite());
        assert!(corner[0] >= 0.0 && corner[0] < 640.0);
        assert!(corner[1] >= 0.0 && corner[1] < 480.0);
    }
    let expected = [[30.0, 40.0], [230.0, 40.0], [230.0, 160.0], [30.0, 160.0]];
    for (corner, expected) in placement.corners.iter().zip(&expected) {
        assert!((corner[0] - expected[0]).abs() < 0.5, "{corner:?} vs {expected:?}");
        assert!((corner[1] - expected[1]).abs() < 0.5, "{corner:?} vs {expected:?}");
    }
}

#[test]
fn two_records_are_placed_independently() {
    let keypoints_a = grid(40, 8, 25.0);
    let descriptors_a: Vec<BitArray<64>> = (0..40).map(descriptor).collect();
    let keypoints_b = grid(30, 6, 20.0);
    let descriptors_b: Vec<BitArray<64>> = (0..30).map(|i| descriptor(100 + i)).collect();

    let records = vec![
        ReferenceRecord {
            descriptors: descriptors_a.clone(),
            keypoints: keypoints_a.clone(),
            bbox: BoundingBox { x: 0, y: 0, width: 200, height: 120 },
        },
        ReferenceRecord {
            descriptors: descriptors_b.clone(),
            keypoints: keypoints_b.clone(),
            bbox: BoundingBox { x: 40, y: 60, width: 120, height: 100 },
        },
    ];

    // both objects appear in the same query image at different offsets
    let mut query_keypoints = translate(&keypoints_a, 20.0, 30.0);
    query_keypoints.extend(translate(&keypoints_b, 300.0, 250.0));
    let mut query_descriptors = descriptors_a;
    query_descriptors.extend(descriptors_b);

    let localizer = Localizer::new(records, MatchOptions::default());
    let placements = localizer.localize(&query_keypoints, &query_descriptors, (640, 480));

    assert_eq!(placements.len(), 2);
    assert_eq!(placements[0].record, 0);
    assert_eq!(placements[1].record, 1);

    let top_left_a = placements[0].corners[0];
    assert!((top_left_a[0] - 20.0).abs() < 0.5);
    assert!((top_left_a[1] - 30.0).abs() < 0.5);
    let top_left_b = placements[1].corners[0];
    assert!((top_left_b[0] - 300.0).abs() < 0.5);
    assert!((top_left_b[1] - 250.0).abs() < 0.5);
}

#[test]
fn featureless_query_short_circuits() {
    let record = ReferenceRecord {
        descriptors: (0..40).map(descriptor).collect(),
        keypoints: grid(40, 8, 25.0),
        bbox: BoundingBox { x: 0, y: 0, width: 200, height: 120 },
    };
    let (estimator, calls) = CountingEstimator::new();
    let localizer =
        Localizer::with_estimator(vec![record], MatchOptions::default(), estimator);

    let placements = localizer.localize(&[], &[], (640, 480));
    assert!(placements.is_empty());
    assert_eq!(calls.get(), 0);
}

#[test]
fn records_without_features_are_skipped() {
    let empty = ReferenceRecord {
        descriptors: vec![],
        keypoints: vec![],
        bbox: BoundingBox { x: 0, y: 0, width: 50, height: 50 },
    };
    let (estimator, calls) = CountingEstimator::new();
    let localizer = Localizer::with_estimator(vec![empty], MatchOptions::default(), estimator);

    let query_descriptors: Vec<BitArray<64>> = (0..5).map(descriptor).collect();
    let query_keypoints = grid(5, 5, 10.0);
    let placements = localizer.localize(&query_keypoints, &query_descriptors, (640, 480));
    assert!(placements.is_empty());
    assert_eq!(calls.get(), 0);
}
