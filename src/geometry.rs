use std::fmt;

use serde::Serialize;

use crate::config::MatchOptions;
use crate::db::BoundingBox;
use crate::homography::{project_point, HomographyEstimator};
use crate::matching::Correspondence;

/// An accepted, geometrically verified location of one reference object in
/// a query image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    /// Index of the matched record in the database.
    pub record: usize,
    /// Projected bounding box corners in query image space, in order
    /// top-left, top-right, bottom-right, bottom-left.
    pub corners: [[f64; 2]; 4],
    /// Correspondences consistent with the estimated homography.
    pub inliers: usize,
}

/// Why a candidate record produced no placement. These are expected
/// outcomes of verification, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Fewer filtered correspondences than `min_good_matches`.
    TooFewMatches(usize),
    /// The solver reported no homography for the correspondence set.
    NoHomography,
    /// The homography is supported by fewer inliers than `min_inliers`.
    TooFewInliers(usize),
    /// A projected corner is non-finite or outside the query image.
    InvalidGeometry,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooFewMatches(count) => write!(f, "only {count} good matches"),
            Rejection::NoHomography => write!(f, "no homography found"),
            Rejection::TooFewInliers(count) => write!(f, "only {count} inliers"),
            Rejection::InvalidGeometry => write!(f, "projected corners out of bounds"),
        }
    }
}

/// Verifies the correspondences for one record and turns them into an
/// accepted placement or a rejection.
///
/// Gates run in order: correspondence count, homography existence, inlier
/// count, projected geometry. The estimator is not invoked when the
/// correspondence gate fails. Bounding box corners are expressed relative
/// to the box origin, matching the stored keypoint coordinates.
pub fn verify(
    record_index: usize,
    correspondences: &[Correspondence],
    keypoints: &[[f32; 2]],
    bbox: &BoundingBox,
    query_size: (u32, u32),
    options: &MatchOptions,
    estimator: &impl HomographyEstimator,
) -> Result<Placement, Rejection> {
    if correspondences.len() < options.min_good_matches {
        return Err(Rejection::TooFewMatches(correspondences.len()));
    }

    let src: Vec<[f64; 2]> = correspondences
        .iter()
        .map(|c| {
            let k = keypoints[c.reference_index];
            [k[0] as f64, k[1] as f64]
        })
        .collect();
    let dst: Vec<[f64; 2]> = correspondences
        .iter()
        .map(|c| [c.query_point[0] as f64, c.query_point[1] as f64])
        .collect();

    let homography = estimator.estimate(&src, &dst).ok_or(Rejection::NoHomography)?;
    let inliers = homography.inlier_count();
    if inliers < options.min_inliers {
        return Err(Rejection::TooFewInliers(inliers));
    }

    let (w, h) = (bbox.width as f64, bbox.height as f64);
    let corners =
        [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]].map(|c| project_point(&homography.matrix, c));

    let (query_w, query_h) = (query_size.0 as f64, query_size.1 as f64);
    let inside = |p: &[f64; 2]| {
        p[0].is_finite()
            && p[1].is_finite()
            && p[0] >= 0.0
            && p[1] >= 0.0
            && p[0] < query_w
            && p[1] < query_h
    };
    if !corners.iter().all(inside) {
        return Err(Rejection::InvalidGeometry);
    }

    Ok(Placement { record: record_index, corners, inliers })
}
