use bitarray::BitArray;
use log::debug;

use crate::config::MatchOptions;
use crate::db::ReferenceRecord;
use crate::geometry::{self, Placement};
use crate::homography::{HomographyEstimator, RansacHomography};
use crate::matching;

/// Runs the per-record match/verify pipeline over a loaded reference
/// database.
///
/// The record set is immutable for the lifetime of the localizer; every
/// query image is evaluated independently of previous queries.
pub struct Localizer<E = RansacHomography> {
    records: Vec<ReferenceRecord>,
    options: MatchOptions,
    estimator: E,
}

impl Localizer {
    pub fn new(records: Vec<ReferenceRecord>, options: MatchOptions) -> Self {
        let estimator = RansacHomography {
            reproj_threshold: options.reproj_threshold,
            max_iters: options.max_iters,
        };
        Self { records, options, estimator }
    }
}

impl<E: HomographyEstimator> Localizer<E> {
    /// Replaces the default RANSAC solver, mainly for tests and callers
    /// bringing their own estimator.
    pub fn with_estimator(
        records: Vec<ReferenceRecord>,
        options: MatchOptions,
        estimator: E,
    ) -> Self {
        Self { records, options, estimator }
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    /// Locates every reference record in one query image.
    ///
    /// Each record is accepted or rejected on its own merits, so several
    /// distinct objects can be found in the same image. A query with no
    /// descriptors short-circuits to zero placements without touching the
    /// filter or the verifier. Records with no stored features are skipped.
    pub fn localize(
        &self,
        query_keypoints: &[[f32; 2]],
        query_descriptors: &[BitArray<64>],
        query_size: (u32, u32),
    ) -> Vec<Placement> {
        if query_descriptors.is_empty() {
            return Vec::new();
        }
        let mut placements = Vec::new();
        for (index, record) in self.records.iter().enumerate() {
            if record.descriptors.is_empty() || record.keypoints.is_empty() {
                debug!("record {index}: no stored features, skipped");
                continue;
            }
            let correspondences = matching::filter_matches(
                record,
                query_keypoints,
                query_descriptors,
                self.options.ratio,
            );
            match geometry::verify(
                index,
                &correspondences,
                &record.keypoints,
                &record.bbox,
                query_size,
                &self.options,
                &self.estimator,
            ) {
                Ok(placement) => {
                    debug!("record {index}: accepted with {} inliers", placement.inliers);
                    placements.push(placement);
                }
                Err(rejection) => debug!("record {index}: {rejection}"),
            }
        }
        placements
    }
}
