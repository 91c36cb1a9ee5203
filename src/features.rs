use akaze::Akaze;
use bitarray::BitArray;
use image::DynamicImage;

use crate::config::ExtractOptions;

/// AKAZE-backed keypoint detection and descriptor computation.
pub struct FeatureExtractor {
    akaze: Akaze,
}

impl FeatureExtractor {
    pub fn new(options: &ExtractOptions) -> Self {
        Self { akaze: Akaze::new(options.akaze_threshold) }
    }

    /// Extracts keypoint locations and binary descriptors, index-aligned.
    ///
    /// A featureless image yields empty vectors, not an error.
    pub fn extract(&self, image: &DynamicImage) -> (Vec<[f32; 2]>, Vec<BitArray<64>>) {
        let (keypoints, descriptors) = self.akaze.extract(image);
        let points = keypoints.iter().map(|k| [k.point.0, k.point.1]).collect();
        (points, descriptors)
    }
}
