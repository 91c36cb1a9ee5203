use bitarray::{BitArray, Hamming};
use space::{Knn, LinearKnn};

use crate::db::ReferenceRecord;

/// A filtered match between one reference descriptor and its best query
/// neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// Index into the reference record's descriptor/keypoint arrays.
    pub reference_index: usize,
    /// Matched location in query image space.
    pub query_point: [f32; 2],
}

/// Matches every reference descriptor against the query set and keeps only
/// the unambiguous ones.
///
/// The direction is fixed reference→query: the verifier downstream needs
/// correspondences addressed by reference keypoint index. For each
/// reference descriptor the two nearest query neighbors are looked up and
/// the best one is accepted iff `d1 < ratio * d2` (Lowe's ratio test).
/// Reference descriptors with fewer than two neighbors are discarded.
/// Output order follows the reference descriptor index order.
pub fn filter_matches(
    record: &ReferenceRecord,
    query_keypoints: &[[f32; 2]],
    query_descriptors: &[BitArray<64>],
    ratio: f32,
) -> Vec<Correspondence> {
    if record.descriptors.is_empty() || query_descriptors.is_empty() {
        return Vec::new();
    }
    let knn = LinearKnn { metric: Hamming, iter: query_descriptors.iter() };
    let mut correspondences = Vec::new();
    for (reference_index, descriptor) in record.descriptors.iter().enumerate() {
        let neighbors = knn.knn(descriptor, 2);
        if neighbors.len() < 2 {
            continue;
        }
        if (neighbors[0].distance as f32) < ratio * neighbors[1].distance as f32 {
            correspondences.push(Correspondence {
                reference_index,
                query_point: query_keypoints[neighbors[0].index],
            });
        }
    }
    correspondences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::BoundingBox;

    fn descriptor_with_ones(ones: usize) -> BitArray<64> {
        let mut bytes = [0u8; 64];
        for i in 0..ones {
            bytes[i / 8] |= 1 << (i % 8);
        }
        BitArray::new(bytes)
    }

    fn record(descriptors: Vec<BitArray<64>>) -> ReferenceRecord {
        let keypoints = (0..descriptors.len()).map(|i| [i as f32, i as f32]).collect();
        ReferenceRecord {
            descriptors,
            keypoints,
            bbox: BoundingBox { x: 0, y: 0, width: 10, height: 10 },
        }
    }

    #[test]
    fn accepts_unambiguous_match() {
        let record = record(vec![descriptor_with_ones(0)]);
        // nearest at distance 0, second nearest at distance 200
        let query = vec![descriptor_with_ones(0), descriptor_with_ones(200)];
        let query_keypoints = vec![[7.0, 8.0], [100.0, 100.0]];

        let matches = filter_matches(&record, &query_keypoints, &query, 0.75);
        assert_eq!(
            matches,
            vec![Correspondence { reference_index: 0, query_point: [7.0, 8.0] }]
        );
    }

    #[test]
    fn rejects_ambiguous_match() {
        let record = record(vec![descriptor_with_ones(0)]);
        // distances 10 and 12: 10 >= 0.75 * 12
        let query = vec![descriptor_with_ones(10), descriptor_with_ones(12)];
        let query_keypoints = vec![[0.0, 0.0], [1.0, 1.0]];

        assert!(filter_matches(&record, &query_keypoints, &query, 0.75).is_empty());
    }

    #[test]
    fn discards_descriptors_with_single_neighbor() {
        let record = record(vec![descriptor_with_ones(0)]);
        let query = vec![descriptor_with_ones(0)];
        let query_keypoints = vec![[0.0, 0.0]];

        assert!(filter_matches(&record, &query_keypoints, &query, 0.75).is_empty());
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        let empty = record(vec![]);
        let query = vec![descriptor_with_ones(0), descriptor_with_ones(4)];
        let query_keypoints = vec![[0.0, 0.0], [1.0, 1.0]];
        assert!(filter_matches(&empty, &query_keypoints, &query, 0.75).is_empty());

        let nonempty = record(vec![descriptor_with_ones(0)]);
        assert!(filter_matches(&nonempty, &[], &[], 0.75).is_empty());
    }

    #[test]
    fn output_follows_reference_index_order() {
        let record = record(vec![
            descriptor_with_ones(0),
            descriptor_with_ones(128),
            descriptor_with_ones(256),
        ]);
        // each reference descriptor has an exact copy in the query set,
        // far from every other query descriptor
        let query = vec![
            descriptor_with_ones(256),
            descriptor_with_ones(0),
            descriptor_with_ones(128),
        ];
        let query_keypoints = vec![[2.0, 2.0], [0.0, 0.0], [1.0, 1.0]];

        let matches = filter_matches(&record, &query_keypoints, &query, 0.75);
        let indices: Vec<usize> = matches.iter().map(|m| m.reference_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(matches[0].query_point, [0.0, 0.0]);
        assert_eq!(matches[1].query_point, [1.0, 1.0]);
        assert_eq!(matches[2].query_point, [2.0, 2.0]);
    }

    #[test]
    fn lowering_ratio_never_accepts_more() {
        let record = record(vec![
            descriptor_with_ones(0),
            descriptor_with_ones(40),
            descriptor_with_ones(80),
            descriptor_with_ones(120),
        ]);
        let query = vec![
            descriptor_with_ones(4),
            descriptor_with_ones(36),
            descriptor_with_ones(90),
            descriptor_with_ones(140),
            descriptor_with_ones(300),
        ];
        let query_keypoints: Vec<[f32; 2]> =
            (0..query.len()).map(|i| [i as f32, 0.0]).collect();

        let mut previous = usize::MAX;
        for ratio in [0.9, 0.75, 0.6, 0.4, 0.2] {
            let count = filter_matches(&record, &query_keypoints, &query, ratio).len();
            assert!(count <= previous, "ratio {ratio} accepted more matches");
            previous = count;
        }
    }
}
