use std::fs;
use std::path::Path;

use bitarray::BitArray;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Width of one stored descriptor in bytes (AKAZE M-LDB).
pub const DESCRIPTOR_SIZE: usize = 64;

const MAGIC: &[u8; 4] = b"IMLC";
const VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum DbError {
    /// A persisted record failed to parse or violates a stored-field invariant.
    #[error("corrupt database: {0}")]
    Corrupt(String),
    #[error("failed to encode database: {0}")]
    Encode(#[from] bincode::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Axis-aligned bounding box in reference image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Stored features of one trained reference object.
///
/// `keypoints[i]` is the pixel location that produced `descriptors[i]`.
/// The two arrays are index-aligned and must never be permuted
/// independently, the geometric verifier addresses both by the same index.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    /// One binary descriptor per keypoint.
    pub descriptors: Vec<BitArray<64>>,
    /// Keypoint coordinates, relative to the bounding box origin.
    pub keypoints: Vec<[f32; 2]>,
    /// Object bounds in the reference image.
    pub bbox: BoundingBox,
}

/// Wire form of a record: flat byte/coordinate blocks, validated on load.
#[derive(Debug, Serialize, Deserialize)]
struct RawRecord {
    descriptors: Vec<u8>,
    keypoints: Vec<f32>,
    bbox: Vec<i32>,
}

impl ReferenceRecord {
    fn to_raw(&self) -> RawRecord {
        RawRecord {
            descriptors: self.descriptors.iter().flat_map(|d| d.bytes().iter().copied()).collect(),
            keypoints: self.keypoints.iter().flat_map(|k| [k[0], k[1]]).collect(),
            bbox: vec![self.bbox.x, self.bbox.y, self.bbox.width, self.bbox.height],
        }
    }

    fn from_raw(index: usize, raw: RawRecord) -> Result<Self, DbError> {
        if raw.descriptors.len() % DESCRIPTOR_SIZE != 0 {
            return Err(DbError::Corrupt(format!(
                "record {index}: descriptor block of {} bytes is not a multiple of {DESCRIPTOR_SIZE}",
                raw.descriptors.len()
            )));
        }
        if raw.keypoints.len() % 2 != 0 {
            return Err(DbError::Corrupt(format!(
                "record {index}: odd keypoint coordinate count {}",
                raw.keypoints.len()
            )));
        }
        if raw.bbox.len() < 4 {
            return Err(DbError::Corrupt(format!(
                "record {index}: bounding box has {} of 4 components",
                raw.bbox.len()
            )));
        }
        let descriptors: Vec<BitArray<64>> = raw
            .descriptors
            .chunks_exact(DESCRIPTOR_SIZE)
            .map(|chunk| {
                let mut bytes = [0u8; DESCRIPTOR_SIZE];
                bytes.copy_from_slice(chunk);
                BitArray::new(bytes)
            })
            .collect();
        let keypoints: Vec<[f32; 2]> =
            raw.keypoints.chunks_exact(2).map(|pair| [pair[0], pair[1]]).collect();
        if descriptors.len() != keypoints.len() {
            return Err(DbError::Corrupt(format!(
                "record {index}: {} descriptors but {} keypoints",
                descriptors.len(),
                keypoints.len()
            )));
        }
        let bbox =
            BoundingBox { x: raw.bbox[0], y: raw.bbox[1], width: raw.bbox[2], height: raw.bbox[3] };
        Ok(Self { descriptors, keypoints, bbox })
    }
}

/// Writes `records` to `path`, replacing any existing file.
///
/// The format is a magic/version header followed by the bincode-framed
/// record sequence, so the record count is explicit. `load` is the exact
/// inverse.
pub fn save(path: impl AsRef<Path>, records: &[ReferenceRecord]) -> Result<(), DbError> {
    let raw: Vec<RawRecord> = records.iter().map(ReferenceRecord::to_raw).collect();
    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(MAGIC);
    bincode::serialize_into(&mut data, &VERSION)?;
    bincode::serialize_into(&mut data, &raw)?;
    fs::write(path, data)?;
    Ok(())
}

/// Loads a reference database written by `save`, falling back to the legacy
/// keyed layout for files without the magic header.
///
/// An empty database is valid. Any malformed record aborts the load with
/// `DbError::Corrupt`, records are never partially reconstructed.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<ReferenceRecord>, DbError> {
    let data = fs::read(path)?;
    if !data.starts_with(MAGIC) {
        return load_legacy(&data);
    }
    let mut reader = &data[MAGIC.len()..];
    let version: u32 = bincode::deserialize_from(&mut reader)
        .map_err(|e| DbError::Corrupt(format!("bad header: {e}")))?;
    if version != VERSION {
        return Err(DbError::Corrupt(format!("unsupported database version {version}")));
    }
    let raw: Vec<RawRecord> = bincode::deserialize_from(&mut reader)
        .map_err(|e| DbError::Corrupt(e.to_string()))?;
    raw.into_iter().enumerate().map(|(i, r)| ReferenceRecord::from_raw(i, r)).collect()
}

/// Reads the keyed layout produced by older training tools: a JSON document
/// with `descriptor_i`, `keypoints_i` and `bbox_i` entries addressed by an
/// integer suffix. Records are read in index order; the first index whose
/// descriptor entry is absent or empty marks the end of the data, not an
/// error. Legacy bounding boxes are corner format `[xmin, ymin, xmax, ymax]`
/// and are converted on load.
fn load_legacy(data: &[u8]) -> Result<Vec<ReferenceRecord>, DbError> {
    let doc: serde_json::Map<String, Value> = serde_json::from_slice(data)
        .map_err(|e| DbError::Corrupt(format!("not a recognized database format: {e}")))?;
    let mut records = Vec::new();
    for index in 0.. {
        let descriptors = match doc.get(&format!("descriptor_{index}")) {
            None => break,
            Some(value) => byte_array(index, "descriptor", value)?,
        };
        if descriptors.is_empty() {
            break;
        }
        let keypoints = match doc.get(&format!("keypoints_{index}")) {
            None => {
                return Err(DbError::Corrupt(format!("record {index}: missing keypoints entry")))
            }
            Some(value) => float_array(index, value)?,
        };
        let corners = match doc.get(&format!("bbox_{index}")) {
            None => {
                return Err(DbError::Corrupt(format!("record {index}: missing bounding box entry")))
            }
            Some(value) => int_array(index, value)?,
        };
        if corners.len() < 4 {
            return Err(DbError::Corrupt(format!(
                "record {index}: bounding box has {} of 4 components",
                corners.len()
            )));
        }
        let bbox = vec![
            corners[0],
            corners[1],
            corners[2] - corners[0],
            corners[3] - corners[1],
        ];
        records.push(ReferenceRecord::from_raw(
            index,
            RawRecord { descriptors, keypoints, bbox },
        )?);
    }
    Ok(records)
}

fn byte_array(index: usize, field: &str, value: &Value) -> Result<Vec<u8>, DbError> {
    let items = value.as_array().ok_or_else(|| {
        DbError::Corrupt(format!("record {index}: {field} entry is not an array"))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_u64().and_then(|v| u8::try_from(v).ok()).ok_or_else(|| {
                DbError::Corrupt(format!("record {index}: {field} entry holds a non-byte value"))
            })
        })
        .collect()
}

fn float_array(index: usize, value: &Value) -> Result<Vec<f32>, DbError> {
    let items = value.as_array().ok_or_else(|| {
        DbError::Corrupt(format!("record {index}: keypoints entry is not an array"))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_f64().map(|v| v as f32).ok_or_else(|| {
                DbError::Corrupt(format!("record {index}: keypoints entry holds a non-number"))
            })
        })
        .collect()
}

fn int_array(index: usize, value: &Value) -> Result<Vec<i32>, DbError> {
    let items = value.as_array().ok_or_else(|| {
        DbError::Corrupt(format!("record {index}: bounding box entry is not an array"))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_i64().and_then(|v| i32::try_from(v).ok()).ok_or_else(|| {
                DbError::Corrupt(format!("record {index}: bounding box holds a non-integer value"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(seed: u8) -> BitArray<64> {
        let mut bytes = [0u8; DESCRIPTOR_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = seed.wrapping_mul(31).wrapping_add(i as u8);
        }
        BitArray::new(bytes)
    }

    fn sample_records() -> Vec<ReferenceRecord> {
        vec![
            ReferenceRecord {
                descriptors: vec![descriptor(1), descriptor(2)],
                keypoints: vec![[1.5, 2.5], [3.0, 4.0]],
                bbox: BoundingBox { x: 10, y: 20, width: 100, height: 50 },
            },
            // a record with zero keypoints is legal
            ReferenceRecord {
                descriptors: vec![],
                keypoints: vec![],
                bbox: BoundingBox { x: 0, y: 0, width: 30, height: 30 },
            },
        ]
    }

    #[test]
    fn round_trip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.db");
        let records = sample_records();
        save(&path, &records).unwrap();
        assert_eq!(load(&path).unwrap(), records);
    }

    #[test]
    fn round_trip_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.db");
        save(&path, &[]).unwrap();
        assert_eq!(load(&path).unwrap(), vec![]);
    }

    fn write_raw(path: &Path, raw: Vec<RawRecord>) {
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC);
        bincode::serialize_into(&mut data, &VERSION).unwrap();
        bincode::serialize_into(&mut data, &raw).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn truncated_descriptor_block_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.db");
        write_raw(
            &path,
            vec![RawRecord {
                descriptors: vec![0u8; DESCRIPTOR_SIZE + 1],
                keypoints: vec![1.0, 2.0],
                bbox: vec![0, 0, 10, 10],
            }],
        );
        assert!(matches!(load(&path), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn odd_keypoint_count_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.db");
        write_raw(
            &path,
            vec![RawRecord {
                descriptors: vec![0u8; DESCRIPTOR_SIZE],
                keypoints: vec![1.0, 2.0, 3.0],
                bbox: vec![0, 0, 10, 10],
            }],
        );
        assert!(matches!(load(&path), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn short_bounding_box_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.db");
        write_raw(
            &path,
            vec![RawRecord {
                descriptors: vec![0u8; DESCRIPTOR_SIZE],
                keypoints: vec![1.0, 2.0],
                bbox: vec![0, 0, 10],
            }],
        );
        assert!(matches!(load(&path), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn mismatched_keypoint_count_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.db");
        write_raw(
            &path,
            vec![RawRecord {
                descriptors: vec![0u8; 2 * DESCRIPTOR_SIZE],
                keypoints: vec![1.0, 2.0],
                bbox: vec![0, 0, 10, 10],
            }],
        );
        assert!(matches!(load(&path), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.db");
        fs::write(&path, b"not a database").unwrap();
        assert!(matches!(load(&path), Err(DbError::Corrupt(_))));
    }

    fn legacy_record(descriptors: usize) -> (Vec<u8>, Vec<f64>, Vec<i64>) {
        let bytes: Vec<u8> = (0..descriptors * DESCRIPTOR_SIZE).map(|i| i as u8).collect();
        let coords: Vec<f64> = (0..descriptors * 2).map(|i| i as f64 + 0.5).collect();
        (bytes, coords, vec![5, 6, 25, 36])
    }

    #[test]
    fn legacy_reader_converts_corner_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let (bytes, coords, corners) = legacy_record(2);
        let doc = serde_json::json!({
            "descriptor_0": bytes,
            "keypoints_0": coords,
            "bbox_0": corners,
        });
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let records = load(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].descriptors.len(), 2);
        assert_eq!(records[0].keypoints[0], [0.5, 1.5]);
        assert_eq!(records[0].bbox, BoundingBox { x: 5, y: 6, width: 20, height: 30 });
    }

    #[test]
    fn legacy_reader_stops_at_first_missing_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let (bytes, coords, corners) = legacy_record(1);
        // index 2 is unreachable because index 1 is missing
        let doc = serde_json::json!({
            "descriptor_0": bytes,
            "keypoints_0": coords,
            "bbox_0": corners,
            "descriptor_2": bytes,
            "keypoints_2": coords,
            "bbox_2": corners,
        });
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        assert_eq!(load(&path).unwrap().len(), 1);
    }

    #[test]
    fn legacy_reader_treats_empty_descriptor_block_as_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let (bytes, coords, corners) = legacy_record(1);
        let doc = serde_json::json!({
            "descriptor_0": bytes,
            "keypoints_0": coords,
            "bbox_0": corners,
            "descriptor_1": [],
            "keypoints_1": [],
            "bbox_1": corners,
        });
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        assert_eq!(load(&path).unwrap().len(), 1);
    }

    #[test]
    fn legacy_reader_rejects_odd_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let (bytes, _, corners) = legacy_record(1);
        let doc = serde_json::json!({
            "descriptor_0": bytes,
            "keypoints_0": [1.0, 2.0, 3.0],
            "bbox_0": corners,
        });
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        assert!(matches!(load(&path), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn legacy_reader_rejects_short_bounding_box() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let (bytes, coords, _) = legacy_record(1);
        let doc = serde_json::json!({
            "descriptor_0": bytes,
            "keypoints_0": coords,
            "bbox_0": [5, 6, 25],
        });
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        assert!(matches!(load(&path), Err(DbError::Corrupt(_))));
    }
}
