use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{info, warn};
use rayon::prelude::*;
use regex::Regex;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::cli::SubCommandExtend;
use crate::config::{ExtractOptions, Opts};
use crate::db::{self, BoundingBox, ReferenceRecord};
use crate::features::FeatureExtractor;
use crate::utils;

#[derive(Parser, Debug, Clone)]
pub struct TrainCommand {
    #[command(flatten)]
    pub extract: ExtractOptions,
    /// Directory with reference images and their JSON annotation sidecars
    pub path: PathBuf,
    /// File suffixes to scan, comma separated
    #[arg(short, long, default_value = "jpg,jpeg,png")]
    pub suffix: String,
    /// Minimum bounding box side in pixels, smaller boxes are skipped
    #[arg(long, value_name = "PIXELS", default_value_t = 10)]
    pub min_box: u32,
}

/// Annotation sidecar, same fields as the VOC `bndbox` element.
#[derive(Deserialize, Debug, Clone, Copy)]
struct Annotation {
    xmin: i32,
    ymin: i32,
    xmax: i32,
    ymax: i32,
}

impl SubCommandExtend for TrainCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let entries = scan_images(&self.path, &self.suffix);
        let extractor = FeatureExtractor::new(&self.extract);

        let pb = ProgressBar::new(entries.len() as u64).with_style(utils::pb_style());
        let records: Vec<ReferenceRecord> = entries
            .par_iter()
            .progress_with(pb.clone())
            .map(|path| match self.train_one(&extractor, path) {
                Ok(record) => record,
                Err(e) => {
                    warn!("{}: {e:#}", path.display());
                    None
                }
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        pb.finish_and_clear();

        db::save(&opts.database, &records)
            .with_context(|| format!("failed to write {}", opts.database.display()))?;
        info!("saved {} reference records to {}", records.len(), opts.database.display());
        Ok(())
    }
}

impl TrainCommand {
    fn train_one(
        &self,
        extractor: &FeatureExtractor,
        path: &Path,
    ) -> Result<Option<ReferenceRecord>> {
        let annotation_path = path.with_extension("json");
        if !annotation_path.exists() {
            warn!("{}: no annotation sidecar, skipped", path.display());
            return Ok(None);
        }
        let annotation: Annotation = serde_json::from_slice(&std::fs::read(&annotation_path)?)
            .with_context(|| format!("failed to parse {}", annotation_path.display()))?;

        let image = utils::imread(path)?;
        let Some(bbox) = clamp_box(annotation, image.width(), image.height(), self.min_box) else {
            warn!("{}: bounding box too small, skipped", path.display());
            return Ok(None);
        };

        let roi =
            image.crop_imm(bbox.x as u32, bbox.y as u32, bbox.width as u32, bbox.height as u32);
        let (keypoints, descriptors) = extractor.extract(&roi);
        if descriptors.is_empty() {
            warn!("{}: no descriptors detected, skipped", path.display());
            return Ok(None);
        }
        Ok(Some(ReferenceRecord { descriptors, keypoints, bbox }))
    }
}

/// Clamps a corner-format annotation to the image and converts it to
/// x/y/width/height form. Boxes smaller than `min_box` on either side are
/// dropped.
fn clamp_box(annotation: Annotation, width: u32, height: u32, min_box: u32) -> Option<BoundingBox> {
    let xmin = annotation.xmin.clamp(0, width as i32 - 1);
    let ymin = annotation.ymin.clamp(0, height as i32 - 1);
    let xmax = annotation.xmax.clamp(0, width as i32 - 1);
    let ymax = annotation.ymax.clamp(0, height as i32 - 1);
    if xmax - xmin < min_box as i32 || ymax - ymin < min_box as i32 {
        return None;
    }
    Some(BoundingBox { x: xmin, y: ymin, width: xmax - xmin, height: ymax - ymin })
}

/// Collects image files under `path` in a stable order.
pub(crate) fn scan_images(path: &Path, suffix: &str) -> Vec<PathBuf> {
    let re = Regex::new(&format!("(?i)^({})$", suffix.replace(',', "|")))
        .expect("failed to build regex");
    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension().map(|s| re.is_match(&s.to_string_lossy())) == Some(true)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_box_converts_and_clamps() {
        let annotation = Annotation { xmin: -5, ymin: 10, xmax: 700, ymax: 100 };
        let bbox = clamp_box(annotation, 640, 480, 10).unwrap();
        assert_eq!(bbox, BoundingBox { x: 0, y: 10, width: 639, height: 90 });
    }

    #[test]
    fn clamp_box_drops_small_boxes() {
        let annotation = Annotation { xmin: 0, ymin: 0, xmax: 5, ymax: 100 };
        assert!(clamp_box(annotation, 640, 480, 10).is_none());
    }
}
