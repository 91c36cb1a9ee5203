use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::cli::{scan_images, SubCommandExtend};
use crate::config::{ExtractOptions, MatchOptions, Opts};
use crate::db;
use crate::features::FeatureExtractor;
use crate::geometry::Placement;
use crate::locate::Localizer;
use crate::utils;

#[derive(Parser, Debug, Clone)]
pub struct LocateCommand {
    #[command(flatten)]
    pub extract: ExtractOptions,
    #[command(flatten)]
    pub matching: MatchOptions,
    /// Query image, or a directory of query images
    pub path: PathBuf,
    /// File suffixes to scan when the path is a directory
    #[arg(short, long, default_value = "jpg,jpeg,png")]
    pub suffix: String,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value = "table")]
    pub output_format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}

impl SubCommandExtend for LocateCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let records = db::load(&opts.database).with_context(|| {
            format!("failed to load reference database {}", opts.database.display())
        })?;
        info!("loaded {} reference records", records.len());

        let localizer = Localizer::new(records, self.matching.clone());
        let extractor = FeatureExtractor::new(&self.extract);

        let entries = if self.path.is_file() {
            vec![self.path.clone()]
        } else {
            scan_images(&self.path, &self.suffix)
        };

        // query images are independent, failures never abort the batch
        entries.par_iter().for_each(|path| {
            if let Err(e) = self.locate_one(&localizer, &extractor, path) {
                warn!("{}: {e:#}", path.display());
            }
        });
        Ok(())
    }
}

impl LocateCommand {
    fn locate_one(
        &self,
        localizer: &Localizer,
        extractor: &FeatureExtractor,
        path: &Path,
    ) -> Result<()> {
        let image = utils::shrink_to(utils::imread(path)?, self.extract.max_size);
        let query_size = (image.width(), image.height());

        let (keypoints, descriptors) = extractor.extract(&image);
        if descriptors.is_empty() {
            warn!("{}: no features extracted", path.display());
            return Ok(());
        }
        debug!("{}: {} features", path.display(), descriptors.len());

        let placements = localizer.localize(&keypoints, &descriptors, query_size);
        self.print_placements(path, &placements)
    }

    fn print_placements(&self, path: &Path, placements: &[Placement]) -> Result<()> {
        match self.output_format {
            OutputFormat::Json => {
                let line = serde_json::json!({
                    "image": path.display().to_string(),
                    "placements": placements,
                });
                println!("{line}");
            }
            OutputFormat::Table => {
                for placement in placements {
                    let corners = placement
                        .corners
                        .iter()
                        .map(|c| format!("({:.1},{:.1})", c[0], c[1]))
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!(
                        "{}\t{}\t{}\t{}",
                        path.display(),
                        placement.record,
                        placement.inliers,
                        corners
                    );
                }
            }
        }
        Ok(())
    }
}
