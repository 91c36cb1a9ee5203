use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::*;

#[derive(Parser, Debug, Clone)]
#[command(name = "imlocate", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// Path of the reference database file
    #[arg(short, long, default_value = "references.db")]
    pub database: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// Build the reference database from a labeled image set
    Train(TrainCommand),
    /// Locate the trained reference objects in query images
    Locate(LocateCommand),
    /// Print a summary of the reference database
    Show(ShowCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractOptions {
    /// AKAZE detector threshold, lower values detect more features
    #[arg(long, value_name = "THRESHOLD", default_value_t = 0.001)]
    pub akaze_threshold: f64,
    /// Maximum query image size as WIDTHxHEIGHT, larger images are scaled down
    #[arg(short = 'S', long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1920x1080")]
    pub max_size: (u32, u32),
}

#[derive(Parser, Debug, Clone)]
pub struct MatchOptions {
    /// Nearest/second-nearest distance ratio below which a match is kept
    #[arg(long, value_name = "RATIO", default_value_t = 0.75)]
    pub ratio: f32,
    /// Minimum filtered matches before a homography is attempted
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub min_good_matches: usize,
    /// Reprojection error tolerance of the homography solver, in pixels
    #[arg(long, value_name = "PIXELS", default_value_t = 5.0)]
    pub reproj_threshold: f64,
    /// Minimum homography inliers to accept a placement
    #[arg(long, value_name = "N", default_value_t = 8)]
    pub min_inliers: usize,
    /// Number of RANSAC sampling rounds
    #[arg(long, value_name = "N", default_value_t = 2000)]
    pub max_iters: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            min_good_matches: 10,
            reproj_threshold: 5.0,
            min_inliers: 8,
            max_iters: 2000,
        }
    }
}

fn parse_size(s: &str) -> anyhow::Result<(u32, u32)> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid size: {}", s));
    }
    Ok((parts[0].parse()?, parts[1].parse()?))
}
