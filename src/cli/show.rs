use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::db;

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {}

impl SubCommandExtend for ShowCommand {
    fn run(&self, opts: &Opts) -> Result<()> {
        let records = db::load(&opts.database).with_context(|| {
            format!("failed to load reference database {}", opts.database.display())
        })?;
        println!("{} reference records in {}", records.len(), opts.database.display());
        for (index, record) in records.iter().enumerate() {
            let b = record.bbox;
            println!(
                "{index}\t{} features\tbbox {}x{}+{}+{}",
                record.descriptors.len(),
                b.width,
                b.height,
                b.x,
                b.y
            );
        }
        Ok(())
    }
}
