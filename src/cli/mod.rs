mod locate;
mod show;
mod train;

pub use locate::*;
pub use show::*;
pub use train::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}
