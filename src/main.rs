use clap::Parser;

use imlocate::cli::SubCommandExtend;
use imlocate::config::SubCommand;
use imlocate::Opts;

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Train(cmd) => cmd.run(&opts),
        SubCommand::Locate(cmd) => cmd.run(&opts),
        SubCommand::Show(cmd) => cmd.run(&opts),
    }
}
