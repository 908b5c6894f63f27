use brrtconneg::cli::{run_cli, Cli};
use brrtconneg::logging::init_logging;
use brrtconneg::runtime_config::RuntimeConfig;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RuntimeConfig::from_env();
    if let Err(err) = init_logging(&config.log) {
        eprintln!("warning: {err:#}");
    }
    run_cli(cli)
}
