use clap::Parser;
use tradesetup::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    tradesetup::cli::init_logging();
    run(Cli::parse())
}
