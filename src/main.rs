use clap::Parser;
use emasweep::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
