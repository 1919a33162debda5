use std::process::ExitCode;

use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let cli = ngextract::cli::Cli::parse();
    ngextract::init(cli.verbose);

    ngextract::cli::run(cli)
}
