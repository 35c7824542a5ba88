#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use typings_cli::args::CliArgs;
use typings_cli::{driver, reporter};

fn main() -> Result<()> {
    // Initialize tracing if TYPINGS_LOG or RUST_LOG is set.
    typings_meta::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let summary = driver::run(&args)?;
    driver::write_output(&summary, args.output.as_deref())?;

    let pretty = args
        .pretty
        .unwrap_or_else(|| std::io::stderr().is_terminal());
    for failure in &summary.failures {
        eprintln!("{}", reporter::format_failure(failure, pretty));
    }
    eprintln!("{}", reporter::format_summary(&summary, pretty));

    if summary.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
