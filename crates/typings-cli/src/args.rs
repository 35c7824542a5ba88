use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the typings-meta binary.
#[derive(Parser, Debug)]
#[command(
    name = "typings-meta",
    version,
    about = "Extract and validate metadata of DefinitelyTyped-style typings packages"
)]
pub struct CliArgs {
    /// Directory holding one sub-directory per typings package (e.g. `DefinitelyTyped/types`).
    pub types_root: PathBuf,

    /// Only process this package. May be given more than once.
    #[arg(short = 'p', long = "package")]
    pub packages: Vec<String>,

    /// Newline-delimited list of libraries allowed in a package's `package.json`.
    /// Replaces the built-in list.
    #[arg(long)]
    pub whitelist: Option<PathBuf>,

    /// Write the JSON result to this file instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Number of worker threads. Defaults to the number of CPUs.
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Colorize failure reports. Defaults to on when stderr is a terminal.
    #[arg(long)]
    pub pretty: Option<bool>,
}
