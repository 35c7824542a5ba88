use crate::driver::{PackageFailure, RunSummary};
use colored::Colorize;

pub fn format_failure(failure: &PackageFailure, color: bool) -> String {
    let label = if color {
        "error".red().bold().to_string()
    } else {
        "error".to_string()
    };
    let package = if color {
        failure.package.bold().to_string()
    } else {
        failure.package.clone()
    };
    // Multi-line messages are indented under the package name.
    let message = failure.error.to_string().replace('\n', "\n    ");
    format!("{package} - {label}: {message}")
}

pub fn format_summary(summary: &RunSummary, color: bool) -> String {
    let built = summary.packages.len();
    let failed = summary.failures.len();
    let text = format!("{built} package(s) built, {failed} failed");
    if !color {
        text
    } else if failed == 0 {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}
