//! Runs the resolver over every package of a types directory.

use crate::args::CliArgs;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use typings_meta::settings::parse_whitelist;
use typings_meta::{DiskTree, Settings, TypingsError, TypingsVersions, build_package};

#[derive(Debug)]
pub struct PackageFailure {
    pub package: String,
    pub error: TypingsError,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// Records of every package that built cleanly, by package name.
    pub packages: BTreeMap<String, TypingsVersions>,
    /// Failed packages, sorted by name.
    pub failures: Vec<PackageFailure>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// `{ "<package>": { "<major>": record } }`
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.packages).context("failed to serialize package records")
    }
}

pub fn run(args: &CliArgs) -> Result<RunSummary> {
    let settings = load_settings(args.whitelist.as_deref())?;
    let names = discover_packages(&args.types_root, &args.packages)?;
    info!(root = %args.types_root.display(), packages = names.len(), "scanning");

    match args.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("failed to start worker threads")?;
            Ok(pool.install(|| build_all(&args.types_root, &names, &settings)))
        }
        None => Ok(build_all(&args.types_root, &names, &settings)),
    }
}

pub fn load_settings(whitelist: Option<&Path>) -> Result<Settings> {
    let Some(path) = whitelist else {
        return Ok(Settings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read whitelist {}", path.display()))?;
    Ok(Settings::default().with_dependency_whitelist(parse_whitelist(&text)))
}

/// Package directory names under `root`, sorted. Hidden entries and plain
/// files are skipped. A non-empty `only` list is checked and returned as-is.
pub fn discover_packages(root: &Path, only: &[String]) -> Result<Vec<String>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    if !only.is_empty() {
        for name in only {
            if !root.join(name).is_dir() {
                bail!("package {name} not found in {}", root.display());
            }
        }
        let mut names = only.to_vec();
        names.sort();
        names.dedup();
        return Ok(names);
    }

    let mut names = Vec::new();
    let entries =
        std::fs::read_dir(root).with_context(|| format!("failed to list {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", root.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn build_all(root: &Path, names: &[String], settings: &Settings) -> RunSummary {
    let results: Vec<(String, typings_meta::Result<TypingsVersions>)> = names
        .par_iter()
        .map(|name| {
            let tree = DiskTree::new(root.join(name));
            (name.clone(), build_package(name, &tree, settings))
        })
        .collect();

    let mut summary = RunSummary::default();
    for (package, result) in results {
        match result {
            Ok(versions) => {
                debug!(package = %package, versions = versions.len(), "ok");
                summary.packages.insert(package, versions);
            }
            Err(error) => {
                warn!(package = %package, %error, "failed");
                summary.failures.push(PackageFailure { package, error });
            }
        }
    }
    summary
}

pub fn write_output(summary: &RunSummary, output: Option<&Path>) -> Result<()> {
    let json = summary.to_json()?;
    match output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
