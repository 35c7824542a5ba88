use crate::args::CliArgs;
use crate::driver::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use typings_meta::TypingsError;

const HEADER: &str = "// Type definitions for tiny 1.4\n\
                      // Project: https://tiny.example.com\n\
                      // Definitions by: Jane Doe <https://github.com/janedoe>\n\
                      // Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n";

fn write(root: &Path, path: &str, text: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, text).unwrap();
}

fn write_package(root: &Path, name: &str) {
    let header = HEADER.replace("tiny", name);
    write(root, &format!("{name}/index.d.ts"), &format!("{header}\nexport function f(): void;\n"));
    write(
        root,
        &format!("{name}/{name}-tests.ts"),
        &format!("import {{ f }} from '{name}';\nf();\n"),
    );
    write(
        root,
        &format!("{name}/tsconfig.json"),
        &format!("{{ \"files\": [\"index.d.ts\", \"{name}-tests.ts\"] }}\n"),
    );
}

fn args(root: &Path) -> CliArgs {
    CliArgs {
        types_root: root.to_path_buf(),
        packages: Vec::new(),
        whitelist: None,
        output: None,
        jobs: Some(2),
        pretty: Some(false),
    }
}

#[test]
fn discovers_package_directories_in_name_order() {
    let dir = TempDir::new().unwrap();
    write_package(dir.path(), "zeta");
    write_package(dir.path(), "alpha");
    write(dir.path(), ".hidden/index.d.ts", "");
    write(dir.path(), "README.md", "");

    let names = discover_packages(dir.path(), &[]).unwrap();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn explicit_packages_must_exist() {
    let dir = TempDir::new().unwrap();
    write_package(dir.path(), "alpha");

    let only = vec!["alpha".to_string(), "alpha".to_string()];
    assert_eq!(discover_packages(dir.path(), &only).unwrap(), vec!["alpha"]);

    let err = discover_packages(dir.path(), &["missing".to_string()]).unwrap_err();
    assert!(err.to_string().contains("package missing not found"));
}

#[test]
fn failures_do_not_stop_other_packages() {
    let dir = TempDir::new().unwrap();
    write_package(dir.path(), "good");
    write_package(dir.path(), "bad");
    write(dir.path(), "bad/stray.d.ts", "export {};\n");

    let summary = run(&args(dir.path())).unwrap();
    assert_eq!(summary.packages.keys().collect::<Vec<_>>(), vec!["good"]);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].package, "bad");
    assert!(matches!(summary.failures[0].error, TypingsError::UnusedFile { .. }));
    assert!(summary.has_failures());
}

#[test]
fn output_is_keyed_by_package_then_major_version() {
    let dir = TempDir::new().unwrap();
    write_package(dir.path(), "good");
    let summary = run(&args(dir.path())).unwrap();

    let out = dir.path().join("out.json");
    write_output(&summary, Some(&out)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let record = &json["good"]["1"];
    assert_eq!(record["typingsPackageName"], "good");
    assert_eq!(record["libraryMinorVersion"], 4);
    assert_eq!(record["files"], serde_json::json!(["index.d.ts"]));
}

#[test]
fn whitelist_file_replaces_the_default_list() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("whitelist.txt");
    fs::write(&path, "# allowed\nleft-pad\n").unwrap();

    let settings = load_settings(Some(&path)).unwrap();
    assert!(settings.is_whitelisted_dependency("left-pad"));
    assert!(!settings.is_whitelisted_dependency("moment"));

    assert!(load_settings(Some(&dir.path().join("nope.txt"))).is_err());
}
