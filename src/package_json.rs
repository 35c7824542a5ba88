//! Optional `package.json` next to a package's `index.d.ts`.

use crate::error::{Result, TypingsError};
use crate::packages::{License, PackageJsonDependency};
use crate::settings::Settings;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageJsonInfo {
    pub license: License,
    pub dependencies: Vec<PackageJsonDependency>,
}

/// Validate `license` and `dependencies` of a parsed `package.json`.
/// Other fields are ignored.
pub fn check_package_json(value: &Value, path: &str, settings: &Settings) -> Result<PackageJsonInfo> {
    let object = value
        .as_object()
        .ok_or_else(|| TypingsError::InvalidPackageJson {
            path: path.to_string(),
        })?;
    let license = license_from_package_json(object.get("license"), path)?;
    let dependencies = check_dependencies(object.get("dependencies"), path, settings)?;
    Ok(PackageJsonInfo {
        license,
        dependencies,
    })
}

fn license_from_package_json(license: Option<&Value>, path: &str) -> Result<License> {
    match license {
        None | Some(Value::Null) => Ok(License::Mit),
        Some(Value::String(s)) if s == "MIT" => Err(TypingsError::RedundantLicense {
            path: path.to_string(),
        }),
        Some(Value::String(s)) if s == "Apache-2.0" => Ok(License::Apache20),
        Some(other) => Err(TypingsError::UnsupportedLicense {
            path: path.to_string(),
            license: match other {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            },
        }),
    }
}

fn check_dependencies(
    dependencies: Option<&Value>,
    path: &str,
    settings: &Settings,
) -> Result<Vec<PackageJsonDependency>> {
    let Some(dependencies) = dependencies else {
        return Ok(Vec::new());
    };
    let map = dependencies
        .as_object()
        .ok_or_else(|| TypingsError::InvalidPackageJson {
            path: path.to_string(),
        })?;

    let mut out = Vec::with_capacity(map.len());
    for (name, version) in map {
        if !settings.is_whitelisted_dependency(name) {
            return Err(TypingsError::DependencyNotWhitelisted {
                path: path.to_string(),
                dependency: name.clone(),
            });
        }
        let Value::String(version) = version else {
            return Err(TypingsError::InvalidDependencyVersion {
                path: path.to_string(),
                dependency: name.clone(),
            });
        };
        out.push(PackageJsonDependency {
            name: name.clone(),
            version: version.clone(),
        });
    }
    Ok(out)
}
