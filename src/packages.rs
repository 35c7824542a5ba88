//! Records produced for each typings package.

use crate::header::Contributor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// TypeScript versions
// =============================================================================

/// A `major.minor` TypeScript release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeScriptVersion {
    pub major: u32,
    pub minor: u32,
}

impl TypeScriptVersion {
    pub const OLDEST: TypeScriptVersion = TypeScriptVersion { major: 2, minor: 0 };
    pub const LATEST: TypeScriptVersion = TypeScriptVersion { major: 5, minor: 9 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether this names a release the toolchain-directory convention accepts.
    pub fn is_supported(self) -> bool {
        self >= Self::OLDEST && self <= Self::LATEST && self.minor <= 9
    }
}

impl Default for TypeScriptVersion {
    fn default() -> Self {
        Self::OLDEST
    }
}

impl fmt::Display for TypeScriptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTypeScriptVersion(pub String);

impl fmt::Display for InvalidTypeScriptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a supported TypeScript version: {}", self.0)
    }
}

impl std::error::Error for InvalidTypeScriptVersion {}

impl FromStr for TypeScriptVersion {
    type Err = InvalidTypeScriptVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTypeScriptVersion(s.to_string());
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(major) || !all_digits(minor) {
            return Err(invalid());
        }
        let version = TypeScriptVersion {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        };
        if version.is_supported() {
            Ok(version)
        } else {
            Err(invalid())
        }
    }
}

impl Serialize for TypeScriptVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeScriptVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Dependencies
// =============================================================================

/// Major-version constraint of a dependency. `Any` is resolved to the latest
/// version at publish time and serializes as `"*"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyVersion {
    Major(u32),
    Any,
}

impl fmt::Display for DependencyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyVersion::Major(n) => write!(f, "{n}"),
            DependencyVersion::Any => f.write_str("*"),
        }
    }
}

impl Serialize for DependencyVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DependencyVersion::Major(n) => serializer.serialize_u32(*n),
            DependencyVersion::Any => serializer.serialize_str("*"),
        }
    }
}

impl<'de> Deserialize<'de> for DependencyVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Major(u32),
            Wildcard(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Major(n) => Ok(DependencyVersion::Major(n)),
            Raw::Wildcard(s) if s == "*" => Ok(DependencyVersion::Any),
            Raw::Wildcard(s) => Err(serde::de::Error::custom(format!(
                "expected a major version or \"*\", got \"{s}\""
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageId {
    pub name: String,
    pub major_version: DependencyVersion,
}

impl PackageId {
    pub fn new(name: impl Into<String>, major_version: DependencyVersion) -> Self {
        Self {
            name: name.into(),
            major_version,
        }
    }
}

/// A `paths` entry of the build manifest pinning `package_name` to an older
/// major version directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMapping {
    pub package_name: String,
    pub major_version: u32,
}

/// A `dependencies` entry of a package's `package.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageJsonDependency {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum License {
    #[default]
    #[serde(rename = "MIT")]
    Mit,
    #[serde(rename = "Apache-2.0")]
    Apache20,
}

// =============================================================================
// Package record
// =============================================================================

/// Everything known about one major version of a typings package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingsData {
    pub library_name: String,
    pub typings_package_name: String,
    pub project_name: String,
    pub contributors: Vec<Contributor>,
    pub library_major_version: u32,
    pub library_minor_version: u32,
    pub min_ts_version: TypeScriptVersion,
    /// Toolchain directories (`ts3.1`, ...) present next to `index.d.ts`.
    pub types_versions: Vec<TypeScriptVersion>,
    /// Declaration files, sorted; toolchain files carry their `ts<x.y>/` prefix.
    pub files: Vec<String>,
    pub license: License,
    pub dependencies: Vec<PackageId>,
    pub test_dependencies: Vec<String>,
    pub path_mappings: Vec<PathMapping>,
    pub package_json_dependencies: Vec<PackageJsonDependency>,
    pub content_hash: String,
    pub globals: Vec<String>,
    pub declared_modules: Vec<String>,
}

impl TypingsData {
    /// Name the package is published under, e.g. `@types/foo__bar` for `@foo/bar`.
    pub fn full_npm_name(&self) -> String {
        format!("@types/{}", self.typings_package_name)
    }

    /// `major.minor` of the library these typings describe.
    pub fn version_label(&self) -> String {
        format!("{}.{}", self.library_major_version, self.library_minor_version)
    }
}
