//! Error conditions raised while resolving and validating a typings package.
//!
//! Every failure is terminal for the package being processed. Variants carry
//! enough context (package, path, offending value) to render a diagnostic
//! without access to the file tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypingsError>;

#[derive(Debug, Error)]
pub enum TypingsError {
    // ==================== I/O ====================
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("File {path} does not exist")]
    MissingFile { path: String },

    #[error("{path} is not a directory")]
    NotADirectory { path: String },

    #[error("Failed to parse JSON in {path}: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // ==================== Manifests ====================
    #[error("In tsconfig, don't use \"include\", must use \"files\" ({path})")]
    ManifestMustUseFiles { path: String },

    #[error("{path} needs to specify \"files\"")]
    ManifestMissingFiles { path: String },

    #[error("In {path}: Unnecessary \"./\" at the start of {file}")]
    UnnecessaryRelativePrefix { path: String, file: String },

    #[error(
        "{package}: Only index.d.ts may be listed explicitly in tsconfig's \"files\" entry (found {file}).\n\
         Other d.ts files must either be referenced through index.d.ts, tests, or added to OTHER_FILES.txt."
    )]
    OnlyRootDeclarationAllowedInManifest { package: String, file: String },

    #[error("Expected file '{file}' to be named '{expected}' or to be inside a '{directory}/test/' directory")]
    UnexpectedTestFileName {
        file: String,
        expected: String,
        directory: String,
    },

    #[error(
        "Unexpected file extension for '{file}' -- expected '.ts' or '.tsx' \
         (maybe this should not be in \"files\", but OTHER_FILES.txt)"
    )]
    UnexpectedFileExtension { file: String },

    #[error("Invalid {path}: {message}")]
    InvalidManifest { path: String, message: String },

    #[error("{path} should contain \"dependencies\" or not exist.")]
    InvalidPackageJson { path: String },

    #[error("In {path}: Specifying '\"license\": \"MIT\"' is redundant, this is the default.")]
    RedundantLicense { path: String },

    #[error("In {path}: license is {license}.\nExpected one of: [\"MIT\", \"Apache-2.0\"]")]
    UnsupportedLicense { path: String, license: String },

    #[error("In {path}: {}", dependency_not_whitelisted_message(.dependency))]
    DependencyNotWhitelisted { path: String, dependency: String },

    #[error("In {path}: Dependency version for {dependency} should be a string.")]
    InvalidDependencyVersion { path: String, dependency: String },

    #[error("In {path}: invalid header: {message}")]
    Header { path: String, message: String },

    // ==================== Graph policy ====================
    #[error(
        "{file}: '<reference types=\"{reference}\" />': do not directly import specific versions of another types package.\n\
         You should work with the latest version of {package} instead."
    )]
    ForeignVersionReference {
        file: String,
        reference: String,
        package: String,
    },

    #[error(
        "{specifier}: do not directly import specific versions of another types package.\n\
         You should work with the latest version of {package} instead."
    )]
    ForeignVersionImport { specifier: String, package: String },

    #[error(
        "{file}: Definitions must use global references to other packages, not parent (\"../xxx\") references. \
         (Based on reference '{reference}')"
    )]
    ParentReference { file: String, reference: String },

    #[error("Package name `{package}` should be strictly lowercase")]
    PackageNameNotLowercase { package: String },

    #[error("{package}: The latest major version is {version}, but a directory v{version} exists.")]
    DuplicateMajorVersion { package: String, version: u32 },

    #[error(
        "Directory {directory} indicates major version {directory_version}, \
         but header indicates major version {header_version}"
    )]
    MajorVersionMismatch {
        directory: String,
        directory_version: u32,
        header_version: u32,
    },

    #[error("Directory name starting with 'ts' should be a valid TypeScript version. Got: {directory}")]
    InvalidTypeScriptVersionDirectory { directory: String },

    #[error("In {package}: Latest version of a package should not have a path mapping for itself.")]
    SelfPathMappingInLatest { package: String },

    #[error("{package}: Older version {version} must have a path mapping for itself.")]
    MissingSelfPathMapping { package: String, version: u32 },

    #[error("In {package}: Must have a \"paths\" entry of \"{package}\": [\"{package}/v{version}\"]")]
    WrongSelfPathMapping { package: String, version: u32 },

    #[error("In {package}: found path mapping for {pattern} but not for {root}")]
    PathMappingWithoutRoot {
        package: String,
        pattern: String,
        root: String,
    },

    #[error("In {package}: Path mapping for {dependency} may only have 1 entry.")]
    PathMappingMultipleTargets { package: String, dependency: String },

    #[error("In {package}, unexpected path mapping for {dependency}: '{target}'")]
    UnexpectedPathMapping {
        package: String,
        dependency: String,
        target: String,
    },

    #[error("Expected directory {target} to be the path mapping for {dependency}")]
    ScopedPathMappingMismatch { dependency: String, target: String },

    #[error(
        "In {package}: path mapping for scoped package {dependency} must target '<scope>__<name>', got '{target}'"
    )]
    InvalidScopedPathMapping {
        package: String,
        dependency: String,
        target: String,
    },

    // ==================== Accounting ====================
    #[error("Unused file {path} (used files: {used:?})")]
    UnusedFile { path: String, used: Vec<String> },

    #[error("File {path} listed in OTHER_FILES.txt is already reachable from tsconfig.json.")]
    RedundantOtherFilesEntry { path: String },

    #[error("File {path} listed in OTHER_FILES.txt does not exist.")]
    MissingOtherFilesEntry { path: String },

    #[error("Empty directory {path} (used files: {used:?})")]
    EmptyDirectory { path: String, used: Vec<String> },

    #[error("In {package}: windows slash detected in {path}")]
    WindowsSlash { package: String, path: String },

    // ==================== Encoding ====================
    #[error(
        "File '{path}' has a BOM. Try using:\n\
         npm install -g strip-bom-cli\n\
         strip-bom {path} > fix\n\
         mv fix {path}"
    )]
    BOMDetected { path: String },
}

fn dependency_not_whitelisted_message(dependency: &str) -> String {
    if dependency.starts_with("@types/") {
        format!(
            "Dependency {dependency} not in whitelist.\n\
             Don't use a 'package.json' for @types dependencies unless this package relies on\n\
             an old version of types that have since been moved to the source repo.\n\
             For example, if package *P* used to have types on Definitely Typed at @types/P,\n\
             but now has its own types, a dependent package *D* will need to use package.json\n\
             to refer to @types/P if it relies on old versions of P's types.\n\
             In this case, please add @types/P to the dependency whitelist."
        )
    } else {
        format!(
            "Dependency {dependency} not in whitelist.\n\
             If you are depending on another `@types` package, do *not* add it to a `package.json`. \
             Path mapping should make the import work.\n\
             For namespaced dependencies you then have to add a `paths` mapping from `@namespace/library` \
             to `namespace__library` in `tsconfig.json`.\n\
             If this is an external library that provides typings, please add it to the dependency whitelist."
        )
    }
}

impl TypingsError {
    pub(crate) fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        TypingsError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
