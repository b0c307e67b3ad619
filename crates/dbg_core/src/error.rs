//! Error types for config generation, filtering and bookkeeping.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. Every variant that stems from a file or an object key keeps
//! that path around so callers can report which candidate broke a run.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::backend::BackendError;
use crate::identity::ArtifactKind;
use crate::store::StoreError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating, filtering or checking configs.
#[derive(Error, Debug)]
pub enum Error {
    /// The build backend has no builder for the resolved distro.
    #[error("target {distro} is unsupported by the build backend")]
    UnsupportedTarget { distro: String },

    /// A config filename disagrees with the identity declared in its content.
    #[error("config filename is wrong ({found}); should be {expected} (config: {path})")]
    NamingMismatch {
        path: Utf8PathBuf,
        found: String,
        expected: String,
    },

    /// An output filename disagrees with the identity declared in its config.
    #[error("output {kind} filename is wrong ({found}); expected: {expected} (config: {path})")]
    OutputNamingMismatch {
        path: Utf8PathBuf,
        kind: ArtifactKind,
        found: String,
        expected: String,
    },

    /// The architecture stored in a config is not the requested one.
    #[error("wrong architecture in config file {path}: {found} (expected {expected})")]
    ArchitectureMismatch {
        path: Utf8PathBuf,
        found: String,
        expected: String,
    },

    /// An output path does not carry the requested architecture token.
    #[error("output {kind} has wrong architecture in its path ({path}); expected {expected}")]
    OutputArchitectureMismatch {
        kind: ArtifactKind,
        path: String,
        expected: String,
    },

    /// `kernelconfigdata` is present but not valid base64.
    #[error("kernelconfigdata must be a base64 encoded string (config: {path})")]
    Encoding { path: Utf8PathBuf },

    /// An object key does not follow the driver naming scheme.
    #[error("malformed key: {key}")]
    MalformedKey { key: String },

    /// Architecture outside the supported set.
    #[error("architecture {0} is not supported")]
    UnsupportedArchitecture(String),

    /// A target pattern is not a valid regular expression.
    #[error("invalid target {field} pattern '{pattern}': {source}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The caller asked for something the verb cannot do with the given options.
    #[error("{0}")]
    Usage(String),

    /// Filesystem I/O failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file could not be (de)serialized.
    #[error("config {path}: {source}")]
    Yaml {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The kernel feed payload could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern built from the target is invalid.
    #[error("glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    /// Reading a directory entry while expanding a glob failed.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// A path is not valid UTF-8.
    #[error("Invalid UTF-8 path: {0}")]
    InvalidUtf8Path(String),

    /// The object store failed.
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    /// The build backend failed.
    #[error("build backend error: {0}")]
    Backend(#[from] BackendError),

    /// The kernel feed could not be fetched.
    #[error("kernel feed error: {0}")]
    Feed(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(path: impl Into<Utf8PathBuf>, source: serde_yaml::Error) -> Self {
        Error::Yaml {
            path: path.into(),
            source,
        }
    }
}
