//! The driver build backend seam.
//!
//! Compiling a driver is out of this crate's hands. A [`BuildBackend`] resolves
//! kernel header packages for a single kernel, answers which artifacts a kernel
//! release can produce and builds a resolved [`BuildSpec`].

use thiserror::Error;

use crate::arch::Architecture;
use crate::identity::Identity;
use crate::kernel;
use crate::record::BuildSpec;

#[derive(Error, Debug)]
pub enum BackendError {
    /// No builder exists for the distro.
    #[error("target {distro} is not supported")]
    Unsupported { distro: String },

    /// Header resolution found too few packages.
    #[error("not enough headers packages found; expected {expected}, found {found}")]
    NotEnoughHeaders { expected: usize, found: usize },

    /// The build itself failed.
    #[error("build of {identity} failed: {message}")]
    BuildFailed { identity: String, message: String },

    #[error("{0}")]
    Other(String),
}

pub trait BuildBackend: Send + Sync {
    /// Header package URLs for one kernel.
    fn resolve_header_urls(
        &self,
        identity: &Identity,
        architecture: Architecture,
    ) -> Result<Vec<String>, BackendError>;

    fn supports_module(&self, kernel_release: &str, architecture: Architecture) -> bool {
        kernel::supports_module(kernel_release, architecture)
    }

    fn supports_probe(&self, kernel_release: &str, architecture: Architecture) -> bool {
        kernel::supports_probe(kernel_release, architecture)
    }

    /// Builds the artifacts named in `spec.output`.
    fn build(&self, spec: &BuildSpec) -> Result<(), BackendError>;
}

/// Backend that knows the capability rules but cannot resolve headers or build.
///
/// Used where only the oracle is needed, e.g. bulk generation from a feed that
/// already lists header URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleBackend;

impl BuildBackend for OracleBackend {
    fn resolve_header_urls(
        &self,
        identity: &Identity,
        _architecture: Architecture,
    ) -> Result<Vec<String>, BackendError> {
        Err(BackendError::Other(format!(
            "cannot resolve headers for {identity} without a build backend"
        )))
    }

    fn build(&self, spec: &BuildSpec) -> Result<(), BackendError> {
        Err(BackendError::BuildFailed {
            identity: spec.identity().encode(),
            message: "no build backend configured".to_string(),
        })
    }
}
