//! Build backend running the `driverkit` tool.

use std::io::Write;
use std::process::Command;

use dbg_core::{distro, Architecture, BackendError, BuildBackend, BuildSpec, Identity, KernelFeed};

pub const DRIVERKIT_BINARY: &str = "driverkit";

pub struct DriverkitBackend<F> {
    feed: F,
    binary: String,
}

impl<F: KernelFeed> DriverkitBackend<F> {
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            binary: DRIVERKIT_BINARY.to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

impl<F: KernelFeed> BuildBackend for DriverkitBackend<F> {
    /// Looks the kernel up in the crawler feed.
    fn resolve_header_urls(
        &self,
        identity: &Identity,
        architecture: Architecture,
    ) -> Result<Vec<String>, BackendError> {
        let payload = self
            .feed
            .kernels(architecture)
            .map_err(|e| BackendError::Other(e.to_string()))?;

        let mut known = false;
        for (feed_distro, entries) in &payload {
            let backend_distro = distro::to_backend_distro(feed_distro);
            for entry in entries {
                let target = if entry.target.is_empty() {
                    backend_distro.as_str()
                } else {
                    entry.target.as_str()
                };
                if target != identity.distro {
                    continue;
                }
                known = true;
                if entry.kernel_release == identity.kernel_release
                    && entry.kernel_version == identity.kernel_version
                {
                    if entry.headers.is_empty() {
                        break;
                    }
                    return Ok(entry.headers.clone());
                }
            }
        }

        if !known && !distro::is_supported(&identity.distro) {
            return Err(BackendError::Unsupported {
                distro: identity.distro.clone(),
            });
        }
        Err(BackendError::NotEnoughHeaders {
            expected: 1,
            found: 0,
        })
    }

    /// Runs `driverkit docker --config <spec.yaml>`.
    fn build(&self, spec: &BuildSpec) -> Result<(), BackendError> {
        let identity = spec.identity().encode();
        let failed = |message: String| BackendError::BuildFailed {
            identity: identity.clone(),
            message,
        };

        let yaml = serde_yaml::to_string(spec).map_err(|e| failed(e.to_string()))?;
        let mut file = tempfile::Builder::new()
            .prefix("dbg-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|e| failed(e.to_string()))?;
        file.write_all(yaml.as_bytes())
            .map_err(|e| failed(e.to_string()))?;

        tracing::debug!("Running {} docker for {}", self.binary, identity);
        let status = Command::new(&self.binary)
            .arg("docker")
            .arg("--config")
            .arg(file.path())
            .status()
            .map_err(|e| failed(format!("failed to run {}: {e}", self.binary)))?;

        if !status.success() {
            return Err(failed(format!("{} exited with {status}", self.binary)));
        }
        Ok(())
    }
}
