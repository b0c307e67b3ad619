//! Config records and their conversion into build specifications.
//!
//! A config record is the YAML file telling the build backend what to build
//! for one kernel:
//!
//! ```yaml
//! kernelversion: "1"
//! kernelrelease: 5.10.0
//! target: centos
//! architecture: amd64
//! output:
//!   module: output/1.0.0+driver/x86_64/falco_centos_5.10.0_1.ko
//!   probe: output/1.0.0+driver/x86_64/falco_centos_5.10.0_1.o
//! kernelurls:
//!   - https://example.org/kernel-devel-5.10.0.rpm
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::arch::Architecture;
use crate::error::{Error, Result};
use crate::identity::{ArtifactKind, Identity};
use crate::paths::{self, DRIVERKIT_DIR};

/// Where the backend puts the built artifacts. Empty means "do not build".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub probe: String,
}

impl OutputPaths {
    pub fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Module => &self.module,
            ArtifactKind::Probe => &self.probe,
        }
    }
}

/// One persisted build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    #[serde(rename = "kernelversion", deserialize_with = "crate::feed::string_or_number")]
    pub kernel_version: String,
    #[serde(rename = "kernelrelease")]
    pub kernel_release: String,
    /// Distro in backend naming.
    pub target: String,
    /// Architecture in Debian naming.
    pub architecture: String,
    #[serde(default)]
    pub output: OutputPaths,
    #[serde(
        rename = "kernelurls",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub kernel_urls: Vec<String>,
    #[serde(
        rename = "kernelconfigdata",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub kernel_config_data: String,
}

impl ConfigRecord {
    /// A record for `identity` with no outputs filled in yet.
    pub fn new(identity: &Identity, architecture: Architecture) -> Self {
        Self {
            kernel_version: identity.kernel_version.clone(),
            kernel_release: identity.kernel_release.clone(),
            target: identity.distro.clone(),
            architecture: architecture.deb().to_string(),
            ..Default::default()
        }
    }

    /// The identity this record declares in its own content.
    pub fn identity(&self) -> Identity {
        Identity::new(&self.target, &self.kernel_release, &self.kernel_version)
    }

    /// Fills the relative output paths for the artifacts the kernel supports.
    pub fn fill_outputs(
        &mut self,
        driver_version: &str,
        driver_name: &str,
        architecture: Architecture,
        supports_module: bool,
        supports_probe: bool,
    ) {
        let identity = self.identity();
        let name = identity.encode();
        self.output = OutputPaths::default();
        if supports_module {
            self.output.module = paths::relative_output_path(
                driver_version,
                architecture,
                driver_name,
                &format!("{name}.{}", ArtifactKind::Module.extension()),
            );
        }
        if supports_probe {
            self.output.probe = paths::relative_output_path(
                driver_version,
                architecture,
                driver_name,
                &format!("{name}.{}", ArtifactKind::Probe.extension()),
            );
        }
    }

    pub fn has_module(&self) -> bool {
        !self.output.module.is_empty()
    }

    pub fn has_probe(&self) -> bool {
        !self.output.probe.is_empty()
    }

    pub fn from_yaml(path: &Utf8Path, data: &str) -> Result<Self> {
        serde_yaml::from_str(data).map_err(|e| Error::yaml(path, e))
    }

    pub fn to_yaml(&self, path: &Utf8Path) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::yaml(path, e))
    }

    /// Reads a record from disk.
    pub fn read(path: &Utf8Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(path, &data)
    }

    /// Writes a record to disk, creating parent folders as needed.
    pub fn write(&self, path: &Utf8Path) -> Result<()> {
        let data = self.to_yaml(path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(path, data).map_err(|e| Error::io(path, e))
    }
}

/// Everything the build backend needs to build one config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    #[serde(rename = "kernelrelease")]
    pub kernel_release: String,
    #[serde(rename = "kernelversion")]
    pub kernel_version: String,
    pub target: String,
    pub architecture: String,
    pub output: OutputPaths,
    #[serde(rename = "driverversion")]
    pub driver_version: String,
    #[serde(rename = "kernelurls", default, skip_serializing_if = "Vec::is_empty")]
    pub kernel_urls: Vec<String>,
    #[serde(
        rename = "kernelconfigdata",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub kernel_config_data: String,
    #[serde(rename = "moduledrivername")]
    pub module_driver_name: String,
    #[serde(rename = "moduledevicename")]
    pub module_device_name: String,
}

impl BuildSpec {
    pub fn identity(&self) -> Identity {
        Identity::new(&self.target, &self.kernel_release, &self.kernel_version)
    }
}

/// Converts a stored record into a build spec.
///
/// Relative output paths are resolved below `{repo_root}/driverkit`; absolute
/// ones are kept. The driver name doubles as module device name.
pub fn to_build_spec(
    record: &ConfigRecord,
    repo_root: &Utf8Path,
    driver_version: &str,
    driver_name: &str,
) -> BuildSpec {
    let resolve = |output: &str| -> String {
        if output.is_empty() || Utf8Path::new(output).is_absolute() {
            output.to_string()
        } else {
            let path: Utf8PathBuf = repo_root.join(DRIVERKIT_DIR).join(output);
            path.into_string()
        }
    };

    BuildSpec {
        kernel_release: record.kernel_release.clone(),
        kernel_version: record.kernel_version.clone(),
        target: record.target.clone(),
        architecture: record.architecture.clone(),
        output: OutputPaths {
            module: resolve(&record.output.module),
            probe: resolve(&record.output.probe),
        },
        driver_version: driver_version.to_string(),
        kernel_urls: record.kernel_urls.clone(),
        kernel_config_data: record.kernel_config_data.clone(),
        module_driver_name: driver_name.to_string(),
        module_device_name: driver_name.to_string(),
    }
}
