//! Build unit identity and its canonical name encoding.
//!
//! An [`Identity`] is encoded as `{distro}_{kernelrelease}_{kernelversion}`.
//! Config files append `.yaml`; built drivers prepend `{driverName}_` and
//! append `.ko` (kernel module) or `.o` (eBPF probe).
//!
//! Decoding splits on the *last* underscore for the kernel version, so the
//! encoding is bijective as long as the distro and kernel version carry no
//! underscore. Kernel releases may contain underscores
//! (`5.14.0-284.11.1.el9_2.x86_64`).

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_EXTENSION: &str = "yaml";

/// The `(distro, kernel release, kernel version)` triple naming one build unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub distro: String,
    pub kernel_release: String,
    pub kernel_version: String,
}

impl Identity {
    pub fn new(
        distro: impl Into<String>,
        kernel_release: impl Into<String>,
        kernel_version: impl Into<String>,
    ) -> Self {
        Self {
            distro: distro.into(),
            kernel_release: kernel_release.into(),
            kernel_version: kernel_version.into(),
        }
    }

    /// `{distro}_{kernelrelease}_{kernelversion}`
    pub fn encode(&self) -> String {
        format!(
            "{}_{}_{}",
            self.distro, self.kernel_release, self.kernel_version
        )
    }

    /// `{encode}.yaml`
    pub fn config_name(&self) -> String {
        format!("{}.{}", self.encode(), CONFIG_EXTENSION)
    }

    /// `{driverName}_{encode}.{ko|o}`
    pub fn artifact_name(&self, driver_name: &str, kind: ArtifactKind) -> String {
        format!("{}_{}.{}", driver_name, self.encode(), kind.extension())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// The two kinds of artifacts a config can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Module,
    Probe,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Module => "ko",
            ArtifactKind::Probe => "o",
        }
    }

    /// Classify a file name or key by its extension.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.ends_with(".ko") {
            Some(ArtifactKind::Module)
        } else if name.ends_with(".o") {
            Some(ArtifactKind::Probe)
        } else {
            None
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Module => f.write_str("module"),
            ArtifactKind::Probe => f.write_str("probe"),
        }
    }
}

/// Decodes artifact and config basenames back into identities.
///
/// The expected driver name is a construction parameter: object stores hold
/// drivers built under different names side by side.
#[derive(Debug, Clone)]
pub struct NameCodec {
    driver_name: String,
    artifact_re: Regex,
    config_re: Regex,
}

impl NameCodec {
    pub fn new(driver_name: &str) -> Result<Self> {
        let artifact_pattern = format!(
            r"^{}_(?P<Distro>[a-zA-Z0-9.-]*)_(?P<KernelRelease>.*)_(?P<KernelVersion>.*)\.(?P<Ext>o|ko)$",
            regex::escape(driver_name)
        );
        let artifact_re = Regex::new(&artifact_pattern).map_err(|source| Error::InvalidPattern {
            field: "driver-name",
            pattern: driver_name.to_string(),
            source,
        })?;
        let config_re = Regex::new(
            r"^(?P<Distro>[a-zA-Z0-9.-]*)_(?P<KernelRelease>.*)_(?P<KernelVersion>.*)\.yaml$",
        )
        .map_err(|source| Error::InvalidPattern {
            field: "config-name",
            pattern: String::new(),
            source,
        })?;

        Ok(Self {
            driver_name: driver_name.to_string(),
            artifact_re,
            config_re,
        })
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// Decode `{driverName}_{distro}_{kr}_{kv}.{ko|o}`.
    ///
    /// Anything that does not follow the scheme is a [`Error::MalformedKey`];
    /// callers listing a shared prefix are expected to skip those.
    pub fn decode_artifact(&self, basename: &str) -> Result<(Identity, ArtifactKind)> {
        let caps = self
            .artifact_re
            .captures(basename)
            .ok_or_else(|| Error::MalformedKey {
                key: basename.to_string(),
            })?;
        let kind = match &caps["Ext"] {
            "ko" => ArtifactKind::Module,
            _ => ArtifactKind::Probe,
        };
        Ok((
            Identity::new(
                &caps["Distro"],
                &caps["KernelRelease"],
                &caps["KernelVersion"],
            ),
            kind,
        ))
    }

    /// Decode `{distro}_{kr}_{kv}.yaml`.
    pub fn decode_config(&self, basename: &str) -> Result<Identity> {
        let caps = self
            .config_re
            .captures(basename)
            .ok_or_else(|| Error::MalformedKey {
                key: basename.to_string(),
            })?;
        Ok(Identity::new(
            &caps["Distro"],
            &caps["KernelRelease"],
            &caps["KernelVersion"],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let id = Identity::new("centos", "5.10.0", "1");
        assert_eq!(id.encode(), "centos_5.10.0_1");
        assert_eq!(id.config_name(), "centos_5.10.0_1.yaml");
        assert_eq!(
            id.artifact_name("falco", ArtifactKind::Module),
            "falco_centos_5.10.0_1.ko"
        );
        assert_eq!(
            id.artifact_name("falco", ArtifactKind::Probe),
            "falco_centos_5.10.0_1.o"
        );
    }

    #[test]
    fn test_decode_object_key_basename() {
        let codec = NameCodec::new("falco").unwrap();
        let (id, kind) = codec.decode_artifact("falco_centos_5.10.0_1.ko").unwrap();
        assert_eq!(id, Identity::new("centos", "5.10.0", "1"));
        assert_eq!(kind, ArtifactKind::Module);
    }

    #[test]
    fn test_decode_release_with_underscore() {
        let codec = NameCodec::new("falco").unwrap();
        let (id, kind) = codec
            .decode_artifact("falco_almalinux_5.14.0-284.11.1.el9_2.x86_64_1.o")
            .unwrap();
        assert_eq!(id.distro, "almalinux");
        assert_eq!(id.kernel_release, "5.14.0-284.11.1.el9_2.x86_64");
        assert_eq!(id.kernel_version, "1");
        assert_eq!(kind, ArtifactKind::Probe);
    }

    #[test]
    fn test_decode_custom_driver_name() {
        let codec = NameCodec::new("CUSTOM").unwrap();
        assert!(codec.decode_artifact("CUSTOM_debian_6.3.11-1-amd64_1.ko").is_ok());
        assert!(matches!(
            codec.decode_artifact("falco_debian_6.3.11-1-amd64_1.ko"),
            Err(Error::MalformedKey { .. })
        ));
    }

    #[test]
    fn test_decode_driver_name_is_literal() {
        // A dot in the driver name must not act as a wildcard.
        let codec = NameCodec::new("my.drv").unwrap();
        assert!(codec.decode_artifact("myXdrv_centos_5.10.0_1.ko").is_err());
        assert!(codec.decode_artifact("my.drv_centos_5.10.0_1.ko").is_ok());
    }

    #[test]
    fn test_decode_malformed() {
        let codec = NameCodec::new("falco").unwrap();
        for key in ["README.md", "falco_centos.ko", "falco_centos_5.10.0_1.ko.sig"] {
            assert!(
                matches!(codec.decode_artifact(key), Err(Error::MalformedKey { .. })),
                "{key} should be malformed"
            );
        }
    }

    #[test]
    fn test_bijective_naming() {
        let codec = NameCodec::new("falco").unwrap();
        let ids = [
            Identity::new("centos", "5.10.0", "1"),
            Identity::new("ubuntu-generic", "5.15.0-86-generic", "96"),
            Identity::new("bottlerocket", "5.10.165_1", "1.13.1-aws"),
            Identity::new("amazonlinux2", "4.14.256-197.484.amzn2.x86_64", "1"),
        ];
        for id in ids {
            assert_eq!(codec.decode_config(&id.config_name()).unwrap(), id);
            for kind in [ArtifactKind::Module, ArtifactKind::Probe] {
                let (decoded, decoded_kind) =
                    codec.decode_artifact(&id.artifact_name("falco", kind)).unwrap();
                assert_eq!(decoded, id);
                assert_eq!(decoded_kind, kind);
            }
        }
    }

    #[test]
    fn test_artifact_kind_from_name() {
        assert_eq!(ArtifactKind::from_name("a.ko"), Some(ArtifactKind::Module));
        assert_eq!(ArtifactKind::from_name("a.o"), Some(ArtifactKind::Probe));
        assert_eq!(ArtifactKind::from_name("a.yaml"), None);
    }
}
