//! CPU architecture naming.
//!
//! Two naming conventions meet here: the Debian-style names used by the build
//! backend and stored in configs (`amd64`, `arm64`), and the kernel-style names
//! used by the kernel feed and by every on-disk and in-bucket path (`x86_64`,
//! `aarch64`). The supported set is closed; anything else is rejected.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// `(kernel name, debian name)` for each supported architecture.
const SUPPORTED_ARCHS: &[(&str, &str)] = &[("x86_64", "amd64"), ("aarch64", "arm64")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    Amd64,
    Arm64,
}

impl Architecture {
    /// Name used by the build backend and stored in config files.
    pub fn deb(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
        }
    }

    /// Name used by the kernel feed and in every path and object key.
    pub fn non_deb(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "x86_64",
            Architecture::Arm64 => "aarch64",
        }
    }

    /// Architecture of the running host, if supported.
    pub fn host() -> Option<Self> {
        std::env::consts::ARCH.parse().ok()
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.deb())
    }
}

impl FromStr for Architecture {
    type Err = Error;

    /// Accepts either naming convention.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd64" | "x86_64" => Ok(Architecture::Amd64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            other => Err(Error::UnsupportedArchitecture(other.to_string())),
        }
    }
}

/// Every accepted spelling, for help texts.
pub fn supported_arch_list() -> Vec<&'static str> {
    SUPPORTED_ARCHS
        .iter()
        .flat_map(|(kernel, deb)| [*deb, *kernel])
        .collect()
}
