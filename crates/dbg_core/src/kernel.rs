//! Kernel release parsing and the module/probe capability oracle.

use std::cmp::Ordering;
use std::fmt;

use crate::arch::Architecture;

/// Numeric `major.minor.patch` prefix of a kernel release string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelRelease {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl KernelRelease {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses the leading version of a release such as
    /// `5.14.0-284.11.1.el9_2.x86_64`. The patch level is optional.
    pub fn parse(release: &str) -> Option<Self> {
        let numeric_end = release
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(release.len());
        let mut parts = release[..numeric_end].split('.');

        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some("") | None => 0,
            Some(p) => p.parse().ok()?,
        };

        Some(Self::new(major, minor, patch))
    }

    fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor).cmp(&(major, minor)) != Ordering::Less
    }

    /// Whether a kernel module can be built for this release.
    pub fn supports_module(&self, arch: Architecture) -> bool {
        match arch {
            Architecture::Amd64 => self.at_least(2, 6),
            Architecture::Arm64 => self.at_least(3, 4),
        }
    }

    /// Whether an eBPF probe can be built for this release.
    pub fn supports_probe(&self, arch: Architecture) -> bool {
        match arch {
            Architecture::Amd64 => self.at_least(4, 14),
            Architecture::Arm64 => self.at_least(4, 17),
        }
    }
}

impl fmt::Display for KernelRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Module support for a raw release string; unparseable releases support nothing.
pub fn supports_module(release: &str, arch: Architecture) -> bool {
    KernelRelease::parse(release).is_some_and(|kr| kr.supports_module(arch))
}

/// Probe support for a raw release string; unparseable releases support nothing.
pub fn supports_probe(release: &str, arch: Architecture) -> bool {
    KernelRelease::parse(release).is_some_and(|kr| kr.supports_probe(arch))
}
