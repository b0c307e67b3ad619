//! Run context shared by every verb.

use camino::{Utf8Path, Utf8PathBuf};

use crate::arch::Architecture;
use crate::error::Result;
use crate::identity::NameCodec;
use crate::target::{Target, TargetFilter};

pub const DEFAULT_DRIVER_NAME: &str = "falco";

/// Settings common to all verbs, passed explicitly into every entry point.
#[derive(Debug, Clone)]
pub struct Options {
    /// Log what would be done instead of doing it.
    pub dry_run: bool,
    /// Root of the checkout holding the `driverkit/` folder.
    pub repo_root: Utf8PathBuf,
    pub architecture: Architecture,
    /// Prefix of every built artifact name.
    pub driver_name: String,
    /// Partitions to operate on, in the order results are reported.
    pub driver_versions: Vec<String>,
    pub target: Target,
}

impl Options {
    pub fn new(repo_root: impl Into<Utf8PathBuf>, architecture: Architecture) -> Self {
        Self {
            dry_run: false,
            repo_root: repo_root.into(),
            architecture,
            driver_name: DEFAULT_DRIVER_NAME.to_string(),
            driver_versions: Vec::new(),
            target: Target::default(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_driver_name(mut self, driver_name: impl Into<String>) -> Self {
        self.driver_name = driver_name.into();
        self
    }

    pub fn with_driver_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.driver_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn repo_root(&self) -> &Utf8Path {
        &self.repo_root
    }

    /// Compiles the target patterns.
    pub fn filter(&self) -> Result<TargetFilter> {
        TargetFilter::new(&self.target)
    }

    /// Codec decoding artifact names built under `driver_name`.
    pub fn codec(&self) -> Result<NameCodec> {
        NameCodec::new(&self.driver_name)
    }
}
