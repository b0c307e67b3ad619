//! Kernel crawler feed payloads.
//!
//! The feed publishes, per architecture, one JSON object mapping each crawled
//! distro (feed naming) to the kernels found for it:
//!
//! ```json
//! {
//!   "CentOS": [
//!     {
//!       "kernelversion": "1",
//!       "kernelrelease": "5.10.0",
//!       "target": "centos",
//!       "headers": ["https://example.org/kernel-devel-5.10.0.rpm"]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::arch::Architecture;
use crate::error::{Error, Result};

/// One crawled kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelEntry {
    #[serde(rename = "kernelversion", deserialize_with = "string_or_number", default)]
    pub kernel_version: String,
    #[serde(rename = "kernelrelease", default)]
    pub kernel_release: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(rename = "kernelconfigdata", default)]
    pub kernel_config_data: String,
}

/// Feed distro name to its kernels, ordered by distro name.
pub type FeedPayload = BTreeMap<String, Vec<KernelEntry>>;

pub fn parse_feed(data: &[u8]) -> Result<FeedPayload> {
    Ok(serde_json::from_slice(data)?)
}

/// Accepts `"96"` as well as `96`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Unsigned(n) => n.to_string(),
        StringOrNumber::Signed(n) => n.to_string(),
    })
}

/// Source of crawled kernels.
pub trait KernelFeed: Send + Sync {
    /// Raw JSON list for one architecture.
    fn fetch_kernels(&self, architecture: Architecture) -> Result<Vec<u8>>;

    /// Feed name of the distro crawled last.
    fn last_run_distro(&self) -> Result<String>;

    fn kernels(&self, architecture: Architecture) -> Result<FeedPayload> {
        parse_feed(&self.fetch_kernels(architecture)?)
    }
}

/// In-memory feed serving fixed payloads.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    payloads: BTreeMap<&'static str, Vec<u8>>,
    last_run_distro: Option<String>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, architecture: Architecture, payload: impl Into<Vec<u8>>) -> Self {
        self.payloads.insert(architecture.non_deb(), payload.into());
        self
    }

    pub fn with_last_run_distro(mut self, distro: impl Into<String>) -> Self {
        self.last_run_distro = Some(distro.into());
        self
    }
}

impl KernelFeed for StaticFeed {
    fn fetch_kernels(&self, architecture: Architecture) -> Result<Vec<u8>> {
        self.payloads
            .get(architecture.non_deb())
            .cloned()
            .ok_or_else(|| Error::Feed(format!("no kernel list for {}", architecture.non_deb())))
    }

    fn last_run_distro(&self) -> Result<String> {
        self.last_run_distro
            .clone()
            .ok_or_else(|| Error::Feed("no last run distro".to_string()))
    }
}
