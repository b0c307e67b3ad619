//! Kernel crawler feed over HTTP.

use std::time::Duration;

use dbg_core::{Architecture, Error, KernelFeed};

pub const KERNEL_CRAWLER_URL: &str =
    "https://raw.githubusercontent.com/falcosecurity/kernel-crawler/kernels";

pub struct HttpFeed {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpFeed {
    pub fn new() -> dbg_core::Result<Self> {
        Self::with_base_url(KERNEL_CRAWLER_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> dbg_core::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("dbg/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Feed(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn kernels_url(&self, architecture: Architecture) -> String {
        format!("{}/{}/list.json", self.base_url, architecture.non_deb())
    }

    pub fn last_run_distro_url(&self) -> String {
        format!("{}/last_run_distro.txt", self.base_url)
    }

    fn get(&self, url: &str) -> dbg_core::Result<Vec<u8>> {
        tracing::debug!("Fetching {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| Error::Feed(format!("{url}: {e}")))?;
        let body = resp
            .bytes()
            .map_err(|e| Error::Feed(format!("{url}: {e}")))?;
        Ok(body.to_vec())
    }
}

impl KernelFeed for HttpFeed {
    fn fetch_kernels(&self, architecture: Architecture) -> dbg_core::Result<Vec<u8>> {
        self.get(&self.kernels_url(architecture))
    }

    fn last_run_distro(&self) -> dbg_core::Result<String> {
        let body = self.get(&self.last_run_distro_url())?;
        Ok(String::from_utf8_lossy(&body).trim().to_string())
    }
}
