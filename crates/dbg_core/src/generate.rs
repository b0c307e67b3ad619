//! Config generation.
//!
//! Two modes exist. Automatic generation reads the kernel feed for the
//! configured architecture and writes one config per kernel the target selects,
//! processing each feed distro on its own rayon task. Single-target generation
//! skips the feed and asks the build backend for the headers of exactly one
//! kernel. Either way every record is written once per driver version.
//!
//! Automatic generation is not transactional: when one distro fails, configs
//! already written for other distros stay on disk and the first error (in feed
//! distro order) is returned.

use rayon::prelude::*;

use crate::backend::{BackendError, BuildBackend};
use crate::distro;
use crate::error::{Error, Result};
use crate::feed::{KernelEntry, KernelFeed};
use crate::identity::Identity;
use crate::options::Options;
use crate::paths;
use crate::record::ConfigRecord;
use crate::target::TargetFilter;

/// Target distro value asking for the distro the feed crawled last.
pub const LOAD_LAST_RUN_DISTRO: &str = "load";

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub options: Options,
    /// Generate from the kernel feed instead of a single target.
    pub auto: bool,
}

impl GenerateOptions {
    pub fn new(options: Options, auto: bool) -> Self {
        Self { options, auto }
    }
}

/// Generates configs and returns how many records were produced (or would have
/// been, in dry-run mode), counting each driver version separately.
pub fn generate(
    opts: &GenerateOptions,
    feed: &dyn KernelFeed,
    backend: &dyn BuildBackend,
) -> Result<usize> {
    if opts.auto {
        auto_generate(&opts.options, feed, backend)
    } else if opts.options.target.is_set() {
        single_generate(&opts.options, backend)
    } else {
        Err(Error::Usage(
            "either \"auto\" or target-{distro,kernelrelease,kernelversion} must be passed"
                .to_string(),
        ))
    }
}

fn auto_generate(opts: &Options, feed: &dyn KernelFeed, backend: &dyn BuildBackend) -> Result<usize> {
    let mut opts = opts.clone();
    if opts.target.distro == LOAD_LAST_RUN_DISTRO {
        let last = feed.last_run_distro()?;
        let last = last.trim();
        tracing::info!("Loaded last run distro: {}", last);
        // Exact match: `amazonlinux2` must not select `amazonlinux2023`.
        opts.target.distro = format!("^{}$", regex::escape(&distro::to_backend_distro(last)));
    }

    let filter = opts.filter()?;
    let payload = feed.kernels(opts.architecture)?;

    let mut selected: Vec<(String, &Vec<KernelEntry>)> = Vec::new();
    for (feed_distro, entries) in &payload {
        let backend_distro = distro::to_backend_distro(feed_distro);
        if !filter.distro_filter(&backend_distro) {
            tracing::debug!("Skipping distro {}", feed_distro);
            continue;
        }
        selected.push((backend_distro, entries));
    }
    tracing::info!(
        "Generating configs for {} distro(s) on {}",
        selected.len(),
        opts.architecture.non_deb()
    );

    let results: Vec<Result<usize>> = selected
        .par_iter()
        .map(|(backend_distro, entries)| {
            generate_distro(&opts, &filter, backend, backend_distro, entries)
        })
        .collect();

    let mut written = 0;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(count) => written += count,
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => tracing::warn!("Additional generation failure: {}", e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(written),
    }
}

fn generate_distro(
    opts: &Options,
    filter: &TargetFilter,
    backend: &dyn BuildBackend,
    backend_distro: &str,
    entries: &[KernelEntry],
) -> Result<usize> {
    let mut written = 0;
    for entry in entries {
        if !filter.kernel_release_filter(&entry.kernel_release)
            || !filter.kernel_version_filter(&entry.kernel_version)
        {
            continue;
        }

        // Feed entries name the exact builder (e.g. `ubuntu-aws`); fall back to
        // the translated distro key.
        let target = if entry.target.is_empty() {
            backend_distro
        } else {
            entry.target.as_str()
        };
        let identity = Identity::new(target, &entry.kernel_release, &entry.kernel_version);

        let mut record = ConfigRecord::new(&identity, opts.architecture);
        record.kernel_urls = entry.headers.clone();
        record.kernel_config_data = entry.kernel_config_data.clone();

        written += dump_config(opts, backend, &mut record)?;
    }
    Ok(written)
}

fn single_generate(opts: &Options, backend: &dyn BuildBackend) -> Result<usize> {
    let identity = opts
        .target
        .to_identity()
        .ok_or_else(|| Error::Usage("target must be fully set".to_string()))?;

    let urls = match backend.resolve_header_urls(&identity, opts.architecture) {
        Ok(urls) => urls,
        Err(BackendError::Unsupported { distro }) => {
            return Err(Error::UnsupportedTarget { distro });
        }
        Err(e) => {
            tracing::warn!("Failed to resolve headers for {}: {}", identity, e);
            Vec::new()
        }
    };

    let mut record = ConfigRecord::new(&identity, opts.architecture);
    record.kernel_urls = urls;
    dump_config(opts, backend, &mut record)
}

/// Writes `record` once per driver version.
fn dump_config(opts: &Options, backend: &dyn BuildBackend, record: &mut ConfigRecord) -> Result<usize> {
    record.kernel_urls.sort();
    let identity = record.identity();
    let supports_module = backend.supports_module(&record.kernel_release, opts.architecture);
    let supports_probe = backend.supports_probe(&record.kernel_release, opts.architecture);

    let mut written = 0;
    for driver_version in &opts.driver_versions {
        record.fill_outputs(
            driver_version,
            &opts.driver_name,
            opts.architecture,
            supports_module,
            supports_probe,
        );
        let path = paths::config_path(
            opts.repo_root(),
            driver_version,
            opts.architecture,
            &identity.config_name(),
        );

        if opts.dry_run {
            tracing::info!(config = %path, "Skipping because of dry-run.");
            continue;
        }
        record.write(&path)?;
        tracing::debug!("Wrote {}", path);
        written += 1;
    }

    if opts.dry_run {
        Ok(opts.driver_versions.len())
    } else {
        Ok(written)
    }
}
