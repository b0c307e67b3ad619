//! Building drivers from local configs.
//!
//! Each selected config is converted into a [`BuildSpec`] and handed to the
//! build backend. Configs whose artifacts are already published can be
//! skipped, and freshly built artifacts can be published by a background
//! thread while the next config builds.

use std::io::Write;
use std::sync::mpsc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::arch::Architecture;
use crate::backend::BuildBackend;
use crate::error::{Error, Result};
use crate::looper::{FsLooper, Looper};
use crate::options::Options;
use crate::paths;
use crate::publish::publish_file;
use crate::record::{to_build_spec, BuildSpec, ConfigRecord};
use crate::store::ObjectStore;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub options: Options,
    /// Skip configs whose outputs all exist in the store.
    pub skip_existing: bool,
    /// Keep going when a build fails.
    pub ignore_errors: bool,
    /// Append build failures to this file.
    pub redirect_errors: Option<Utf8PathBuf>,
    /// Upload artifacts once built.
    pub publish: bool,
}

impl BuildOptions {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            skip_existing: true,
            ignore_errors: false,
            redirect_errors: None,
            publish: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub built: usize,
    /// Configs whose outputs were already published.
    pub skipped: usize,
    pub failed: usize,
    /// Configs that request neither a module nor a probe.
    pub no_outputs: usize,
}

struct PublishJob {
    driver_version: String,
    path: Utf8PathBuf,
}

/// Builds every config the target selects.
///
/// `store` is consulted for `skip_existing` and required for `publish`.
pub fn build(
    opts: &BuildOptions,
    backend: &dyn BuildBackend,
    store: Option<&dyn ObjectStore>,
) -> Result<BuildReport> {
    if opts.publish && store.is_none() {
        return Err(Error::Usage("publishing requires an object store".to_string()));
    }

    let architecture = opts.options.architecture;
    let mut report = BuildReport::default();

    std::thread::scope(|scope| -> Result<()> {
        let (sender, publisher) = match (opts.publish, store) {
            (true, Some(store)) => {
                let (tx, rx) = mpsc::channel::<PublishJob>();
                let handle = scope.spawn(move || {
                    for job in rx {
                        if let Err(e) = publish_file(store, &job.driver_version, architecture, &job.path) {
                            tracing::warn!("Failed to publish {}: {}", job.path, e);
                        }
                    }
                });
                (Some(tx), Some(handle))
            }
            _ => (None, None),
        };

        let result = FsLooper::configs().loop_filtered(&opts.options, &mut |driver_version, path| {
            let record = ConfigRecord::read(Utf8Path::new(path))?;
            let spec = to_build_spec(
                &record,
                opts.options.repo_root(),
                driver_version,
                &opts.options.driver_name,
            );

            if spec.output.module.is_empty() && spec.output.probe.is_empty() {
                tracing::warn!("Skipping {}: config requests no outputs", path);
                report.no_outputs += 1;
                return Ok(());
            }

            if opts.skip_existing {
                if let Some(store) = store {
                    if already_published(store, driver_version, architecture, &spec)? {
                        tracing::info!("Skipping {}: outputs already published", path);
                        report.skipped += 1;
                        return Ok(());
                    }
                }
            }

            create_output_dirs(&spec)?;
            tracing::info!("Building {}", path);
            if let Err(e) = backend.build(&spec) {
                if let Some(file) = &opts.redirect_errors {
                    record_failure(file, path, &e.to_string())?;
                }
                if opts.ignore_errors {
                    tracing::warn!("Build of {} failed: {}", path, e);
                    report.failed += 1;
                    return Ok(());
                }
                return Err(e.into());
            }
            report.built += 1;

            if let Some(sender) = &sender {
                for output in [&spec.output.module, &spec.output.probe] {
                    if output.is_empty() || !Utf8Path::new(output).exists() {
                        continue;
                    }
                    let job = PublishJob {
                        driver_version: driver_version.to_string(),
                        path: Utf8PathBuf::from(output.as_str()),
                    };
                    if sender.send(job).is_err() {
                        tracing::warn!("Publisher stopped; not publishing {}", output);
                    }
                }
            }
            Ok(())
        });

        drop(sender);
        if let Some(handle) = publisher {
            if handle.join().is_err() {
                tracing::warn!("Publisher thread panicked");
            }
        }
        result
    })?;

    Ok(report)
}

/// True when every output the spec asks for is already in the store. The spec
/// must request at least one output.
fn already_published(
    store: &dyn ObjectStore,
    driver_version: &str,
    architecture: Architecture,
    spec: &BuildSpec,
) -> Result<bool> {
    for output in [&spec.output.module, &spec.output.probe] {
        if output.is_empty() {
            continue;
        }
        let Some(basename) = Utf8Path::new(output).file_name() else {
            return Ok(false);
        };
        let key = paths::object_key(driver_version, architecture, basename);
        if !store.head(&key)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn create_output_dirs(spec: &BuildSpec) -> Result<()> {
    for output in [&spec.output.module, &spec.output.probe] {
        if output.is_empty() {
            continue;
        }
        if let Some(dir) = Utf8Path::new(output).parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
    }
    Ok(())
}

fn record_failure(file: &Utf8Path, config: &str, message: &str) -> Result<()> {
    let mut out = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(|e| Error::io(file, e))?;
    writeln!(out, "{config}: {message}").map_err(|e| Error::io(file, e))
}
