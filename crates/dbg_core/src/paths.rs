//! Deterministic layout of configs, build outputs and object keys.
//!
//! Every path is partitioned by driver version and architecture, and always
//! uses the kernel-style architecture name (`x86_64`), never the Debian one:
//!
//! ```text
//! {repo_root}/driverkit/config/{driver_version}/{arch}/{distro}_{kr}_{kv}.yaml
//! {repo_root}/driverkit/output/{driver_version}/{arch}/{driver}_{distro}_{kr}_{kv}.{ko|o}
//! driver/{driver_version}/{arch}/{driver}_{distro}_{kr}_{kv}.{ko|o}
//! ```

use camino::{Utf8Path, Utf8PathBuf};

use crate::arch::Architecture;
use crate::error::{Error, Result};

pub const DRIVERKIT_DIR: &str = "driverkit";
pub const CONFIG_DIR: &str = "config";
pub const OUTPUT_DIR: &str = "output";
pub const OBJECT_KEY_ROOT: &str = "driver";

/// `{repo_root}/driverkit/config/{driver_version}/{arch}`
pub fn config_dir(repo_root: &Utf8Path, driver_version: &str, arch: Architecture) -> Utf8PathBuf {
    repo_root
        .join(DRIVERKIT_DIR)
        .join(CONFIG_DIR)
        .join(driver_version)
        .join(arch.non_deb())
}

/// Path of a config file. An empty `filename` yields the partition directory.
pub fn config_path(
    repo_root: &Utf8Path,
    driver_version: &str,
    arch: Architecture,
    filename: &str,
) -> Utf8PathBuf {
    let dir = config_dir(repo_root, driver_version, arch);
    if filename.is_empty() {
        dir
    } else {
        dir.join(filename)
    }
}

/// Path of a build output. `filename` is the part after the driver name prefix
/// (`centos_5.10.0_1.ko`); an empty `filename` yields the output directory.
pub fn output_path(
    repo_root: &Utf8Path,
    driver_version: &str,
    arch: Architecture,
    driver_name: &str,
    filename: &str,
) -> Utf8PathBuf {
    let dir = repo_root
        .join(DRIVERKIT_DIR)
        .join(OUTPUT_DIR)
        .join(driver_version)
        .join(arch.non_deb());
    if filename.is_empty() {
        dir
    } else {
        dir.join(format!("{driver_name}_{filename}"))
    }
}

/// Output path as stored in config records, relative to `{repo_root}/driverkit`.
pub fn relative_output_path(
    driver_version: &str,
    arch: Architecture,
    driver_name: &str,
    filename: &str,
) -> String {
    format!(
        "{OUTPUT_DIR}/{driver_version}/{}/{driver_name}_{filename}",
        arch.non_deb()
    )
}

/// `driver/{driver_version}/{arch}`
pub fn object_key_prefix(driver_version: &str, arch: Architecture) -> String {
    format!("{OBJECT_KEY_ROOT}/{driver_version}/{}", arch.non_deb())
}

/// `driver/{driver_version}/{arch}/{basename}`
pub fn object_key(driver_version: &str, arch: Architecture, basename: &str) -> String {
    format!("{}/{basename}", object_key_prefix(driver_version, arch))
}

/// Lists the driver versions that have a config folder, sorted.
pub fn discover_driver_versions(repo_root: &Utf8Path) -> Result<Vec<String>> {
    let root = repo_root.join(DRIVERKIT_DIR).join(CONFIG_DIR);
    let entries = std::fs::read_dir(&root).map_err(|e| Error::io(&root, e))?;

    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&root, e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(&root, e))?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| Error::InvalidUtf8Path(name.to_string_lossy().into_owned()))?;
        versions.push(name);
    }
    versions.sort();

    Ok(versions)
}
