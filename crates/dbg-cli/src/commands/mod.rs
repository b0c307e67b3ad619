use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use dbg_core::{paths, Architecture, FsStore, Options, Target};
use miette::Result;

use crate::errors::CliError;
use crate::utils::config::{load_config, RepoConfig};

mod build;
mod cleanup;
mod generate;
mod publish;
mod stats;
mod validate;

pub use build::{build_configs, BuildConfigsArgs};
pub use cleanup::{cleanup_configs, cleanup_drivers};
pub use generate::{generate_configs, GenerateConfigsArgs};
pub use publish::publish_drivers;
pub use stats::{stats_configs, stats_drivers};
pub use validate::validate_configs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Flags shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Only print what would be done
    #[arg(long, global = true, env = "DBG_DRY_RUN")]
    pub dry_run: bool,

    /// Log level; RUST_LOG takes precedence
    #[arg(short, long, global = true, value_enum, default_value = "info", env = "DBG_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Repository root holding the driverkit folder [default: current directory]
    #[arg(long, global = true, env = "DBG_REPO_ROOT")]
    pub repo_root: Option<String>,

    /// Target architecture (amd64, x86_64, arm64, aarch64) [default: host]
    #[arg(short, long, global = true, env = "DBG_ARCHITECTURE")]
    pub architecture: Option<String>,

    /// Driver versions to operate on [default: all config folders]
    #[arg(long = "driver-version", global = true, env = "DBG_DRIVER_VERSION", value_delimiter = ',')]
    pub driver_versions: Vec<String>,

    /// Name of the built drivers [default: falco]
    #[arg(long, global = true, env = "DBG_DRIVER_NAME")]
    pub driver_name: Option<String>,

    /// Target distro regex (feed or backend naming)
    #[arg(long, global = true, env = "DBG_TARGET_DISTRO")]
    pub target_distro: Option<String>,

    /// Target kernel release regex
    #[arg(long, global = true, env = "DBG_TARGET_KERNELRELEASE")]
    pub target_kernelrelease: Option<String>,

    /// Target kernel version regex
    #[arg(long, global = true, env = "DBG_TARGET_KERNELVERSION")]
    pub target_kernelversion: Option<String>,
}

/// Driver versions with a config folder. A missing folder means there are none;
/// any other failure is reported as is.
fn discover_driver_versions(repo_root: &Utf8Path) -> std::result::Result<Vec<String>, CliError> {
    let config_dir = repo_root.join(paths::DRIVERKIT_DIR).join(paths::CONFIG_DIR);
    match paths::discover_driver_versions(repo_root) {
        Ok(versions) if !versions.is_empty() => Ok(versions),
        Ok(_) => Err(CliError::no_driver_versions(config_dir)),
        Err(dbg_core::Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::no_driver_versions(config_dir))
        }
        Err(source) => Err(CliError::DriverVersionDiscovery { config_dir, source }),
    }
}

/// Everything a command needs: resolved options plus the repository config.
#[derive(Debug, Clone)]
pub struct Context {
    pub options: Options,
    pub config: RepoConfig,
}

impl Context {
    /// Resolves flags against `dbg.toml` and built-in defaults.
    pub fn resolve(global: &GlobalArgs) -> Result<Self> {
        let repo_root = match &global.repo_root {
            Some(root) => Utf8PathBuf::from(root.as_str()),
            None => {
                let cwd = std::env::current_dir().map_err(CliError::from)?;
                Utf8PathBuf::from_path_buf(cwd)
                    .map_err(|p| CliError::invalid_path(p.display()))?
            }
        };
        let config = load_config(&repo_root)?;

        let architecture = match global.architecture.as_ref().or(config.architecture.as_ref()) {
            Some(arch) => arch
                .parse::<Architecture>()
                .map_err(|_| CliError::unsupported_architecture(arch.clone()))?,
            None => Architecture::host().ok_or_else(|| {
                CliError::unsupported_architecture(std::env::consts::ARCH.to_string())
            })?,
        };

        let driver_versions = if !global.driver_versions.is_empty() {
            global.driver_versions.clone()
        } else if !config.driver_versions.is_empty() {
            config.driver_versions.clone()
        } else {
            discover_driver_versions(&repo_root)?
        };

        let driver_name = global
            .driver_name
            .clone()
            .or_else(|| config.driver_name.clone())
            .unwrap_or_else(|| dbg_core::options::DEFAULT_DRIVER_NAME.to_string());

        let target = Target::new(
            global.target_distro.clone().unwrap_or_default(),
            global.target_kernelrelease.clone().unwrap_or_default(),
            global.target_kernelversion.clone().unwrap_or_default(),
        );

        let options = Options::new(repo_root, architecture)
            .with_dry_run(global.dry_run)
            .with_driver_name(driver_name)
            .with_driver_versions(driver_versions)
            .with_target(target);

        tracing::debug!(
            "Resolved options: repo_root={} architecture={} driver_name={} driver_versions={:?}",
            options.repo_root,
            options.architecture,
            options.driver_name,
            options.driver_versions
        );

        Ok(Self { options, config })
    }

    /// Directory-backed store from `--bucket`, falling back to `dbg.toml`.
    pub fn bucket(&self, flag: Option<&str>) -> Result<FsStore> {
        let bucket = flag
            .map(str::to_string)
            .or_else(|| self.config.bucket.clone())
            .ok_or(CliError::MissingBucket)?;
        Ok(FsStore::new(bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root(temp: &TempDir) -> Utf8PathBuf {
        Utf8Path::from_path(temp.path()).unwrap().to_owned()
    }

    #[test]
    fn discovers_version_folders() {
        let temp = TempDir::new().unwrap();
        let root = root(&temp);
        std::fs::create_dir_all(root.join("driverkit/config/1.0.0+driver")).unwrap();
        assert_eq!(discover_driver_versions(&root).unwrap(), vec!["1.0.0+driver"]);
    }

    #[test]
    fn missing_config_folder_means_no_versions() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            discover_driver_versions(&root(&temp)),
            Err(CliError::NoDriverVersions { .. })
        ));
    }

    #[test]
    fn unreadable_config_folder_keeps_the_cause() {
        let temp = TempDir::new().unwrap();
        let root = root(&temp);
        // A file where the config folder should be cannot be listed.
        std::fs::create_dir_all(root.join("driverkit")).unwrap();
        std::fs::write(root.join("driverkit/config"), "").unwrap();
        assert!(matches!(
            discover_driver_versions(&root),
            Err(CliError::DriverVersionDiscovery {
                source: dbg_core::Error::Io { .. },
                ..
            })
        ));
    }
}
