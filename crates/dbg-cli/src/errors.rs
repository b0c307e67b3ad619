use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Unsupported architecture: {architecture}")]
    #[diagnostic(
        code(options::unsupported_architecture),
        help("Use one of: {supported}")
    )]
    UnsupportedArchitecture {
        architecture: String,
        supported: String,
    },

    #[error("No driver versions found under {config_dir}")]
    #[diagnostic(
        code(options::no_driver_versions),
        help("Pass --driver-version, set driver_versions in dbg.toml, or create driverkit/config/<version>/ in the repository")
    )]
    NoDriverVersions { config_dir: Utf8PathBuf },

    #[error("Failed to list driver versions under {config_dir}")]
    #[diagnostic(
        code(options::driver_version_discovery),
        help("Check that the folder is readable, or pass --driver-version")
    )]
    DriverVersionDiscovery {
        config_dir: Utf8PathBuf,
        #[source]
        source: dbg_core::Error,
    },

    #[error("No bucket configured")]
    #[diagnostic(
        code(options::missing_bucket),
        help("Pass --bucket <dir> or set bucket in dbg.toml")
    )]
    MissingBucket,

    #[error("Path is not valid UTF-8: {path}")]
    #[diagnostic(code(fs::invalid_path))]
    InvalidPath { path: String },

    #[error("Configuration file error in {path}")]
    #[diagnostic(
        code(config::parse_error),
        help("Check dbg.toml for syntax errors")
    )]
    ConfigParseError {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn unsupported_architecture(architecture: String) -> Self {
        Self::UnsupportedArchitecture {
            architecture,
            supported: dbg_core::arch::supported_arch_list().join(", "),
        }
    }

    pub fn no_driver_versions(config_dir: Utf8PathBuf) -> Self {
        Self::NoDriverVersions { config_dir }
    }

    pub fn invalid_path(path: impl std::fmt::Display) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
        }
    }
}
