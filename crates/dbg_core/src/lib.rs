//! Generation, filtering and bookkeeping of per-kernel driver build configs.
//!
//! A driver build pipeline keeps one YAML config per kernel it builds for,
//! partitioned by driver version and architecture:
//!
//! ```text
//! {repo_root}/driverkit/config/{driver_version}/{arch}/{distro}_{kernelrelease}_{kernelversion}.yaml
//! ```
//!
//! Built drivers end up next to them under `driverkit/output/` and are
//! published to an object store under `driver/{driver_version}/{arch}/`. This
//! crate provides:
//!
//! - **Naming**: [`Identity`] and [`NameCodec`], the bijective filename scheme
//! - **Filtering**: [`Target`] and [`TargetFilter`], regex filters over identities
//! - **Iteration**: [`FsLooper`] and [`StoreLooper`], running a visitor over the
//!   selected configs, outputs or published drivers
//! - **Verbs**: [`generate`], [`validate`], [`build`], [`config_stats`] /
//!   [`driver_stats`], [`cleanup_configs`] / [`cleanup_drivers`] and [`publish`]
//!
//! # Example
//!
//! ```no_run
//! use dbg_core::{Architecture, Options, Target};
//!
//! # fn main() -> dbg_core::Result<()> {
//! let opts = Options::new("/src/test-infra", Architecture::Amd64)
//!     .with_driver_versions(["5.0.1+driver"])
//!     .with_target(Target::new("centos", "", ""));
//!
//! let stats = dbg_core::config_stats(&opts)?;
//! println!("{} modules", stats.totals().num_modules);
//! # Ok(())
//! # }
//! ```

pub mod arch;
pub mod backend;
pub mod build;
pub mod cleanup;
pub mod distro;
pub mod error;
pub mod feed;
pub mod generate;
pub mod identity;
pub mod kernel;
pub mod looper;
pub mod options;
pub mod paths;
pub mod publish;
pub mod record;
pub mod stats;
pub mod store;
pub mod target;
pub mod validate;

// Re-export main types
pub use arch::Architecture;
pub use backend::{BackendError, BuildBackend, OracleBackend};
pub use build::{build, BuildOptions, BuildReport};
pub use cleanup::{cleanup_configs, cleanup_drivers};
pub use error::{Error, Result};
pub use feed::{parse_feed, FeedPayload, KernelEntry, KernelFeed, StaticFeed};
pub use generate::{generate, GenerateOptions};
pub use identity::{ArtifactKind, Identity, NameCodec};
pub use kernel::KernelRelease;
pub use looper::{FsLooper, Looper, StoreLooper};
pub use options::Options;
pub use publish::publish;
pub use record::{to_build_spec, BuildSpec, ConfigRecord, OutputPaths};
pub use stats::{config_stats, driver_stats, DriverStats, Stats};
pub use store::{FsStore, MemoryStore, ObjectStore, StoreError};
pub use target::{Target, TargetFilter};
pub use validate::validate;
