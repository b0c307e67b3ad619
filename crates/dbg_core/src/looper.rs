//! Iteration over filtered candidates, per driver version.
//!
//! A [`Looper`] walks every requested driver version, finds the candidates the
//! target selects and hands each one to a visitor. Two realizations exist:
//!
//! - [`FsLooper`] expands a glob built from the target inside the local config
//!   or output folder. The glob already encodes the filter, so matches are not
//!   re-checked.
//! - [`StoreLooper`] pages through the object store, decodes each key and
//!   applies the target filter field by field. Keys not following the naming
//!   scheme are skipped with a warning.
//!
//! In dry-run mode every match is logged and skipped; iteration goes on with
//! the next candidate. The first visitor error stops the whole loop.

use camino::Utf8PathBuf;

use crate::error::{Error, Result};
use crate::identity::ArtifactKind;
use crate::options::Options;
use crate::paths;
use crate::store::{ObjectStore, PAGE_SIZE};

/// Visitor invoked with `(driver_version, candidate)`. The candidate is a file
/// path for [`FsLooper`] and an object key for [`StoreLooper`].
pub type Visit<'v> = dyn FnMut(&str, &str) -> Result<()> + 'v;

pub trait Looper {
    fn loop_filtered(&self, opts: &Options, visit: &mut Visit<'_>) -> Result<()>;
}

/// Which local folder an [`FsLooper`] walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTree {
    /// `driverkit/config/{dv}/{arch}/*.yaml`
    Configs,
    /// `driverkit/output/{dv}/{arch}/{driver}_*.{ko,o}`
    Outputs,
}

#[derive(Debug, Clone, Copy)]
pub struct FsLooper {
    tree: LocalTree,
}

impl FsLooper {
    pub fn new(tree: LocalTree) -> Self {
        Self { tree }
    }

    pub fn configs() -> Self {
        Self::new(LocalTree::Configs)
    }

    pub fn outputs() -> Self {
        Self::new(LocalTree::Outputs)
    }

    /// Glob patterns selecting the target's candidates in one driver version.
    pub fn patterns(&self, opts: &Options, driver_version: &str) -> Vec<String> {
        match self.tree {
            LocalTree::Configs => {
                let dir = paths::config_path(opts.repo_root(), driver_version, opts.architecture, "");
                vec![format!(
                    "{}/{}",
                    glob::Pattern::escape(dir.as_str()),
                    opts.target.to_glob(".yaml")
                )]
            }
            LocalTree::Outputs => {
                let dir = paths::output_path(
                    opts.repo_root(),
                    driver_version,
                    opts.architecture,
                    &opts.driver_name,
                    "",
                );
                [ArtifactKind::Module, ArtifactKind::Probe]
                    .iter()
                    .map(|kind| {
                        format!(
                            "{}/{}_{}",
                            glob::Pattern::escape(dir.as_str()),
                            glob::Pattern::escape(&opts.driver_name),
                            opts.target.to_glob(&format!(".{}", kind.extension()))
                        )
                    })
                    .collect()
            }
        }
    }
}

impl Looper for FsLooper {
    fn loop_filtered(&self, opts: &Options, visit: &mut Visit<'_>) -> Result<()> {
        for driver_version in &opts.driver_versions {
            for pattern in self.patterns(opts, driver_version) {
                tracing::debug!("Globbing {}", pattern);
                for entry in glob::glob(&pattern)? {
                    let path = Utf8PathBuf::from_path_buf(entry?)
                        .map_err(|p| Error::InvalidUtf8Path(p.display().to_string()))?;

                    tracing::info!(driver_version = %driver_version, "Matched {}", path);
                    if opts.dry_run {
                        tracing::info!("Skipping {} because of dry-run.", path);
                        continue;
                    }
                    visit(driver_version, path.as_str())?;
                }
            }
        }
        Ok(())
    }
}

/// Loops over the drivers published in an object store.
pub struct StoreLooper<'s> {
    store: &'s dyn ObjectStore,
    page_size: usize,
}

impl<'s> StoreLooper<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self {
            store,
            page_size: PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

impl Looper for StoreLooper<'_> {
    fn loop_filtered(&self, opts: &Options, visit: &mut Visit<'_>) -> Result<()> {
        let codec = opts.codec()?;
        let filter = opts.filter()?;

        for driver_version in &opts.driver_versions {
            let prefix = format!(
                "{}/",
                paths::object_key_prefix(driver_version, opts.architecture)
            );
            let mut start_after: Option<String> = None;

            loop {
                let page = self
                    .store
                    .list_page(&prefix, start_after.as_deref(), self.page_size)?;

                for key in &page.keys {
                    let basename = key.rsplit('/').next().unwrap_or(key);
                    let identity = match codec.decode_artifact(basename) {
                        Ok((identity, _)) => identity,
                        Err(Error::MalformedKey { key }) => {
                            tracing::warn!("Skipping malformed key {}", key);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    if !filter.matches(&identity) {
                        tracing::debug!("Key {} filtered out", key);
                        continue;
                    }

                    tracing::info!(driver_version = %driver_version, "Matched {}", key);
                    if opts.dry_run {
                        tracing::info!("Skipping {} because of dry-run.", key);
                        continue;
                    }
                    visit(driver_version, key)?;
                }

                match page.next {
                    Some(next) => start_after = Some(next),
                    None => break,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Architecture;
    use crate::store::MemoryStore;
    use crate::target::Target;
    use camino::Utf8Path;
    use tempfile::TempDir;

    fn touch(path: &Utf8Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn collect(looper: &dyn Looper, opts: &Options) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        looper
            .loop_filtered(opts, &mut |dv, candidate| {
                seen.push((dv.to_string(), candidate.to_string()));
                Ok(())
            })
            .unwrap();
        seen.sort();
        seen
    }

    fn fs_fixture() -> (TempDir, Options) {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap().to_owned();
        for name in [
            "centos_5.10.0_1.yaml",
            "centos_4.18.0_1.yaml",
            "ubuntu_5.10.0_2.yaml",
        ] {
            touch(&paths::config_path(&root, "1.0.0+driver", Architecture::Amd64, name));
        }
        touch(&paths::config_path(&root, "2.0.0+driver", Architecture::Amd64, "debian_6.1.0_1.yaml"));
        let opts = Options::new(root, Architecture::Amd64).with_driver_versions(["1.0.0+driver"]);
        (temp, opts)
    }

    #[test]
    fn test_fs_looper_filters_by_glob() {
        let (_temp, opts) = fs_fixture();
        let opts = opts.with_target(Target::new("centos", "", ""));
        let seen = collect(&FsLooper::configs(), &opts);
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(dv, path)| dv == "1.0.0+driver" && path.contains("centos_")));
    }

    #[test]
    fn test_fs_looper_empty_target_sees_partition_only() {
        let (_temp, opts) = fs_fixture();
        let seen = collect(&FsLooper::configs(), &opts);
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(_, path)| !path.contains("2.0.0+driver")));
    }

    #[test]
    fn test_fs_looper_dry_run_visits_nothing() {
        let (_temp, opts) = fs_fixture();
        let opts = opts.with_dry_run(true);
        assert!(collect(&FsLooper::configs(), &opts).is_empty());
    }

    #[test]
    fn test_fs_looper_first_error_aborts() {
        let (_temp, opts) = fs_fixture();
        let mut calls = 0;
        let result = FsLooper::configs().loop_filtered(&opts, &mut |_, _| {
            calls += 1;
            Err(Error::Usage("boom".to_string()))
        });
        assert!(matches!(result, Err(Error::Usage(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_fs_looper_outputs() {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap().to_owned();
        let out = |f: &str| paths::output_path(&root, "1.0.0", Architecture::Arm64, "falco", f);
        touch(&out("centos_5.10.0_1.ko"));
        touch(&out("centos_5.10.0_1.o"));
        touch(&out("centos_5.10.0_1.yaml"));
        touch(&paths::output_path(&root, "1.0.0", Architecture::Arm64, "other", "centos_5.10.0_1.ko"));

        let opts = Options::new(root.clone(), Architecture::Arm64).with_driver_versions(["1.0.0"]);
        let seen = collect(&FsLooper::outputs(), &opts);
        assert_eq!(seen.len(), 2);
    }

    fn store_fixture() -> MemoryStore {
        let store = MemoryStore::new();
        for key in [
            "driver/1.0.0+driver/x86_64/falco_centos_5.10.0_1.ko",
            "driver/1.0.0+driver/x86_64/falco_centos_5.10.0_1.o",
            "driver/1.0.0+driver/x86_64/falco_ubuntu-generic_5.15.0-86-generic_96.ko",
            "driver/1.0.0+driver/x86_64/index.html",
            "driver/1.0.0+driver/aarch64/falco_centos_5.10.0_1.ko",
            "driver/2.0.0+driver/x86_64/falco_centos_5.10.0_1.ko",
        ] {
            store.put(key, b"").unwrap();
        }
        store
    }

    #[test]
    fn test_store_looper_filters_and_skips_malformed() {
        let store = store_fixture();
        let opts = Options::new("/repo", Architecture::Amd64)
            .with_driver_versions(["1.0.0+driver"])
            .with_target(Target::new("centos", "", ""));
        let seen = collect(&StoreLooper::new(&store), &opts);
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(_, key)| key.contains("falco_centos_")));
    }

    #[test]
    fn test_store_looper_paginates() {
        let store = store_fixture();
        let opts = Options::new("/repo", Architecture::Amd64).with_driver_versions(["1.0.0+driver"]);
        let seen = collect(&StoreLooper::new(&store).with_page_size(1), &opts);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_store_looper_first_error_aborts() {
        let store = store_fixture();
        let opts = Options::new("/repo", Architecture::Amd64)
            .with_driver_versions(["1.0.0+driver", "2.0.0+driver"]);
        let mut visited = Vec::new();
        let result = StoreLooper::new(&store)
            .with_page_size(1)
            .loop_filtered(&opts, &mut |dv, key| {
                visited.push((dv.to_string(), key.to_string()));
                Err(Error::Usage("boom".to_string()))
            });
        assert!(matches!(result, Err(Error::Usage(_))));
        assert_eq!(
            visited,
            vec![(
                "1.0.0+driver".to_string(),
                "driver/1.0.0+driver/x86_64/falco_centos_5.10.0_1.ko".to_string()
            )]
        );
    }

    #[test]
    fn test_store_looper_dry_run() {
        let store = store_fixture();
        let opts = Options::new("/repo", Architecture::Amd64)
            .with_driver_versions(["1.0.0+driver", "2.0.0+driver"])
            .with_dry_run(true);
        assert!(collect(&StoreLooper::new(&store), &opts).is_empty());
    }
}
