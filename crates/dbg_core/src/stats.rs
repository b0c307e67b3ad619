//! Inventory of configs and published drivers per driver version.

use camino::Utf8Path;

use crate::error::Result;
use crate::identity::ArtifactKind;
use crate::looper::{FsLooper, Looper, StoreLooper};
use crate::options::Options;
use crate::record::ConfigRecord;
use crate::store::ObjectStore;

/// Counters for one driver version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub num_modules: usize,
    pub num_probes: usize,
    /// Configs listing at least one kernel header URL.
    pub num_headers: usize,
    /// Configs carrying kernel config data.
    pub num_config_data: usize,
}

impl std::ops::AddAssign for DriverStats {
    fn add_assign(&mut self, other: Self) {
        self.num_modules += other.num_modules;
        self.num_probes += other.num_probes;
        self.num_headers += other.num_headers;
        self.num_config_data += other.num_config_data;
    }
}

/// Per driver version counters, in the order the versions were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub entries: Vec<(String, DriverStats)>,
}

impl Stats {
    fn for_versions(driver_versions: &[String]) -> Self {
        Self {
            entries: driver_versions
                .iter()
                .map(|dv| (dv.clone(), DriverStats::default()))
                .collect(),
        }
    }

    fn entry_mut(&mut self, driver_version: &str) -> &mut DriverStats {
        let index = match self.entries.iter().position(|(dv, _)| dv == driver_version) {
            Some(index) => index,
            None => {
                self.entries
                    .push((driver_version.to_string(), DriverStats::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn get(&self, driver_version: &str) -> Option<&DriverStats> {
        self.entries
            .iter()
            .find(|(dv, _)| dv == driver_version)
            .map(|(_, stats)| stats)
    }

    pub fn totals(&self) -> DriverStats {
        let mut totals = DriverStats::default();
        for (_, stats) in &self.entries {
            totals += *stats;
        }
        totals
    }
}

/// Counts the outputs declared by local configs.
pub fn config_stats(opts: &Options) -> Result<Stats> {
    let opts = opts.clone().with_dry_run(false);
    let mut stats = Stats::for_versions(&opts.driver_versions);

    FsLooper::configs().loop_filtered(&opts, &mut |driver_version, path| {
        let record = ConfigRecord::read(Utf8Path::new(path))?;
        let entry = stats.entry_mut(driver_version);
        if record.has_module() {
            entry.num_modules += 1;
        }
        if record.has_probe() {
            entry.num_probes += 1;
        }
        if !record.kernel_urls.is_empty() {
            entry.num_headers += 1;
        }
        if !record.kernel_config_data.is_empty() {
            entry.num_config_data += 1;
        }
        Ok(())
    })?;

    Ok(stats)
}

/// Counts the drivers published in an object store.
pub fn driver_stats(opts: &Options, store: &dyn ObjectStore) -> Result<Stats> {
    let opts = opts.clone().with_dry_run(false);
    let mut stats = Stats::for_versions(&opts.driver_versions);

    StoreLooper::new(store).loop_filtered(&opts, &mut |driver_version, key| {
        let entry = stats.entry_mut(driver_version);
        match ArtifactKind::from_name(key) {
            Some(ArtifactKind::Module) => entry.num_modules += 1,
            Some(ArtifactKind::Probe) => entry.num_probes += 1,
            None => {}
        }
        Ok(())
    })?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Architecture;
    use crate::identity::Identity;
    use crate::paths;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_config_stats() {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap().to_owned();
        let opts = Options::new(root, Architecture::Amd64)
            .with_driver_versions(["2.0.0+driver", "1.0.0+driver"])
            .with_dry_run(true);

        let mut record = ConfigRecord::new(&Identity::new("centos", "5.10.0", "1"), Architecture::Amd64);
        record.fill_outputs("1.0.0+driver", "falco", Architecture::Amd64, true, false);
        record.kernel_urls = vec!["https://a".to_string()];
        record
            .write(&paths::config_path(opts.repo_root(), "1.0.0+driver", Architecture::Amd64, "centos_5.10.0_1.yaml"))
            .unwrap();

        let stats = config_stats(&opts).unwrap();
        assert_eq!(stats.entries[0].0, "2.0.0+driver");
        assert_eq!(stats.entries[0].1, DriverStats::default());
        let v1 = stats.get("1.0.0+driver").unwrap();
        assert_eq!(v1.num_modules, 1);
        assert_eq!(v1.num_probes, 0);
        assert_eq!(v1.num_headers, 1);
        assert_eq!(v1.num_config_data, 0);
    }

    #[test]
    fn test_driver_stats() {
        let store = MemoryStore::new();
        for key in [
            "driver/1.0.0/x86_64/falco_centos_5.10.0_1.ko",
            "driver/1.0.0/x86_64/falco_centos_5.10.0_1.o",
            "driver/1.0.0/x86_64/falco_debian_6.1.0_1.ko",
            "driver/1.0.0/x86_64/falco_debian_6.1.0_1.ko.sig",
            "driver/2.0.0/x86_64/falco_debian_6.1.0_1.o",
        ] {
            store.put(key, b"").unwrap();
        }
        let opts = Options::new("/repo", Architecture::Amd64).with_driver_versions(["1.0.0", "2.0.0"]);
        let stats = driver_stats(&opts, &store).unwrap();

        assert_eq!(stats.get("1.0.0").unwrap().num_modules, 2);
        assert_eq!(stats.get("1.0.0").unwrap().num_probes, 1);
        assert_eq!(stats.get("2.0.0").unwrap().num_probes, 1);
        let totals = stats.totals();
        assert_eq!((totals.num_modules, totals.num_probes), (2, 2));
    }
}
