//! Removal of configs and published drivers.

use crate::error::{Error, Result};
use crate::looper::{FsLooper, Looper, StoreLooper};
use crate::options::Options;
use crate::paths;
use crate::store::ObjectStore;

/// Removes the configs the target selects and returns how many entries went
/// away (a whole partition folder counts once).
///
/// Without any filter the whole `config/{dv}/{arch}` folder of each driver
/// version is removed in one go.
pub fn cleanup_configs(opts: &Options) -> Result<usize> {
    if opts.target.is_empty() {
        let mut removed = 0;
        for driver_version in &opts.driver_versions {
            let dir = paths::config_path(opts.repo_root(), driver_version, opts.architecture, "");
            if opts.dry_run {
                tracing::info!("Skipping removal of {} because of dry-run.", dir);
                continue;
            }
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {
                    tracing::info!("Removed {}", dir);
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!("Nothing to remove at {}", dir);
                }
                Err(e) => return Err(Error::io(dir, e)),
            }
        }
        return Ok(removed);
    }

    let mut removed = 0;
    FsLooper::configs().loop_filtered(opts, &mut |_driver_version, path| {
        std::fs::remove_file(path).map_err(|e| Error::io(path, e))?;
        tracing::info!("Removed {}", path);
        removed += 1;
        Ok(())
    })?;
    Ok(removed)
}

/// Deletes the published drivers the target selects.
pub fn cleanup_drivers(opts: &Options, store: &dyn ObjectStore) -> Result<usize> {
    let mut removed = 0;
    StoreLooper::new(store).loop_filtered(opts, &mut |_driver_version, key| {
        store.delete(key)?;
        tracing::info!("Deleted {}", key);
        removed += 1;
        Ok(())
    })?;
    Ok(removed)
}
