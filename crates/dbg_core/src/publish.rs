//! Upload of locally built drivers.

use camino::Utf8Path;

use crate::arch::Architecture;
use crate::error::{Error, Result};
use crate::looper::{FsLooper, Looper};
use crate::options::Options;
use crate::paths;
use crate::store::ObjectStore;

/// Uploads every built driver the target selects and returns how many went up.
pub fn publish(opts: &Options, store: &dyn ObjectStore) -> Result<usize> {
    let mut published = 0;
    FsLooper::outputs().loop_filtered(opts, &mut |driver_version, path| {
        publish_file(store, driver_version, opts.architecture, Utf8Path::new(path))?;
        published += 1;
        Ok(())
    })?;
    Ok(published)
}

/// Uploads one artifact to `driver/{dv}/{arch}/{basename}` and returns the key.
pub fn publish_file(
    store: &dyn ObjectStore,
    driver_version: &str,
    architecture: Architecture,
    path: &Utf8Path,
) -> Result<String> {
    let basename = path
        .file_name()
        .ok_or_else(|| Error::Usage(format!("{path} has no file name")))?;
    let key = paths::object_key(driver_version, architecture, basename);
    let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;

    store.put(&key, &data)?;
    tracing::info!("Published {} to {}", path, key);

    Ok(key)
}
