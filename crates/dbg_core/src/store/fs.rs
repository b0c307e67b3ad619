use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use super::{paginate, ListPage, ObjectStore, StoreError};

/// Object store backed by a local directory, one file per key.
///
/// Keys use `/` separators and map to paths below the root.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: Utf8PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<Utf8PathBuf, StoreError> {
        if key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|part| part.is_empty() || part == "..")
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    /// Sorted keys of every file below the folder holding `prefix`.
    fn walk_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = match prefix.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => self.key_path(dir)?,
            Some(_) => return Err(StoreError::InvalidKey(prefix.to_string())),
            None => self.root.clone(),
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir).follow_links(false) {
            let entry = entry.map_err(|e| StoreError::Io {
                key: prefix.to_string(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| StoreError::InvalidKey(entry.path().display().to_string()))?;
            let Some(relative) = relative.to_str() else {
                continue;
            };
            keys.push(relative.replace(std::path::MAIN_SEPARATOR, "/"));
        }
        keys.sort();

        Ok(keys)
    }
}

impl ObjectStore for FsStore {
    fn list_page(
        &self,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> Result<ListPage, StoreError> {
        let keys = self.walk_keys(prefix)?;
        Ok(paginate(keys.iter(), prefix, start_after, max_keys))
    }

    fn head(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.key_path(key)?.is_file())
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        let io = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        std::fs::write(&path, data).map_err(io)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsStore) {
        let temp = TempDir::new().unwrap();
        let root = Utf8Path::from_path(temp.path()).unwrap().join("bucket");
        (temp, FsStore::new(root))
    }

    #[test]
    fn test_put_and_list() {
        let (_temp, store) = store();
        store.put("driver/1.0.0/x86_64/b.ko", b"b").unwrap();
        store.put("driver/1.0.0/x86_64/a.o", b"a").unwrap();
        store.put("driver/2.0.0/x86_64/c.ko", b"c").unwrap();

        let page = store.list_page("driver/1.0.0/x86_64", None, 10).unwrap();
        assert_eq!(
            page.keys,
            vec!["driver/1.0.0/x86_64/a.o", "driver/1.0.0/x86_64/b.ko"]
        );
        assert!(store.head("driver/2.0.0/x86_64/c.ko").unwrap());
    }

    #[test]
    fn test_list_below_prefix_folder() {
        let (_temp, store) = store();
        store.put("driver/1.0.0/x86_64/falco_centos_5.10.0_1.ko", b"").unwrap();
        store.put("driver/1.0.0/x86_64/falco_debian_6.1.0_1.ko", b"").unwrap();
        store.put("driver/1.0.0/x86_64-old/falco_centos_5.10.0_1.ko", b"").unwrap();
        store.put("driver/1.0.0/aarch64/falco_centos_5.10.0_1.ko", b"").unwrap();
        store.put("top.txt", b"").unwrap();

        // A prefix ending inside a file name still filters on the name.
        assert_eq!(
            store.list_all("driver/1.0.0/x86_64/falco_c").unwrap(),
            vec!["driver/1.0.0/x86_64/falco_centos_5.10.0_1.ko"]
        );
        assert_eq!(store.list_all("driver/1.0.0/x86_64/").unwrap().len(), 2);
        assert_eq!(store.list_all("driver/1.0.0/x86").unwrap().len(), 3);
        assert_eq!(store.list_all("").unwrap().len(), 5);
        assert!(store.list_all("driver/2.0.0/").unwrap().is_empty());
    }

    #[test]
    fn test_list_rejects_escaping_prefix() {
        let (_temp, store) = store();
        assert!(matches!(
            store.list_page("../driver/", None, 10),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_empty_root_lists_nothing() {
        let (_temp, store) = store();
        assert!(store.list_all("driver/").unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_temp, store) = store();
        store.delete("driver/nothing.ko").unwrap();
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let (_temp, store) = store();
        assert!(matches!(
            store.put("../outside", b""),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.head("/abs"), Err(StoreError::InvalidKey(_))));
    }
}
