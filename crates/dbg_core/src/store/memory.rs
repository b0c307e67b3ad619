use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{paginate, ListPage, ObjectStore, StoreError};

/// Object store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().ok()?.get(key).cloned()
    }
}

fn poisoned() -> StoreError {
    StoreError::Other("memory store lock poisoned".to_string())
}

impl ObjectStore for MemoryStore {
    fn list_page(
        &self,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> Result<ListPage, StoreError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(paginate(objects.keys(), prefix, start_after, max_keys))
    }

    fn head(&self, key: &str) -> Result<bool, StoreError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects.contains_key(key))
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        objects.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        objects.remove(key);
        Ok(())
    }
}
