//! Object storage for published drivers.
//!
//! The [`ObjectStore`] trait is the narrow surface the bucket-facing verbs need:
//! paginated listing in key order, existence checks, uploads and deletions.
//! Implementations must be usable from several threads at once.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Page size used when walking a prefix.
pub const PAGE_SIZE: usize = 1000;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("{0}")]
    Other(String),
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Key to resume after, set when more keys remain.
    pub next: Option<String>,
}

pub trait ObjectStore: Send + Sync {
    /// Keys starting with `prefix` and sorting after `start_after`, at most
    /// `max_keys` of them.
    fn list_page(
        &self,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> Result<ListPage, StoreError>;

    fn head(&self, key: &str) -> Result<bool, StoreError>;

    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Every key under `prefix`, walking all pages.
    fn list_all(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut start_after: Option<String> = None;
        loop {
            let page = self.list_page(prefix, start_after.as_deref(), PAGE_SIZE)?;
            keys.extend(page.keys);
            match page.next {
                Some(next) => start_after = Some(next),
                None => return Ok(keys),
            }
        }
    }
}

/// Slices a sorted key iterator into a page.
pub(crate) fn paginate<'a>(
    sorted_keys: impl Iterator<Item = &'a String>,
    prefix: &str,
    start_after: Option<&str>,
    max_keys: usize,
) -> ListPage {
    let mut matching = sorted_keys
        .filter(|key| key.starts_with(prefix))
        .filter(|key| start_after.map_or(true, |after| key.as_str() > after));

    let keys: Vec<String> = matching.by_ref().take(max_keys).cloned().collect();
    let next = if matching.next().is_some() {
        keys.last().cloned()
    } else {
        None
    };

    ListPage { keys, next }
}
