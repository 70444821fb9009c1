use std::fmt::{self, Display, Formatter};

use crate::io::Response;
use crate::{log_debug, Result};

pub mod filesystem;
pub mod memory;
pub mod nostore;

pub use filesystem::FileStore;
pub use memory::MemoryStore;
pub use nostore::NoStore;

/// Version tag embedded in partition names. All four partitions share one
/// tag; bumping it in the config evicts every old partition on the next
/// activation.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new<T: Into<String>>(tag: T) -> Self {
        VersionTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VersionTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    Static,
    Dynamic,
    Image,
    Api,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 4] = [
        PartitionKind::Static,
        PartitionKind::Dynamic,
        PartitionKind::Image,
        PartitionKind::Api,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Image => "image",
            PartitionKind::Api => "api",
        }
    }

    /// Naming convention external tooling relies on: `{kind}-{versionTag}`.
    pub fn versioned_name(&self, tag: &VersionTag) -> String {
        format!("{}-{}", self.as_str(), tag)
    }
}

impl Display for PartitionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named, versioned key-value stores mapping a request identity to a stored
/// response. Partitions are created on first write and destroyed wholesale on
/// version rollover; there is no TTL and no LRU bound.
pub trait PartitionStore: Send + Sync {
    /// Lazily create the named partition. Idempotent.
    fn open(&self, partition: &str) -> Result<()>;
    fn get(&self, partition: &str, key: &str) -> Result<Option<Response>>;
    /// Whole-entry overwrite, last-write-wins. Creates the partition if
    /// absent.
    fn put(&self, partition: &str, key: &str, value: &Response) -> Result<()>;
    /// Enumerate existing partition names.
    fn partitions(&self) -> Result<Vec<String>>;
    /// Enumerate entry keys of a partition. Diagnostics only.
    fn keys(&self, partition: &str) -> Result<Vec<String>>;
    /// Delete one partition in full.
    fn drop_partition(&self, partition: &str) -> Result<()>;

    /// Delete every partition whose name does not match one of the four
    /// current versioned names. The only eviction mechanism. Returns the
    /// number of partitions deleted.
    fn evict_stale(&self, tag: &VersionTag) -> Result<u32> {
        let current: Vec<String> = PartitionKind::ALL
            .iter()
            .map(|kind| kind.versioned_name(tag))
            .collect();
        let mut deleted = 0;
        for name in self.partitions()? {
            if !current.contains(&name) {
                log_debug!("evicting stale partition {}", name);
                self.drop_partition(&name)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Delete every known partition regardless of version.
    fn clear_all(&self) -> Result<u32> {
        let mut deleted = 0;
        for name in self.partitions()? {
            self.drop_partition(&name)?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_versioned_partition_names() {
        let tag = VersionTag::new("v2");
        let test_table = vec![
            (PartitionKind::Static, "static-v2"),
            (PartitionKind::Dynamic, "dynamic-v2"),
            (PartitionKind::Image, "image-v2"),
            (PartitionKind::Api, "api-v2"),
        ];
        for (kind, expected) in test_table {
            assert_eq!(expected, kind.versioned_name(&tag));
        }
    }

    #[test]
    fn test_evict_stale_removes_old_generation_only() {
        let store = MemoryStore::default();
        let entry = Response::builder().status(200).build().unwrap();
        for kind in PartitionKind::ALL.iter() {
            store
                .put(&kind.versioned_name(&VersionTag::new("v1")), "GET /", &entry)
                .unwrap();
        }
        store.put("static-v2", "GET /", &entry).unwrap();

        let deleted = store.evict_stale(&VersionTag::new("v2")).unwrap();
        assert_eq!(4, deleted);
        assert_eq!(vec!["static-v2".to_string()], {
            let mut names = store.partitions().unwrap();
            names.sort();
            names
        });
    }

    #[test]
    fn test_evict_stale_twice_second_call_is_noop() {
        let store = MemoryStore::default();
        let entry = Response::builder().status(200).build().unwrap();
        store.put("static-v1", "GET /", &entry).unwrap();
        store.put("api-v1", "GET /api/blog", &entry).unwrap();

        let tag = VersionTag::new("v2");
        assert_eq!(2, store.evict_stale(&tag).unwrap());
        assert_eq!(0, store.evict_stale(&tag).unwrap());
    }

    #[test]
    fn test_clear_all_deletes_every_generation() {
        let store = MemoryStore::default();
        let entry = Response::builder().status(200).build().unwrap();
        store.put("static-v1", "GET /", &entry).unwrap();
        store.put("image-v2", "GET /a.png", &entry).unwrap();
        store.put("api-v3", "GET /api/blog", &entry).unwrap();

        assert_eq!(3, store.clear_all().unwrap());
        assert!(store.partitions().unwrap().is_empty());
    }
}
