use std::collections::HashMap;
use std::sync::Mutex;

use crate::io::Response;
use crate::store::PartitionStore;
use crate::Result;

/// In-memory partition store. Used by tests and by ephemeral gateway runs
/// where persisting responses across processes is not wanted. A single mutex
/// guards the whole map; per-key operations are atomic behind it.
#[derive(Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<String, HashMap<String, Response>>>,
}

impl PartitionStore for MemoryStore {
    fn open(&self, partition: &str) -> Result<()> {
        self.partitions
            .lock()
            .unwrap()
            .entry(partition.to_string())
            .or_default();
        Ok(())
    }

    fn get(&self, partition: &str, key: &str) -> Result<Option<Response>> {
        Ok(self
            .partitions
            .lock()
            .unwrap()
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn put(&self, partition: &str, key: &str, value: &Response) -> Result<()> {
        self.partitions
            .lock()
            .unwrap()
            .entry(partition.to_string())
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn partitions(&self) -> Result<Vec<String>> {
        Ok(self.partitions.lock().unwrap().keys().cloned().collect())
    }

    fn keys(&self, partition: &str) -> Result<Vec<String>> {
        Ok(self
            .partitions
            .lock()
            .unwrap()
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn drop_partition(&self, partition: &str) -> Result<()> {
        self.partitions.lock().unwrap().remove(partition);
        Ok(())
    }
}
