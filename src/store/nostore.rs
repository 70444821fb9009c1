use crate::io::Response;
use crate::store::PartitionStore;
use crate::Result;

/// Caching disabled. Every read misses and every write succeeds without
/// storing anything, so all strategies degrade to their network path.
pub struct NoStore;

impl PartitionStore for NoStore {
    fn open(&self, _partition: &str) -> Result<()> {
        Ok(())
    }

    fn get(&self, _partition: &str, _key: &str) -> Result<Option<Response>> {
        Ok(None)
    }

    fn put(&self, _partition: &str, _key: &str, _value: &Response) -> Result<()> {
        Ok(())
    }

    fn partitions(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn keys(&self, _partition: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn drop_partition(&self, _partition: &str) -> Result<()> {
        Ok(())
    }
}
