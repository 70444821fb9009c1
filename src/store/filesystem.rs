use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::config::ConfigProperties;
use crate::error::{self, FcError};
use crate::io::{Headers, Response};
use crate::store::PartitionStore;
use crate::Result;

/// Persistent partition store. One subdirectory per versioned partition, one
/// gzip compressed entry file per key, named by the sha256 of the entry key.
/// Entry layout after decompression: headers as JSON, a line with the status
/// code, then the raw body bytes.
pub struct FileStore {
    config: Arc<dyn ConfigProperties>,
}

impl FileStore {
    pub fn new(config: Arc<dyn ConfigProperties>) -> Self {
        FileStore { config }
    }

    pub fn validate_location(&self) -> Result<()> {
        let location = self
            .config
            .cache_location()
            .ok_or(FcError::ConfigurationNotFound)?;

        let path = Path::new(location);

        if !path.exists() {
            return Err(FcError::CacheLocationDoesNotExist(format!(
                "Cache directory does not exist: {location}"
            ))
            .into());
        }

        if !path.is_dir() {
            return Err(FcError::CacheLocationIsNotADirectory(format!(
                "Cache location is not a directory: {location}"
            ))
            .into());
        }

        // Check if we can write to the directory
        let test_file_path = path.join(".write_test_cache_file");
        match File::create(&test_file_path) {
            Ok(_) => {
                if let Err(e) = fs::remove_file(&test_file_path) {
                    return Err(FcError::CacheLocationWriteTestFailed(format!(
                        "Failed to remove cache test file {}: {}",
                        test_file_path.to_string_lossy(),
                        e
                    ))
                    .into());
                }
            }
            Err(e) => {
                return Err(FcError::CacheLocationIsNotWriteable(format!(
                    "No write permission for cache directory {location}: {e}"
                ))
                .into());
            }
        }
        Ok(())
    }

    fn root(&self) -> Result<PathBuf> {
        let location = self
            .config
            .cache_location()
            .ok_or(FcError::ConfigurationNotFound)?;
        let location = location.strip_suffix('/').unwrap_or(location);
        Ok(PathBuf::from(location))
    }

    fn partition_dir(&self, partition: &str) -> Result<PathBuf> {
        Ok(self.root()?.join(partition))
    }

    pub fn entry_file(&self, partition: &str, key: &str) -> Result<PathBuf> {
        let mut hasher = Sha256::new();
        hasher.update(key);
        let hash = hasher.finalize();
        Ok(self.partition_dir(partition)?.join(format!("{hash:x}")))
    }

    fn read_entry(&self, mut reader: impl BufRead) -> Result<Response> {
        let decompressed_data = GzDecoder::new(&mut reader);
        let mut reader = BufReader::new(decompressed_data);
        let mut headers = String::new();
        reader.read_line(&mut headers)?;
        let mut status = String::new();
        reader.read_line(&mut status)?;
        let status = match status.trim().parse::<i32>() {
            Ok(value) => value,
            Err(err) => {
                // parse error in here could be hard to find/debug. Send a
                // clear error trace over to the client.
                return Err(FcError::StorageError(format!(
                    "Could not parse the response status code from cache entry: {err}"
                ))
                .into());
            }
        };
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        let headers = serde_json::from_str::<Headers>(headers.trim_end())
            .map_err(|err| error::gen(format!("Corrupt cache entry headers: {err}")))?;
        let response = Response::builder()
            .status(status)
            .headers(headers)
            .body(body)
            .build()?;
        Ok(response)
    }

    fn persist_entry(&self, value: &Response, f: BufWriter<File>) -> Result<()> {
        let headers = serde_json::to_string(&value.headers)
            .map_err(|err| FcError::StorageError(err.to_string()))?;
        let mut encoder = GzEncoder::new(f, Compression::default());
        encoder.write_all(headers.as_bytes())?;
        encoder.write_all(b"\n")?;
        encoder.write_all(value.status.to_string().as_bytes())?;
        encoder.write_all(b"\n")?;
        // raw body bytes, nothing appended - entries round trip byte
        // identical, image partitions store binary bodies.
        encoder.write_all(&value.body)?;
        encoder.finish()?;
        Ok(())
    }
}

impl PartitionStore for FileStore {
    fn open(&self, partition: &str) -> Result<()> {
        fs::create_dir_all(self.partition_dir(partition)?)?;
        Ok(())
    }

    fn get(&self, partition: &str, key: &str) -> Result<Option<Response>> {
        let path = self.entry_file(partition, key)?;
        if let Ok(f) = File::open(&path) {
            let f = BufReader::new(f);
            return Ok(Some(self.read_entry(f)?));
        }
        Ok(None)
    }

    fn put(&self, partition: &str, key: &str, value: &Response) -> Result<()> {
        // lazy open applies to writes
        self.open(partition)?;
        let path = self.entry_file(partition, key)?;
        let f = File::create(path)?;
        let f = BufWriter::new(f);
        self.persist_entry(value, f)?;
        Ok(())
    }

    fn partitions(&self) -> Result<Vec<String>> {
        let root = self.root()?;
        let mut names = Vec::new();
        for dir_entry in fs::read_dir(root)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_dir() {
                names.push(dir_entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(names)
    }

    /// Entry keys are stored hashed, so enumeration returns the sha256 file
    /// names rather than the original request identities.
    fn keys(&self, partition: &str) -> Result<Vec<String>> {
        let dir = self.partition_dir(partition)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(dir)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_file() {
                keys.push(dir_entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(keys)
    }

    fn drop_partition(&self, partition: &str) -> Result<()> {
        let dir = self.partition_dir(partition)?;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct ConfigMock;

    impl ConfigProperties for ConfigMock {
        fn origin(&self) -> &str {
            "https://shop.example.com"
        }
        fn cache_location(&self) -> Option<&str> {
            Some("/home/user/.cache/forecache/")
        }
    }

    #[test]
    fn test_entry_file_is_sha256_of_key_under_partition_dir() {
        let store = FileStore::new(Arc::new(ConfigMock));
        let path = store
            .entry_file("api-v1", "GET https://shop.example.com/api/brands")
            .unwrap();
        // trailing slash in the configured location is stripped
        assert!(path
            .to_string_lossy()
            .starts_with("/home/user/.cache/forecache/api-v1/"));
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(64, file_name.len());
        assert!(file_name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_read_entry_round_trips_binary_body() {
        let store = FileStore::new(Arc::new(ConfigMock));
        let mut headers = Headers::new();
        headers.set("content-type", "image/png");
        let body = vec![0x89, 0x50, 0x4e, 0x47, 0x0a, 0x00, 0xff, 0x0a];

        let headers_json = serde_json::to_string(&headers).unwrap();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(headers_json.as_bytes()).unwrap();
        enc.write_all(b"\n200\n").unwrap();
        enc.write_all(&body).unwrap();
        let reader = std::io::Cursor::new(enc.finish().unwrap());

        let response = store.read_entry(reader).unwrap();
        assert_eq!(200, response.status);
        assert_eq!(Some("image/png"), response.header("content-type"));
        assert_eq!(body, response.body);
    }

    #[test]
    fn test_read_entry_bad_status_line_is_storage_error() {
        let store = FileStore::new(Arc::new(ConfigMock));
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"{}\nnot-a-status\nbody").unwrap();
        let reader = std::io::Cursor::new(enc.finish().unwrap());
        let err = store.read_entry(reader).unwrap_err();
        match err.downcast_ref::<FcError>() {
            Some(FcError::StorageError(_)) => {}
            _ => panic!("Expected StorageError"),
        }
    }
}
