//! Config file parsing and validation.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::defaults::{
    DEFAULT_CACHE_VERSION, DEFAULT_MAX_SYNC_RETRIES, DEFAULT_OFFLINE_PATH, PRECACHE_MANIFEST,
};
use crate::error::FcError;
use crate::Result;

pub trait ConfigProperties: Send + Sync {
    /// Scheme and host of the fronted origin, e.g. `https://shop.example.com`.
    fn origin(&self) -> &str;
    /// Root directory of the file store. Absent means caching is disabled.
    fn cache_location(&self) -> Option<&str> {
        None
    }
    fn cache_version(&self) -> &str {
        DEFAULT_CACHE_VERSION
    }
    fn offline_path(&self) -> &str {
        DEFAULT_OFFLINE_PATH
    }
    /// Shell manifest pre-fetched into the static partition at install time.
    fn precache_urls(&self) -> Vec<String> {
        PRECACHE_MANIFEST.iter().map(|url| url.to_string()).collect()
    }
    fn max_sync_retries(&self) -> u32 {
        DEFAULT_MAX_SYNC_RETRIES
    }
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    origin: String,
    cache_location: Option<String>,
    cache_version: String,
    offline_path: String,
    precache_urls: Option<Vec<String>>,
    max_sync_retries: u32,
}

impl Config {
    pub fn new<T: Read>(reader: T, domain: &str) -> Result<Self> {
        let config = Config::parse(reader, domain)?;
        let domain_config_data = config.get(domain).unwrap();
        let origin = domain_config_data.get("origin").ok_or_else(|| {
            FcError::ConfigurationError(format!(
                "No origin found for domain {} in config",
                domain
            ))
        })?;
        let cache_location = domain_config_data
            .get("cache_location")
            .filter(|location| !location.is_empty())
            .map(|location| location.to_string());
        let cache_version = domain_config_data
            .get("cache_version")
            .filter(|tag| !tag.is_empty())
            .map(|tag| tag.to_string())
            .unwrap_or_else(|| DEFAULT_CACHE_VERSION.to_string());
        let offline_path = domain_config_data
            .get("offline_path")
            .filter(|path| !path.is_empty())
            .map(|path| path.to_string())
            .unwrap_or_else(|| DEFAULT_OFFLINE_PATH.to_string());
        let precache_urls = domain_config_data.get("precache_urls").map(|urls| {
            urls.split(',')
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect()
        });
        let max_sync_retries = domain_config_data
            .get("max_sync_retries")
            .and_then(|retries| retries.parse().ok())
            .unwrap_or(DEFAULT_MAX_SYNC_RETRIES);

        Ok(Config {
            origin: origin.to_string(),
            cache_location,
            cache_version,
            offline_path,
            precache_urls,
            max_sync_retries,
        })
    }

    fn parse<T: Read>(
        mut reader: T,
        domain: &str,
    ) -> Result<HashMap<String, HashMap<String, String>>> {
        let mut config_data = String::new();
        reader.read_to_string(&mut config_data)?;
        let lines = config_data.lines();
        let mut config = HashMap::new();
        let mut domain_config = HashMap::new();

        let regex =
            regex::Regex::new(&format!(r"^{}\.(?P<key>\w+)=(?P<value>.*)", domain)).unwrap();
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // capture groups key and value from regex
            let captured_names = regex.captures(line);
            match captured_names {
                Some(captured_names) => {
                    let key = captured_names.name("key").unwrap().as_str();
                    let value = captured_names.name("value").unwrap().as_str();
                    domain_config.insert(key.to_string(), value.to_string());
                }
                None => {
                    continue;
                }
            }
        }

        config.insert(domain.to_string(), domain_config);
        Ok(config)
    }
}

impl ConfigProperties for Config {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn cache_location(&self) -> Option<&str> {
        self.cache_location.as_deref()
    }

    fn cache_version(&self) -> &str {
        &self.cache_version
    }

    fn offline_path(&self) -> &str {
        &self.offline_path
    }

    fn precache_urls(&self) -> Vec<String> {
        match &self.precache_urls {
            Some(urls) => urls.clone(),
            None => PRECACHE_MANIFEST.iter().map(|url| url.to_string()).collect(),
        }
    }

    fn max_sync_retries(&self) -> u32 {
        self.max_sync_retries
    }
}

impl ConfigProperties for Arc<Config> {
    fn origin(&self) -> &str {
        self.as_ref().origin()
    }

    fn cache_location(&self) -> Option<&str> {
        self.as_ref().cache_location()
    }

    fn cache_version(&self) -> &str {
        self.as_ref().cache_version()
    }

    fn offline_path(&self) -> &str {
        self.as_ref().offline_path()
    }

    fn precache_urls(&self) -> Vec<String> {
        self.as_ref().precache_urls()
    }

    fn max_sync_retries(&self) -> u32 {
        self.as_ref().max_sync_retries()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_origin_scoped_by_domain() {
        let config_data = r#"
        shop.example.com.origin=https://shop.example.com
        blog.example.com.origin=https://blog.example.com
        shop.example.com.cache_location=/home/user/.cache/forecache
        "#;
        let domain = "shop.example.com";
        let reader = std::io::Cursor::new(config_data);
        let config = Arc::new(Config::new(reader, domain).unwrap());
        assert_eq!("https://shop.example.com", config.origin());
        assert_eq!(
            Some("/home/user/.cache/forecache"),
            config.cache_location()
        );
    }

    #[test]
    fn test_ignore_commented_out_lines_and_empty_lines() {
        let config_data = r#"

        # fronted origin
        shop.example.com.origin=https://shop.example.com

        # bump to evict old partitions on next activation
        shop.example.com.cache_version=v7
        "#;
        let reader = std::io::Cursor::new(config_data);
        let config = Config::new(reader, "shop.example.com").unwrap();
        assert_eq!("v7", config.cache_version());
    }

    #[test]
    fn test_missing_origin_is_configuration_error() {
        let config_data = "shop.example.com.cache_version=v2";
        let reader = std::io::Cursor::new(config_data);
        let err = Config::new(reader, "shop.example.com").unwrap_err();
        match err.downcast_ref::<FcError>() {
            Some(FcError::ConfigurationError(_)) => {}
            _ => panic!("Expected ConfigurationError"),
        }
    }

    #[test]
    fn test_defaults_when_optional_keys_absent() {
        let config_data = "shop.example.com.origin=https://shop.example.com";
        let reader = std::io::Cursor::new(config_data);
        let config = Config::new(reader, "shop.example.com").unwrap();
        assert_eq!(None, config.cache_location());
        assert_eq!(DEFAULT_CACHE_VERSION, config.cache_version());
        assert_eq!(DEFAULT_OFFLINE_PATH, config.offline_path());
        assert_eq!(DEFAULT_MAX_SYNC_RETRIES, config.max_sync_retries());
        assert_eq!(
            PRECACHE_MANIFEST.to_vec(),
            config.precache_urls().iter().map(|u| u.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_precache_urls_override_comma_separated() {
        let config_data = r#"
        shop.example.com.origin=https://shop.example.com
        shop.example.com.precache_urls=/,/offline, /manifest.json
        "#;
        let reader = std::io::Cursor::new(config_data);
        let config = Config::new(reader, "shop.example.com").unwrap();
        assert_eq!(
            vec!["/".to_string(), "/offline".to_string(), "/manifest.json".to_string()],
            config.precache_urls()
        );
    }

    #[test]
    fn test_invalid_max_sync_retries_falls_back_to_default() {
        let config_data = r#"
        shop.example.com.origin=https://shop.example.com
        shop.example.com.max_sync_retries=plenty
        "#;
        let reader = std::io::Cursor::new(config_data);
        let config = Config::new(reader, "shop.example.com").unwrap();
        assert_eq!(DEFAULT_MAX_SYNC_RETRIES, config.max_sync_retries());
    }
}
