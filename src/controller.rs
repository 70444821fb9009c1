//! Lifecycle controller. Owns the installing/waiting/active state machine,
//! the install time pre-cache, generational activation and the remote control
//! message and event surface.

use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::backoff::ExponentialBackoff;
use crate::defaults::{DEFAULT_MAX_SYNC_RETRIES, SYNC_ENDPOINTS};
use crate::error;
use crate::exec::{self, TaskSpawner};
use crate::gateway::Gateway;
use crate::io::{Fetcher, Method, Request, Response};
use crate::store::{PartitionKind, PartitionStore, VersionTag};
use crate::{log_debug, log_info, log_warn, Cmd, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
}

/// Control messages posted by the fronted application. Unknown message types
/// are logged and dropped, never errors.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "CLEAR_CACHE")]
    ClearCache,
    #[serde(rename = "CACHE_URLS")]
    CacheUrls { urls: Vec<String> },
}

/// Host events delivered outside the request path.
#[derive(Debug)]
pub enum Event {
    Push(String),
    NotificationClick(String),
    Sync(String),
}

#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct Controller {
    store: Arc<dyn PartitionStore>,
    fetcher: Arc<dyn Fetcher>,
    spawner: Arc<dyn TaskSpawner>,
    gateway: Gateway,
    tag: VersionTag,
    #[builder(setter(into))]
    origin: String,
    precache_urls: Vec<String>,
    #[builder(default = "DEFAULT_MAX_SYNC_RETRIES")]
    max_sync_retries: u32,
    #[builder(setter(skip), default = "Mutex::new(LifecycleState::Installing)")]
    state: Mutex<LifecycleState>,
}

impl Controller {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock().unwrap() = state;
    }

    fn partition(&self, kind: PartitionKind) -> String {
        kind.versioned_name(&self.tag)
    }

    fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.origin, path)
        }
    }

    /// Pre-fetches the shell manifest into the static partition. Individual
    /// fetch failures are logged and skipped; the install itself only fails
    /// when the partition cannot be opened.
    pub fn install(&self) -> Result<()> {
        let partition = self.partition(PartitionKind::Static);
        self.store.open(&partition)?;
        self.fetch_into(&partition, &self.precache_urls);
        self.set_state(LifecycleState::Waiting);
        log_info!("install complete, waiting for activation");
        Ok(())
    }

    /// Evicts the partitions of previous generations and takes over request
    /// handling.
    pub fn activate(&self) -> Result<()> {
        let evicted = self.store.evict_stale(&self.tag)?;
        self.set_state(LifecycleState::Active);
        log_info!(
            "generation {} active, {} stale partitions evicted",
            self.tag,
            evicted
        );
        Ok(())
    }

    /// One-shot startup: install if this generation has no static partition
    /// yet, then activate.
    pub fn run(&self) -> Result<()> {
        let partition = self.partition(PartitionKind::Static);
        if !self.store.partitions()?.contains(&partition) {
            self.install()?;
        } else {
            self.set_state(LifecycleState::Waiting);
        }
        self.activate()
    }

    /// Request entry point. Anything the caching layer does not own - not yet
    /// active, non-GET, cross-origin - goes straight to the network, errors
    /// included.
    pub fn handle(&self, request: &Request) -> Result<Response> {
        if self.state() != LifecycleState::Active
            || request.method() != Method::GET
            || !request.url().starts_with(&self.origin)
        {
            return self.fetcher.fetch(request);
        }
        Ok(self.gateway.serve(request))
    }

    pub fn handle_message(&self, payload: &str) -> Result<()> {
        let message: Message = match serde_json::from_str(payload) {
            Ok(message) => message,
            Err(err) => {
                log_warn!("dropping unknown control message: {}", err);
                return Ok(());
            }
        };
        match message {
            Message::SkipWaiting => {
                if self.state() == LifecycleState::Waiting {
                    return self.activate();
                }
                log_debug!("SKIP_WAITING ignored in state {:?}", self.state());
            }
            Message::ClearCache => {
                if self.state() == LifecycleState::Active {
                    let removed = self.store.clear_all()?;
                    log_info!("cleared {} partitions", removed);
                } else {
                    log_debug!("CLEAR_CACHE ignored in state {:?}", self.state());
                }
            }
            Message::CacheUrls { urls } => {
                if self.state() == LifecycleState::Active {
                    let partition = self.partition(PartitionKind::Dynamic);
                    self.store.open(&partition)?;
                    self.fetch_into(&partition, &urls);
                } else {
                    log_debug!("CACHE_URLS ignored in state {:?}", self.state());
                }
            }
        }
        Ok(())
    }

    /// Events never propagate errors back to the host. Sync retries run
    /// detached with exponential backoff.
    pub fn dispatch_event(&self, event: Event) {
        match event {
            Event::Push(payload) => log_info!("push received: {}", payload),
            Event::NotificationClick(tag) => log_info!("notification {} clicked", tag),
            Event::Sync(tag) => self.sync(&tag),
        }
    }

    /// Partition names with their entry counts, for status reporting.
    pub fn status(&self) -> Result<Vec<(String, usize)>> {
        let mut partitions = Vec::new();
        for name in self.store.partitions()? {
            let entries = self.store.keys(&name)?.len();
            partitions.push((name, entries));
        }
        partitions.sort();
        Ok(partitions)
    }

    fn fetch_into(&self, partition: &str, paths: &[String]) {
        let mut cmds: Vec<Cmd<String>> = Vec::new();
        for path in paths {
            let url = self.absolute_url(path);
            let store = Arc::clone(&self.store);
            let fetcher = Arc::clone(&self.fetcher);
            let partition = partition.to_string();
            cmds.push(Box::new(move || {
                let request = Request::new(&url, Method::GET);
                let response = fetcher.fetch(&request)?;
                if !response.is_ok() {
                    return Err(error::gen(format!(
                        "fetch for {} returned {}",
                        url, response.status
                    )));
                }
                store.put(&partition, &request.cache_key(), &response)?;
                Ok(url)
            }));
        }
        for result in exec::parallel_stream(cmds) {
            match result {
                Ok(url) => log_info!("cached {}", url),
                Err(err) => log_warn!("skipping entry: {}", err),
            }
        }
    }

    fn sync(&self, tag: &str) {
        let endpoint = SYNC_ENDPOINTS
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, path)| *path);
        let path = match endpoint {
            Some(path) => path,
            None => {
                log_warn!("unknown sync tag {}, dropping", tag);
                return;
            }
        };
        let url = self.absolute_url(path);
        let fetcher = Arc::clone(&self.fetcher);
        let max_retries = self.max_sync_retries;
        self.spawner.spawn(Box::new(move || {
            let request = Request::new(&url, Method::GET);
            let mut backoff = ExponentialBackoff::new(&fetcher, max_retries);
            let response = backoff.retry_on_error(&request)?;
            log_info!("sync {} finished with status {}", url, response.status);
            Ok(())
        }));
    }
}
