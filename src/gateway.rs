//! Strategy engine. Executes the strategy chosen by the router against a
//! cache partition and the network. Transport errors never escape a strategy:
//! the worst case observable result is the offline document or a synthetic
//! 503.

use std::sync::Arc;

use crate::exec::TaskSpawner;
use crate::io::{Fetcher, Method, Request, Response};
use crate::router::{self, Strategy};
use crate::store::{PartitionKind, PartitionStore, VersionTag};
use crate::{log_debug, log_warn};

#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct Gateway {
    store: Arc<dyn PartitionStore>,
    fetcher: Arc<dyn Fetcher>,
    spawner: Arc<dyn TaskSpawner>,
    tag: VersionTag,
    #[builder(setter(into))]
    origin: String,
    #[builder(setter(into))]
    offline_path: String,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Single dispatch entry point for classified requests. Infallible by
    /// design: every failure degrades to a fallback response.
    pub fn serve(&self, request: &Request) -> Response {
        let route = router::classify(request);
        log_debug!(
            "{} {} classified as {:?} over {:?}",
            request.method(),
            request.url(),
            route.strategy,
            route.partition
        );
        let partition = match route.partition {
            Some(kind) => self.partition_name(kind),
            None => return self.network_only(request),
        };
        match route.strategy {
            Strategy::NetworkOnly => self.network_only(request),
            Strategy::CacheFirst => self.cache_first(request, &partition),
            Strategy::NetworkFirst => self.network_first(request, &partition),
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, &partition),
        }
    }

    pub fn partition_name(&self, kind: PartitionKind) -> String {
        kind.versioned_name(&self.tag)
    }

    fn network_only(&self, request: &Request) -> Response {
        match self.fetcher.fetch(request) {
            Ok(response) => response,
            Err(err) => {
                log_debug!("network failure for {}: {}", request.url(), err);
                Response::service_unavailable()
            }
        }
    }

    fn cache_first(&self, request: &Request, partition: &str) -> Response {
        let key = request.cache_key();
        if let Some(cached) = self.cached(partition, &key) {
            // fastest path, zero network
            return cached;
        }
        match self.fetcher.fetch(request) {
            Ok(response) => {
                self.store_if_ok(partition, &key, &response);
                response
            }
            Err(err) => {
                log_debug!("network failure for {}: {}", request.url(), err);
                self.offline_fallback()
            }
        }
    }

    fn network_first(&self, request: &Request, partition: &str) -> Response {
        let key = request.cache_key();
        match self.fetcher.fetch(request) {
            Ok(response) => {
                self.store_if_ok(partition, &key, &response);
                response
            }
            Err(err) => {
                log_debug!("network failure for {}: {}", request.url(), err);
                self.cached(partition, &key)
                    .unwrap_or_else(|| self.offline_fallback())
            }
        }
    }

    fn stale_while_revalidate(&self, request: &Request, partition: &str) -> Response {
        let key = request.cache_key();
        if let Some(cached) = self.cached(partition, &key) {
            // Serve stale with zero added latency; the refresh only affects
            // future requests.
            self.schedule_refresh(request, partition);
            return cached;
        }
        match self.fetcher.fetch(request) {
            Ok(response) => {
                self.store_if_ok(partition, &key, &response);
                response
            }
            Err(err) => {
                log_debug!("network failure for {}: {}", request.url(), err);
                self.offline_fallback()
            }
        }
    }

    /// Detached refresh task. The caller never awaits it; its failure is
    /// caught and logged by the spawner.
    fn schedule_refresh(&self, request: &Request, partition: &str) {
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let request = request.clone();
        let partition = partition.to_string();
        self.spawner.spawn(Box::new(move || {
            let response = fetcher.fetch(&request)?;
            if response.is_ok() {
                store.put(&partition, &request.cache_key(), &response)?;
            }
            Ok(())
        }));
    }

    fn cached(&self, partition: &str, key: &str) -> Option<Response> {
        match self.store.get(partition, key) {
            Ok(entry) => entry,
            Err(err) => {
                // storage failures read as cache misses
                log_warn!("cache read failed for {}: {}", key, err);
                None
            }
        }
    }

    /// Only ever store successful responses, and never let a storage failure
    /// block returning the already fetched response.
    fn store_if_ok(&self, partition: &str, key: &str, response: &Response) {
        if !response.is_ok() {
            return;
        }
        if let Err(err) = self.store.put(partition, key, response) {
            log_warn!("cache write failed for {}: {}", key, err);
        }
    }

    /// Offline document out of the static partition, else the synthetic 503.
    fn offline_fallback(&self) -> Response {
        let offline_url = format!("{}{}", self.origin, self.offline_path);
        let key = format!("{} {}", Method::GET, offline_url);
        let partition = self.partition_name(PartitionKind::Static);
        self.cached(&partition, &key)
            .unwrap_or_else(Response::service_unavailable)
    }
}
