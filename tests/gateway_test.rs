use std::sync::Arc;

use fc::exec::{InlineSpawner, TaskSpawner};
use fc::gateway::Gateway;
use fc::http::NetClient;
use fc::io::{Fetcher, Method, Request, Response};
use fc::store::{MemoryStore, PartitionStore, VersionTag};
use httpmock::prelude::*;

fn gateway(origin: &str, store: Arc<MemoryStore>) -> Gateway {
    Gateway::builder()
        .store(store as Arc<dyn PartitionStore>)
        .fetcher(Arc::new(NetClient::new()) as Arc<dyn Fetcher>)
        .spawner(Arc::new(InlineSpawner) as Arc<dyn TaskSpawner>)
        .tag(VersionTag::new("v1"))
        .origin(origin)
        .offline_path("/offline")
        .build()
        .unwrap()
}

#[test]
fn test_cache_first_second_request_never_touches_the_network() {
    let server = MockServer::start();
    let server_mock = server.mock(|when, then| {
        when.method(GET).path("/img/hero.png");
        then.status(200)
            .header("content-type", "image/png")
            .body("png-bytes");
    });

    let store = Arc::new(MemoryStore::default());
    let gateway = gateway(&server.base_url(), store);
    let request = Request::new(&server.url("/img/hero.png"), Method::GET);

    let first = gateway.serve(&request);
    assert_eq!(200, first.status);
    server_mock.assert_hits(1);

    // Served out of the image partition, the server was not hit again
    let second = gateway.serve(&request);
    assert_eq!(first, second);
    server_mock.assert_hits(1);
}

#[test]
fn test_never_cache_paths_hit_the_network_every_time() {
    let server = MockServer::start();
    let server_mock = server.mock(|when, then| {
        when.method(GET).path("/api/cart");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"items": []}"#);
    });

    let store = Arc::new(MemoryStore::default());
    let gateway = gateway(&server.base_url(), store.clone());
    let request = Request::new(&server.url("/api/cart"), Method::GET);

    gateway.serve(&request);
    gateway.serve(&request);

    server_mock.assert_hits(2);
    // and nothing was ever written
    assert!(store.partitions().unwrap().is_empty());
}

#[test]
fn test_network_first_stores_api_responses_for_offline_use() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/brands");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"brands": ["acme"]}"#);
    });

    let store = Arc::new(MemoryStore::default());
    let gateway = gateway(&server.base_url(), store.clone());
    let request = Request::new(&server.url("/api/brands"), Method::GET);

    let response = gateway.serve(&request);
    assert_eq!(200, response.status);

    let cached = store
        .get("api-v1", &request.cache_key())
        .unwrap()
        .expect("api response should have been cached");
    assert_eq!(response, cached);
}

#[test]
fn test_stale_while_revalidate_inline_refresh_updates_next_request() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/products/blue-shirt");
        then.status(200)
            .header("content-type", "text/html")
            .body("fresh page");
    });

    let store = Arc::new(MemoryStore::default());
    let gateway = gateway(&server.base_url(), store.clone());
    let request = Request::new(&server.url("/products/blue-shirt"), Method::GET);

    let stale = Response::builder()
        .status(200)
        .body("stale page".as_bytes().to_vec())
        .build()
        .unwrap();
    store
        .put("dynamic-v1", &request.cache_key(), &stale)
        .unwrap();

    // the stale entry wins, the refresh runs inline right after
    let response = gateway.serve(&request);
    assert_eq!("stale page", response.text());

    let response = gateway.serve(&request);
    assert_eq!("fresh page", response.text());
}

#[test]
fn test_network_down_serves_offline_document_for_cache_miss() {
    // nothing listens on port 1, every fetch is a transport error
    let origin = "http://127.0.0.1:1";
    let store = Arc::new(MemoryStore::default());
    let gateway = gateway(origin, store.clone());

    let offline = Response::builder()
        .status(200)
        .body("<html>offline</html>".as_bytes().to_vec())
        .build()
        .unwrap();
    store
        .put("static-v1", &format!("GET {}/offline", origin), &offline)
        .unwrap();

    let request = Request::new(&format!("{}/img/hero.png", origin), Method::GET);
    let response = gateway.serve(&request);
    assert_eq!(200, response.status);
    assert_eq!("<html>offline</html>", response.text());
}

#[test]
fn test_network_down_without_offline_document_is_plain_text_503() {
    let origin = "http://127.0.0.1:1";
    let store = Arc::new(MemoryStore::default());
    let gateway = gateway(origin, store);

    let request = Request::new(&format!("{}/products/blue-shirt", origin), Method::GET);
    let response = gateway.serve(&request);
    assert_eq!(503, response.status);
    assert_eq!("Offline", response.text());
    assert_eq!(Some("text/plain"), response.header("content-type"));
    assert!(response.header("date").is_some());
}
