//! Request classification. Pure function of request metadata, no side
//! effects: each same-origin GET maps to a caching strategy and the partition
//! it reads and writes.

use regex::Regex;

use crate::defaults::{NEVER_CACHE_PREFIXES, SAFE_API_PREFIXES};
use crate::io::{Destination, Request};
use crate::store::PartitionKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// Fetch every time, never touch a partition. Sensitive endpoints where
    /// staleness is unacceptable.
    NetworkOnly,
    /// Serve the cached entry without a network call when present. Immutable
    /// assets.
    CacheFirst,
    /// Fetch first and fall back to the cached entry. Keeps safe API data
    /// fresh while still building a fallback cache.
    NetworkFirst,
    /// Serve the cached entry immediately and refresh it in a detached task.
    StaleWhileRevalidate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Route {
    pub strategy: Strategy,
    pub partition: Option<PartitionKind>,
}

lazy_static! {
    static ref RE_IMAGE_EXTENSION: Regex =
        Regex::new(r"(?i)\.(png|jpg|jpeg|webp|gif|svg|ico)$").unwrap();
    static ref RE_STATIC_EXTENSION: Regex =
        Regex::new(r"(?i)\.(js|css|woff|woff2|ttf|eot)$").unwrap();
}

/// Rules evaluated in fixed priority order, first match wins:
/// never-cache prefixes, image destination or extension, safe API prefixes,
/// static asset extensions, then the dynamic fallback.
pub fn classify(request: &Request) -> Route {
    let path = url_path(request.url());

    if NEVER_CACHE_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return Route {
            strategy: Strategy::NetworkOnly,
            partition: None,
        };
    }

    if request.destination() == Some(Destination::Image) || RE_IMAGE_EXTENSION.is_match(path) {
        return Route {
            strategy: Strategy::CacheFirst,
            partition: Some(PartitionKind::Image),
        };
    }

    if SAFE_API_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return Route {
            strategy: Strategy::NetworkFirst,
            partition: Some(PartitionKind::Api),
        };
    }

    if RE_STATIC_EXTENSION.is_match(path) {
        return Route {
            strategy: Strategy::CacheFirst,
            partition: Some(PartitionKind::Static),
        };
    }

    Route {
        strategy: Strategy::StaleWhileRevalidate,
        partition: Some(PartitionKind::Dynamic),
    }
}

/// Path component of an absolute or origin-relative URL. Query strings and
/// fragments do not take part in extension matching.
fn url_path(url: &str) -> &str {
    let after_scheme = match url.find("://") {
        Some(idx) => {
            let host_start = idx + 3;
            match url[host_start..].find('/') {
                Some(path_idx) => &url[host_start + path_idx..],
                None => "/",
            }
        }
        None => url,
    };
    let end = after_scheme
        .find(['?', '#'])
        .unwrap_or(after_scheme.len());
    &after_scheme[..end]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::Method;

    fn get(url: &str) -> Request {
        Request::new(url, Method::GET)
    }

    #[test]
    fn test_classification_rules_first_match_wins() {
        let test_table = vec![
            // never cache
            ("/api/auth/login", Strategy::NetworkOnly, None),
            ("/api/cart", Strategy::NetworkOnly, None),
            ("/api/orders/42", Strategy::NetworkOnly, None),
            ("/api/payments/callback", Strategy::NetworkOnly, None),
            ("/api/checkout", Strategy::NetworkOnly, None),
            ("/api/users/profile", Strategy::NetworkOnly, None),
            // never-cache wins over the image extension rule
            ("/api/cart/icon.png", Strategy::NetworkOnly, None),
            // images by extension, case insensitive
            (
                "/img/hero.jpg",
                Strategy::CacheFirst,
                Some(PartitionKind::Image),
            ),
            (
                "/uploads/banner.WEBP",
                Strategy::CacheFirst,
                Some(PartitionKind::Image),
            ),
            (
                "/favicon.ico",
                Strategy::CacheFirst,
                Some(PartitionKind::Image),
            ),
            // safe api
            (
                "/api/catalog/categories",
                Strategy::NetworkFirst,
                Some(PartitionKind::Api),
            ),
            (
                "/api/catalog/products?page=2",
                Strategy::NetworkFirst,
                Some(PartitionKind::Api),
            ),
            (
                "/api/brands",
                Strategy::NetworkFirst,
                Some(PartitionKind::Api),
            ),
            (
                "/api/blog/new-arrivals",
                Strategy::NetworkFirst,
                Some(PartitionKind::Api),
            ),
            // static assets
            (
                "/assets/app.js",
                Strategy::CacheFirst,
                Some(PartitionKind::Static),
            ),
            (
                "/assets/site.css?v=3",
                Strategy::CacheFirst,
                Some(PartitionKind::Static),
            ),
            (
                "/fonts/inter.woff2",
                Strategy::CacheFirst,
                Some(PartitionKind::Static),
            ),
            // everything else is dynamic page content
            (
                "/",
                Strategy::StaleWhileRevalidate,
                Some(PartitionKind::Dynamic),
            ),
            (
                "/products/blue-shirt",
                Strategy::StaleWhileRevalidate,
                Some(PartitionKind::Dynamic),
            ),
            (
                "/api/reviews/latest",
                Strategy::StaleWhileRevalidate,
                Some(PartitionKind::Dynamic),
            ),
        ];
        for (path, strategy, partition) in test_table {
            let url = format!("https://shop.example.com{}", path);
            let route = classify(&get(&url));
            assert_eq!(strategy, route.strategy, "path {}", path);
            assert_eq!(partition, route.partition, "path {}", path);
        }
    }

    #[test]
    fn test_image_destination_hint_wins_over_extension_fallback() {
        // no image extension, but the runtime declared an image destination
        let request = Request::builder()
            .url("https://shop.example.com/cdn/resize?w=300")
            .destination(Destination::Image)
            .build()
            .unwrap();
        let route = classify(&request);
        assert_eq!(Strategy::CacheFirst, route.strategy);
        assert_eq!(Some(PartitionKind::Image), route.partition);
    }

    #[test]
    fn test_query_string_does_not_take_part_in_extension_match() {
        // .png inside the query must not classify as an image
        let route = classify(&get("https://shop.example.com/search?q=logo.png"));
        assert_eq!(Strategy::StaleWhileRevalidate, route.strategy);
    }

    #[test]
    fn test_url_path_extraction() {
        let test_table = vec![
            ("https://shop.example.com/api/brands", "/api/brands"),
            ("https://shop.example.com", "/"),
            ("https://shop.example.com/a.png?v=1#frag", "/a.png"),
            ("/relative/path.css", "/relative/path.css"),
        ];
        for (url, expected) in test_table {
            assert_eq!(expected, url_path(url));
        }
    }
}
