// Endpoints that must never be served from or written to a cache partition.
// These carry session, money or personal data where staleness is unacceptable.
pub const NEVER_CACHE_PREFIXES: [&str; 6] = [
    "/api/auth",
    "/api/cart",
    "/api/orders",
    "/api/payments",
    "/api/checkout",
    "/api/users/profile",
];

// Read-only endpoints that are safe to serve from the api partition when the
// network is down. Kept fresh with network-first.
pub const SAFE_API_PREFIXES: [&str; 4] = [
    "/api/catalog/categories",
    "/api/catalog/products",
    "/api/brands",
    "/api/blog",
];

// Application shell fetched into the static partition at install time. The
// offline document must be part of this list - it is the last fallback before
// a synthetic 503.
pub const PRECACHE_MANIFEST: [&str; 6] = [
    "/",
    "/offline",
    "/manifest.json",
    "/favicon.ico",
    "/favicon.png",
    "/apple-touch-icon.png",
];

pub const DEFAULT_OFFLINE_PATH: &str = "/offline";

// Version tag shared by the four partitions. Bumping it in the config evicts
// every old partition on the next activation.
pub const DEFAULT_CACHE_VERSION: &str = "v1";

// Background sync tags redelivered by the host once connectivity returns,
// mapped to the idempotent reconciliation endpoint each one hits.
pub const SYNC_ENDPOINTS: [(&str, &str); 2] = [
    ("sync-cart", "/api/cart/reconcile"),
    ("sync-order", "/api/orders/reconcile"),
];

// Retry cap for sync reconciliation calls. Retries back off exponentially,
// then the task gives up quietly.
pub const DEFAULT_MAX_SYNC_RETRIES: u32 = 3;

// Jitter added to backoff waits so retries from several detached tasks do not
// line up against the origin.
pub const DEFAULT_JITTER_MIN_MILLISECONDS: u64 = 100;
pub const DEFAULT_JITTER_MAX_MILLISECONDS: u64 = 1000;
