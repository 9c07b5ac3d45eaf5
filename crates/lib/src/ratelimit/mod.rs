//! Windowed request-rate limiting for the authentication surface
//!
//! Fixed-window counting per client identity key. The bucket map and its
//! lock live inside the limiter struct, constructed once at startup and
//! shared by reference with request handlers; admission checks and the
//! periodic eviction sweep are mutually exclusive, so concurrent requests
//! for the same key always observe a consistent counter.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::http::HeaderMap;
use tokio::time::interval;
use tracing::debug;

/// Default admission limit per window.
pub const DEFAULT_LIMIT: u32 = 10;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

struct Bucket {
    count: u32,
    reset_at: Instant,
    last_access: Instant,
}

/// A concurrency-safe sliding-window admission gate.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter admitting `limit` requests per `window` per key.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    /// Create a limiter with the default policy (10 requests per minute).
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }

    /// Decide whether to admit a request for the given identity key.
    ///
    /// On the first request for a key, or once its window has elapsed, the
    /// counter resets to 1 and a new window opens. Otherwise the request is
    /// admitted only while the counter is below the limit. Denial is a
    /// normal negative result, logged here for diagnosis.
    pub fn admit(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().unwrap();
        let now = Instant::now();

        match buckets.get_mut(key) {
            Some(bucket) if now < bucket.reset_at => {
                bucket.last_access = now;
                if bucket.count >= self.limit {
                    debug!(key, limit = self.limit, "rate limit exceeded");
                    return false;
                }
                bucket.count += 1;
                true
            }
            _ => {
                buckets.insert(
                    key.to_string(),
                    Bucket {
                        count: 1,
                        reset_at: now + self.window,
                        last_access: now,
                    },
                );
                true
            }
        }
    }

    /// Remove buckets whose last access is older than twice the window,
    /// bounding memory growth from one-off clients.
    pub fn sweep(&self) {
        let mut buckets = self.buckets.lock().unwrap();
        let now = Instant::now();
        let horizon = self.window * 2;
        buckets.retain(|_, bucket| now.duration_since(bucket.last_access) <= horizon);
    }

    /// Spawn the background eviction task, sweeping once per window.
    pub fn spawn_sweeper(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = self;
        tokio::spawn(async move {
            let mut ticker = interval(limiter.window);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep();
            }
        })
    }

    /// Retry hint in seconds for denied requests.
    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Number of live buckets. Exposed for eviction tests.
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().unwrap().len()
    }
}

/// Derive the client identity key for a request.
///
/// Prefers the first address in `X-Forwarded-For` when present (the proxy
/// terminating TLS is responsible for sanitizing the header), otherwise the
/// direct connection address with the port stripped.
pub fn client_key(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    peer.ip().to_string()
}
