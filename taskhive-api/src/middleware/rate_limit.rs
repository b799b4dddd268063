/// Rate limiting middleware
///
/// Applies a fixed-window limit per client address: at most
/// `max_requests` requests per `window_secs` seconds. The counter state
/// lives behind the [`RateLimitStore`] trait so a single process uses the
/// in-memory map store and a multi-process deployment can plug in a shared
/// store. The limiter is an abuse deterrent, not a hard guarantee.
///
/// # Keying
///
/// The client key is the first `X-Forwarded-For` entry when present,
/// otherwise the peer address from the connection.
///
/// # Headers
///
/// Responses include:
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: requests left in the current window
/// - `X-RateLimit-Reset`: seconds until the window resets
/// - `Retry-After`: seconds to wait (429 responses only)
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;

/// Outcome of recording one request against the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Requests left in the current window
    pub remaining: u32,

    /// Seconds until the current window resets
    pub reset_after: u64,
}

/// Counter storage for the fixed-window limiter
///
/// Implementations must be safe to share across request handlers.
pub trait RateLimitStore: Send + Sync + 'static {
    /// Records a request for `key` at time `now` and decides whether it is
    /// within the limit
    fn hit(&self, key: &str, now: u64, config: RateLimitConfig) -> RateLimitDecision;

    /// Drops entries whose window expired before `now`
    fn sweep(&self, now: u64, window_secs: u64);
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    window_start: u64,
    count: u32,
}

/// In-memory fixed-window store
///
/// Suitable for a single process. Entries for idle clients are reclaimed by
/// the periodic [`RateLimitStore::sweep`].
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryStore {
    fn hit(&self, key: &str, now: u64, config: RateLimitConfig) -> RateLimitDecision {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let entry = entries
            .entry(key.to_string())
            .or_insert(WindowEntry {
                window_start: now,
                count: 0,
            });

        // Window elapsed: start a fresh one.
        if now.saturating_sub(entry.window_start) >= config.window_secs {
            entry.window_start = now;
            entry.count = 0;
        }

        let reset_after = config
            .window_secs
            .saturating_sub(now.saturating_sub(entry.window_start));

        if entry.count >= config.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: config.max_requests - entry.count,
            reset_after,
        }
    }

    fn sweep(&self, now: u64, window_secs: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();

        entries.retain(|_, entry| now.saturating_sub(entry.window_start) < window_secs);

        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "Swept expired rate limit entries");
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Extracts the client key for rate limiting
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware layer
///
/// Checks the limit before processing the request and adds the rate limit
/// headers to the response.
///
/// # Errors
///
/// Returns 429 Too Many Requests when the window is exhausted.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let config = state.config.rate_limit;
    let key = client_key(&request);
    let decision = state.rate_limiter.hit(&key, unix_now(), config);

    if !decision.allowed {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after: decision.reset_after,
            message: format!(
                "Rate limit exceeded. Try again in {} seconds",
                decision.reset_after
            ),
        });
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&config.max_requests.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_after.to_string()) {
        headers.insert("X-RateLimit-Reset", value);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: RateLimitConfig = RateLimitConfig {
        max_requests: 3,
        window_secs: 60,
    };

    #[test]
    fn test_allows_up_to_limit() {
        let store = MemoryStore::new();

        for expected_remaining in [2, 1, 0] {
            let decision = store.hit("1.2.3.4", 1000, CONFIG);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let decision = store.hit("1.2.3.4", 1001, CONFIG);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.reset_after, 59);
    }

    #[test]
    fn test_window_resets() {
        let store = MemoryStore::new();

        for _ in 0..3 {
            store.hit("1.2.3.4", 1000, CONFIG);
        }
        assert!(!store.hit("1.2.3.4", 1030, CONFIG).allowed);

        // A full window later the counter starts over.
        let decision = store.hit("1.2.3.4", 1060, CONFIG);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn test_clients_are_independent() {
        let store = MemoryStore::new();

        for _ in 0..3 {
            store.hit("1.2.3.4", 1000, CONFIG);
        }

        assert!(!store.hit("1.2.3.4", 1001, CONFIG).allowed);
        assert!(store.hit("5.6.7.8", 1001, CONFIG).allowed);
    }

    #[test]
    fn test_sweep_drops_expired_entries() {
        let store = MemoryStore::new();

        store.hit("old", 1000, CONFIG);
        store.hit("fresh", 1050, CONFIG);

        store.sweep(1061, CONFIG.window_secs);

        let entries = store.entries.lock().unwrap();
        assert!(!entries.contains_key("old"));
        assert!(entries.contains_key("fresh"));
    }
}
