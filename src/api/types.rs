//! Shared types for the HTTP API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use subtle::ConstantTimeEq;

use crate::core_state::CoreState;

/// Chat requests allowed per client per minute.
pub const CHAT_PER_MINUTE: u32 = 20;
/// Chat requests allowed per client per hour.
pub const CHAT_PER_HOUR: u32 = 200;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus the chat rate limiter.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(CHAT_PER_MINUTE, CHAT_PER_HOUR))),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Admin token
// ═══════════════════════════════════════════════════════════

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Compare a presented token with the configured one. Digests are compared
/// in constant time so response timing does not leak the token.
pub fn token_matches(presented: &str, expected: &str) -> bool {
    hash_token(presented).ct_eq(&hash_token(expected)).into()
}

// ═══════════════════════════════════════════════════════════
// Rate limiter — per-client sliding window
// ═══════════════════════════════════════════════════════════

/// Clients tracked before idle ones are evicted.
pub const MAX_TRACKED_CLIENTS: usize = 10_000;
/// Calls between sweeps of expired windows.
const SWEEP_EVERY: u64 = 1_024;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Per-client rate limiter with per-minute and per-hour limits.
///
/// Keys come from a client-controlled header, so the key set is bounded:
/// expired windows are swept periodically, and past `max_clients` the
/// least recently seen clients are dropped.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
    max_clients: usize,
    calls: u64,
}

impl RateLimiter {
    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
            max_clients: MAX_TRACKED_CLIENTS,
            calls: 0,
        }
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    /// Number of clients currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Check if a client is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        self.calls = self.calls.wrapping_add(1);
        if self.calls % SWEEP_EVERY == 0
            || (self.windows.len() >= self.max_clients && !self.windows.contains_key(key))
        {
            self.sweep(now);
        }

        let entries = self.windows.entry(key.to_string()).or_default();
        entries.retain(|ts| now.duration_since(*ts) < HOUR);

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < MINUTE)
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }

    /// Drop expired windows, then evict the least recently seen clients
    /// until there is room for a quarter of `max_clients` new ones.
    fn sweep(&mut self, now: Instant) {
        self.windows.retain(|_, entries| {
            entries.retain(|ts| now.duration_since(*ts) < HOUR);
            !entries.is_empty()
        });

        if self.windows.len() < self.max_clients {
            return;
        }
        let keep = self.max_clients - self.max_clients / 4;
        let mut by_last_seen: Vec<(Instant, String)> = self
            .windows
            .iter()
            .filter_map(|(key, entries)| entries.last().map(|ts| (*ts, key.clone())))
            .collect();
        by_last_seen.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        let evict = by_last_seen.len().saturating_sub(keep);
        for (_, key) in by_last_seen.into_iter().take(evict) {
            self.windows.remove(&key);
        }
        tracing::debug!(evicted = evict, tracked = self.windows.len(), "Rate limiter sweep");
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(CHAT_PER_MINUTE, CHAT_PER_HOUR)
    }
}
