//! Rate limiting middleware.
//!
//! A keyed `governor` limiter with one bucket per client. The client is the
//! session user when a guard has already run, otherwise the peer address.
//! `X-Forwarded-For` replaces the peer address only when the proxy in front
//! is trusted to overwrite it.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter as GovRateLimiter,
};
use std::{
    net::SocketAddr,
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};

use super::session::SessionUser;
use crate::app::AppState;
use crate::error::ApiError;

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const ANONYMOUS_CLIENT: &str = "anonymous";

/// Bucket shared by new clients once `max_clients` buckets are tracked.
const OVERFLOW_CLIENT: &str = "overflow";

/// Upper bound on tracked client buckets.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// Idle buckets are pruned every this many checks.
const PRUNE_INTERVAL: u64 = 1_024;

/// Per-client limiter shared across requests.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<String>,
    rate_limit_per_minute: u32,
    trust_forwarded_for: bool,
    max_clients: usize,
    checks: AtomicU64,
}

impl RateLimiterState {
    /// Returns `None` when `rate_limit_per_minute` is 0.
    pub fn new(rate_limit_per_minute: u32, trust_forwarded_for: bool) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: GovRateLimiter::keyed(Quota::per_minute(per_minute)),
            rate_limit_per_minute,
            trust_forwarded_for,
            max_clients: DEFAULT_MAX_CLIENTS,
            checks: AtomicU64::new(0),
        })
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Number of client buckets currently held.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// `Err` carries the seconds to wait, at least 1.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_INTERVAL == PRUNE_INTERVAL - 1 {
            self.prune();
        }

        let mut key = client.to_string();
        if self.limiter.len() >= self.max_clients {
            self.prune();
            if self.limiter.len() >= self.max_clients {
                tracing::warn!(
                    max_clients = self.max_clients,
                    "Rate limiter full, using shared overflow bucket"
                );
                key = OVERFLOW_CLIENT.to_string();
            }
        }

        self.limiter.check_key(&key).map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1)
        })
    }

    fn client_key(&self, req: &Request<Body>) -> String {
        if let Some(user) = req.extensions().get::<SessionUser>() {
            return format!("user:{}", user.user_id);
        }

        if self.trust_forwarded_for {
            let forwarded = req
                .headers()
                .get(FORWARDED_FOR_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|addr| !addr.is_empty());
            if let Some(addr) = forwarded {
                return format!("addr:{}", addr);
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(peer)| format!("addr:{}", peer.ip()))
            .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// Applies the per-client limit. Route it after the session guards so
/// logged-in callers get their own bucket.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(rate_limiter) = &state.rate_limiter {
        let client = rate_limiter.client_key(&req);
        if let Err(retry_after) = rate_limiter.check(&client) {
            tracing::warn!(client = %client, retry_after, "Rate limit exceeded");
            return Err(ApiError::RateLimited {
                limit: rate_limiter.rate_limit_per_minute(),
                retry_after,
            });
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request_with(forwarded_for: Option<&str>, peer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder();
        if let Some(addr) = forwarded_for {
            builder = builder.header(FORWARDED_FOR_HEADER, addr);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            let peer: SocketAddr = peer.parse().unwrap();
            req.extensions_mut().insert(ConnectInfo(peer));
        }
        req
    }

    #[test]
    fn test_zero_disables() {
        assert!(RateLimiterState::new(0, false).is_none());
    }

    #[test]
    fn test_exhaustion() {
        let state = RateLimiterState::new(1, false).unwrap();
        assert!(state.check("addr:10.0.0.1").is_ok());

        let retry_after = state.check("addr:10.0.0.1").unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_clients_are_independent() {
        let state = RateLimiterState::new(1, false).unwrap();
        assert!(state.check("user:a").is_ok());
        assert!(state.check("user:b").is_ok());
        assert!(state.check("user:a").is_err());
        assert_eq!(state.tracked_clients(), 2);
    }

    #[test]
    fn test_tracked_clients_stay_bounded() {
        let state = RateLimiterState::new(1, true).unwrap().with_max_clients(50);

        for i in 0..5_000 {
            let _ = state.check(&format!("addr:10.0.{}.{}", i / 256, i % 256));
        }

        // The cap plus the shared overflow bucket.
        assert!(state.tracked_clients() <= 51);
        assert!(format!("{:?}", state).contains("tracked_clients"));
    }

    #[test]
    fn test_new_clients_share_overflow_bucket_when_full() {
        let state = RateLimiterState::new(1, true).unwrap().with_max_clients(2);
        assert!(state.check("addr:10.0.0.1").is_ok());
        assert!(state.check("addr:10.0.0.2").is_ok());

        assert!(state.check("addr:10.0.0.3").is_ok());
        assert!(state.check("addr:10.0.0.4").is_err());
    }

    #[test]
    fn test_client_key_prefers_session_user() {
        let state = RateLimiterState::new(10, true).unwrap();
        let user_id = Uuid::new_v4();
        let mut req = request_with(Some("203.0.113.9"), Some("198.51.100.4:5000"));
        req.extensions_mut().insert(SessionUser {
            user_id,
            is_admin: false,
        });
        assert_eq!(state.client_key(&req), format!("user:{}", user_id));
    }

    #[test]
    fn test_client_key_ignores_forwarded_for_by_default() {
        let state = RateLimiterState::new(10, false).unwrap();
        let req = request_with(Some("203.0.113.9"), Some("198.51.100.4:5000"));
        assert_eq!(state.client_key(&req), "addr:198.51.100.4");
    }

    #[test]
    fn test_client_key_uses_forwarded_for_when_trusted() {
        let state = RateLimiterState::new(10, true).unwrap();
        let req = request_with(Some("203.0.113.9, 10.0.0.2"), Some("10.0.0.2:5000"));
        assert_eq!(state.client_key(&req), "addr:203.0.113.9");
    }

    #[test]
    fn test_client_key_peer_port_is_ignored() {
        let state = RateLimiterState::new(10, false).unwrap();
        let first = request_with(None, Some("198.51.100.4:5000"));
        let second = request_with(None, Some("198.51.100.4:6000"));
        assert_eq!(state.client_key(&first), state.client_key(&second));
    }

    #[test]
    fn test_client_key_anonymous() {
        let state = RateLimiterState::new(10, false).unwrap();
        let req = request_with(None, None);
        assert_eq!(state.client_key(&req), ANONYMOUS_CLIENT);
    }
}
