//! Per-client token bucket rate limiting.
//!
//! Each client IP gets a bucket holding up to `requests_per_minute` tokens,
//! refilled continuously at `requests_per_minute / 60` tokens per second.
//! A request consumes one token or is rejected. Buckets untouched for a
//! minute are dropped, so a returning client starts full again.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::ApiError;
use crate::metrics;

/// How long an idle bucket is kept.
pub const IDLE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn refill(&mut self, capacity: f64, per_second: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * per_second).min(capacity);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct Buckets {
    by_client: HashMap<IpAddr, TokenBucket>,
    last_sweep: Instant,
}

/// Rate limiter keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    per_second: f64,
    idle_ttl: Duration,
    buckets: Mutex<Buckets>,
}

impl RateLimiter {
    /// Limiter allowing `requests_per_minute` per client, or `None` when
    /// the limit is zero (limiting disabled).
    pub fn per_minute(requests_per_minute: u32) -> Option<Self> {
        if requests_per_minute == 0 {
            return None;
        }
        let capacity = f64::from(requests_per_minute);
        Some(Self {
            capacity,
            per_second: capacity / 60.0,
            idle_ttl: IDLE_TTL,
            buckets: Mutex::new(Buckets {
                by_client: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        })
    }

    /// Take one token for `client`. `false` means the request is over the limit.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        let mut buckets = self.buckets.lock();

        if now.saturating_duration_since(buckets.last_sweep) >= self.idle_ttl {
            let ttl = self.idle_ttl;
            buckets
                .by_client
                .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < ttl);
            buckets.last_sweep = now;
        }

        let capacity = self.capacity;
        let bucket = buckets
            .by_client
            .entry(client)
            .or_insert_with(|| TokenBucket::full(capacity, now));
        bucket.refill(capacity, self.per_second, now);
        bucket.try_consume()
    }

    /// Number of clients with a live bucket.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().by_client.len()
    }
}

/// Middleware rejecting management requests over the per-client limit.
pub(crate) async fn limit_by_client(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !limiter.check(peer.ip()) {
        warn!(client = %peer.ip(), path = %request.uri().path(), "rate limit exceeded");
        metrics::record_rate_limited();
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_zero_disables() {
        assert!(RateLimiter::per_minute(0).is_none());
    }

    #[test]
    fn test_burst_up_to_capacity() {
        let limiter = RateLimiter::per_minute(3).unwrap();
        let now = Instant::now();
        assert!(limiter.check_at(ip(1), now));
        assert!(limiter.check_at(ip(1), now));
        assert!(limiter.check_at(ip(1), now));
        assert!(!limiter.check_at(ip(1), now));
    }

    #[test]
    fn test_refill_over_time() {
        // 60/min is one token per second.
        let limiter = RateLimiter::per_minute(60).unwrap();
        let start = Instant::now();
        for _ in 0..60 {
            assert!(limiter.check_at(ip(1), start));
        }
        assert!(!limiter.check_at(ip(1), start));

        let later = start + Duration::from_millis(1_500);
        assert!(limiter.check_at(ip(1), later));
        assert!(!limiter.check_at(ip(1), later));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::per_minute(1).unwrap();
        let now = Instant::now();
        assert!(limiter.check_at(ip(1), now));
        assert!(!limiter.check_at(ip(1), now));
        assert!(limiter.check_at(ip(2), now));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_idle_buckets_expire() {
        let limiter = RateLimiter::per_minute(1).unwrap();
        let now = Instant::now();
        assert!(limiter.check_at(ip(1), now));
        assert!(!limiter.check_at(ip(1), now));

        let later = now + IDLE_TTL + Duration::from_secs(1);
        assert!(limiter.check_at(ip(2), later));
        assert_eq!(limiter.tracked_clients(), 1);

        // ip(1) was swept and starts with a full bucket.
        assert!(limiter.check_at(ip(1), later));
    }
}
