//! Per-client-IP token bucket throttling.
//!
//! Each source address gets a bucket holding at most `burst` tokens that
//! refills at `rps` tokens per second. Entries that have not been seen for the
//! idle window are evicted by a periodic sweep so the map stays bounded.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::LimiterConfig;
use crate::error::ApiError;

/// Time source for bucket refills and idle tracking.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(burst: f64, now: Instant) -> Self {
        Self { tokens: burst, last_refill: now }
    }

    fn try_take(&mut self, rps: f64, burst: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rps).min(burst);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct Client {
    bucket: TokenBucket,
    last_seen: Instant,
}

pub struct RateLimiter {
    config: LimiterConfig,
    clients: Mutex<HashMap<IpAddr, Client>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    // A panic while the lock is held cannot wedge the limiter.
    fn clients(&self) -> MutexGuard<'_, HashMap<IpAddr, Client>> {
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Takes a token for `ip`, creating its bucket on first sight.
    pub fn allow(&self, ip: IpAddr) -> bool {
        let now = self.clock.now();
        let burst = f64::from(self.config.burst);

        let mut clients = self.clients();
        let client = clients.entry(ip).or_insert_with(|| Client {
            bucket: TokenBucket::full(burst, now),
            last_seen: now,
        });
        client.last_seen = now;
        client.bucket.try_take(self.config.rps, burst, now)
    }

    /// Drops clients idle for longer than the configured window. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let idle = self.config.idle_timeout();

        let mut clients = self.clients();
        let before = clients.len();
        clients.retain(|_, client| now.saturating_duration_since(client.last_seen) <= idle);
        before - clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients().len()
    }

    pub fn is_tracked(&self, ip: IpAddr) -> bool {
        self.clients().contains_key(&ip)
    }

    /// Runs [`RateLimiter::sweep`] on the configured interval until aborted.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = limiter.config.sweep_interval().max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = limiter.sweep();
                if evicted > 0 {
                    debug!(evicted, remaining = limiter.tracked_clients(), "rate limiter sweep");
                }
            }
        })
    }
}

/// Rejects requests from clients whose bucket is empty with 429.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !limiter.enabled() {
        return Ok(next.run(request).await);
    }

    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .ok_or_else(|| {
            error!("client address unavailable for rate limiting");
            ApiError::server_error()
        })?;

    if !limiter.allow(ip) {
        return Err(ApiError::rate_limit_exceeded());
    }

    Ok(next.run(request).await)
}
