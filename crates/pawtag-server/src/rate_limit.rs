//! Per-IP throttle for finder location reports.
//!
//! The report endpoint is public and each accepted call may hit the external
//! geocoder, so every client IP gets a small allowance that refills over
//! time.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
struct Allowance {
    remaining: f64,
    refreshed_at: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    allowances: Arc<Mutex<HashMap<IpAddr, Allowance>>>,
    /// Requests regained per second.
    refill_per_sec: f64,
    /// Largest allowance a client can accumulate.
    burst: f64,
}

impl RateLimiter {
    /// `per_minute` requests per minute, all of which may arrive at once.
    pub fn per_minute(per_minute: u32) -> Self {
        let per_minute = f64::from(per_minute.max(1));
        Self {
            allowances: Arc::new(Mutex::new(HashMap::new())),
            refill_per_sec: per_minute / 60.0,
            burst: per_minute,
        }
    }

    /// Spend one request from `ip`'s allowance.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut allowances = self.allowances.lock().await;
        let entry = allowances.entry(ip).or_insert(Allowance {
            remaining: self.burst,
            refreshed_at: now,
        });

        let idle = now.duration_since(entry.refreshed_at).as_secs_f64();
        entry.remaining = (entry.remaining + idle * self.refill_per_sec).min(self.burst);
        entry.refreshed_at = now;

        if entry.remaining < 1.0 {
            return false;
        }
        entry.remaining -= 1.0;
        true
    }

    /// Drop clients that have not been seen for `max_idle`.
    pub async fn forget_idle(&self, max_idle: Duration) {
        let now = Instant::now();
        self.allowances
            .lock()
            .await
            .retain(|_, a| now.duration_since(a.refreshed_at) < max_idle);
    }
}

pub async fn limit_reports(
    State(limiter): State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(ip) = client_ip(&req) {
        if !limiter.allow(ip).await {
            warn!(ip = %ip, "Location report rate limit exceeded");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// Peer address first, then the proxy headers.
fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }

    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .or_else(|| header("x-real-ip"))
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_then_throttle() {
        let limiter = RateLimiter::per_minute(3);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.allow(ip).await);
        }
        assert!(!limiter.allow(ip).await);
    }

    #[tokio::test]
    async fn clients_are_independent() {
        let limiter = RateLimiter::per_minute(1);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.allow(a).await);
        assert!(!limiter.allow(a).await);
        assert!(limiter.allow(b).await);
    }

    #[tokio::test]
    async fn idle_clients_are_forgotten() {
        let limiter = RateLimiter::per_minute(5);
        limiter.allow("192.168.1.1".parse().unwrap()).await;

        limiter.forget_idle(Duration::ZERO).await;
        assert!(limiter.allowances.lock().await.is_empty());
    }

    #[test]
    fn forwarded_header_is_used_without_peer_address() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req), Some("203.0.113.7".parse().unwrap()));

        let bare = Request::builder().body(()).unwrap();
        assert_eq!(client_ip(&bare), None);
    }
}
