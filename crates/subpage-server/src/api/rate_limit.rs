//! In-memory rate limiter: скользящее окно на IP с временной блокировкой.

use crate::config::RateLimitConfig;
use crate::error::AppError;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Верхняя граница блокировки, чтобы `Instant + block_time` не переполнялся.
const MAX_BLOCK_TIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Default)]
struct Buckets {
    /// Время запросов в текущем окне
    requests: HashMap<String, VecDeque<Instant>>,
    /// IP -> момент окончания блокировки
    blocked: HashMap<String, Instant>,
}

/// Rate limiter для ограничения запросов по IP.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<Buckets>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(mut config: RateLimitConfig) -> Self {
        config.block_time = config.block_time.min(MAX_BLOCK_TIME);
        Self {
            buckets: Arc::new(Mutex::new(Buckets::default())),
            config,
        }
    }

    pub async fn allow(&self, ip: &str) -> bool {
        self.allow_at(ip, Instant::now()).await
    }

    pub(crate) async fn allow_at(&self, ip: &str, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut guard = self.buckets.lock().await;
        let buckets = &mut *guard;

        if let Some(until) = buckets.blocked.get(ip).copied() {
            if now < until {
                return false;
            }
            buckets.blocked.remove(ip);
        }

        // Периодическая очистка при росте таблицы
        if buckets.requests.len() > 1000 {
            let period = self.config.period;
            buckets.requests.retain(|_, times| {
                times
                    .back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < period)
            });
            buckets.blocked.retain(|_, until| now < *until);
        }

        let period = self.config.period;
        let window = buckets.requests.entry(ip.to_string()).or_default();
        while window
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= period)
        {
            window.pop_front();
        }

        if window.len() >= self.config.max_requests {
            buckets
                .blocked
                .insert(ip.to_string(), now + self.config.block_time);
            tracing::warn!(
                "IP {ip} заблокирован на {} сек",
                self.config.block_time.as_secs()
            );
            return false;
        }

        window.push_back(now);
        true
    }
}

/// Middleware rate limiting: отклоняет запросы при превышении лимита.
pub async fn rate_limit_middleware(
    rate_limiter: RateLimiter,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ip = extract_ip(&req);

    if !rate_limiter.allow(&ip).await {
        return AppError::TooManyRequests.into_response();
    }

    next.run(req).await
}

/// Извлечь IP клиента: X-Forwarded-For, затем X-Real-IP, затем адрес соединения.
pub fn extract_ip<B>(req: &Request<B>) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| header("x-real-ip").map(str::to_string))
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: usize) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            enabled: true,
            max_requests,
            period: Duration::from_secs(60),
            block_time: Duration::from_secs(30),
        })
    }

    #[tokio::test]
    async fn blocks_after_quota_and_recovers_after_block_time() {
        let limiter = limiter(3);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.allow_at("10.0.0.1", start).await);
        }
        assert!(!limiter.allow_at("10.0.0.1", start).await);

        // Блокировка ещё действует
        let during_block = start + Duration::from_secs(10);
        assert!(!limiter.allow_at("10.0.0.1", during_block).await);

        // Окно истекло и блокировка снята
        let after = start + Duration::from_secs(61);
        assert!(limiter.allow_at("10.0.0.1", after).await);
    }

    #[tokio::test]
    async fn huge_block_time_is_clamped() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: true,
            max_requests: 1,
            period: Duration::from_secs(60),
            block_time: Duration::MAX,
        });
        let start = Instant::now();

        assert!(limiter.allow_at("10.0.0.1", start).await);
        assert!(!limiter.allow_at("10.0.0.1", start).await);
        let later = start + Duration::from_secs(30 * 24 * 60 * 60);
        assert!(!limiter.allow_at("10.0.0.1", later).await);
    }

    #[tokio::test]
    async fn ips_are_counted_independently() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.allow_at("10.0.0.1", now).await);
        assert!(!limiter.allow_at("10.0.0.1", now).await);
        assert!(limiter.allow_at("10.0.0.2", now).await);
    }

    #[tokio::test]
    async fn disabled_limiter_allows_everything() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: false,
            max_requests: 0,
            ..RateLimitConfig::default()
        });
        for _ in 0..50 {
            assert!(limiter.allow("10.0.0.1").await);
        }
    }

    #[test]
    fn client_ip_prefers_forwarded_headers() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(extract_ip(&req), "203.0.113.7");

        let req = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(extract_ip(&req), "198.51.100.2");

        let req = Request::builder().body(()).unwrap();
        assert_eq!(extract_ip(&req), "unknown");
    }
}
