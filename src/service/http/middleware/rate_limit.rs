//! 按来源 IP 的令牌桶限流
//!
//! 每个 IP 一个桶: 容量 burst, 按 rps 匀速补充;
//! 空闲条目由后台任务按窗口周期清理.
//! 登录路由用更严格的独立实例包裹

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::HttpResponse;
use dashmap::DashMap;
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::super::models::ErrorBody;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

pub struct LimiterState {
    buckets: DashMap<String, Bucket>,
    rps: f64,
    burst: f64,
}

impl LimiterState {
    fn allow(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut bucket = self.buckets.entry(ip.to_string()).or_insert_with(|| Bucket {
            tokens: self.burst,
            last_refill: now,
            last_seen: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rps).min(self.burst);
        bucket.last_refill = now;
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn cleanup(&self, window: Duration) {
        let now = Instant::now();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.last_seen) <= window);
    }
}

/// 限流中间件 (可克隆, 同一实例共享桶表)
#[derive(Clone)]
pub struct RateLimit {
    state: Arc<LimiterState>,
}

impl RateLimit {
    pub fn new(rps: f64, burst: u32, cleanup_window: Duration) -> Self {
        let state = Arc::new(LimiterState {
            buckets: DashMap::new(),
            rps,
            burst: burst as f64,
        });

        let cleanup_state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_window);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cleanup_state.cleanup(cleanup_window);
            }
        });

        Self { state }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = RateLimitMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            state: Arc::clone(&self.state),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: S,
    state: Arc<LimiterState>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        if !self.state.allow(&ip) {
            log::warn!("rate limited: {}", ip);
            let res = req
                .into_response(HttpResponse::TooManyRequests().json(ErrorBody::new("rate_limited")))
                .map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(rps: f64, burst: u32) -> LimiterState {
        LimiterState {
            buckets: DashMap::new(),
            rps,
            burst: burst as f64,
        }
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = state(1.0, 3);
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[test]
    fn test_buckets_are_per_ip() {
        let limiter = state(1.0, 1);
        assert!(limiter.allow("1.1.1.1"));
        assert!(!limiter.allow("1.1.1.1"));
        assert!(limiter.allow("2.2.2.2"));
    }

    #[test]
    fn test_cleanup_drops_idle_entries() {
        let limiter = state(1.0, 1);
        assert!(limiter.allow("1.1.1.1"));
        assert_eq!(limiter.buckets.len(), 1);
        limiter.cleanup(Duration::from_secs(0));
        assert_eq!(limiter.buckets.len(), 0);
    }
}
