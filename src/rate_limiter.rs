/*!
 * # Rate Limiting Module
 *
 * A configurable fixed-window rate limiter applied as a tower layer:
 *
 * - Global limits keyed by client identifier (API key header, else IP)
 * - Path-prefix policy overrides parsed from configuration
 * - In-memory store (dashmap) with an optional Redis backend, so the same
 *   layer can be pointed at a distributed store under load
 * - Standard `X-RateLimit-*` response headers
 *
 * The limiter is injected into the router rather than held as module-level
 * state; a background cleanup task bounds the in-memory map.
 */
use axum::{
    extract::Request,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use dashmap::DashMap;
use metrics::counter;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Converts a number to a HeaderValue. Numeric strings are always valid
/// ASCII header values.
fn num_to_header_value<T: ToString>(n: T) -> http::HeaderValue {
    http::HeaderValue::from_str(&n.to_string())
        .unwrap_or_else(|_| http::HeaderValue::from_static("0"))
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded")]
    LimitExceeded,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
    last_request: Instant,
}

impl RateLimitEntry {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            count: 1,
            window_start: now,
            last_request: now,
        }
    }

    fn increment(&mut self, window_duration: Duration) {
        let now = Instant::now();

        // Reset if window has expired
        if now.duration_since(self.window_start) >= window_duration {
            self.count = 1;
            self.window_start = now;
        } else {
            self.count += 1;
        }

        self.last_request = now;
    }

    fn is_allowed(&self, limit: u32, window_duration: Duration) -> bool {
        let now = Instant::now();

        if now.duration_since(self.window_start) >= window_duration {
            return true;
        }

        self.count <= limit
    }

    fn time_until_reset(&self, window_duration: Duration) -> Duration {
        let elapsed = self.last_request.duration_since(self.window_start);
        if elapsed >= window_duration {
            Duration::from_secs(0)
        } else {
            window_duration - elapsed
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_duration: Duration,
    pub enable_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 100,
            window_duration: Duration::from_secs(60),
            enable_headers: true,
        }
    }
}

#[derive(Clone, Default)]
pub enum RateLimitBackend {
    #[default]
    InMemory,
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
    },
}

#[derive(Clone)]
enum RateLimitStore {
    InMemory {
        entries: Arc<DashMap<String, RateLimitEntry>>,
    },
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
        fallback: Arc<DashMap<String, RateLimitEntry>>,
    },
}

#[derive(Clone)]
pub struct RateLimiter {
    store: RateLimitStore,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, backend: RateLimitBackend) -> Self {
        let store = match backend {
            RateLimitBackend::InMemory => RateLimitStore::InMemory {
                entries: Arc::new(DashMap::new()),
            },
            RateLimitBackend::Redis { client, namespace } => RateLimitStore::Redis {
                client,
                namespace,
                fallback: Arc::new(DashMap::new()),
            },
        };

        Self { store, config }
    }

    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(config, RateLimitBackend::InMemory)
    }

    /// Same underlying store, different limits (used for path overrides).
    pub fn with_config(&self, config: RateLimitConfig) -> Self {
        Self {
            store: self.store.clone(),
            config,
        }
    }

    pub async fn check_rate_limit(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        match &self.store {
            RateLimitStore::InMemory { entries } => {
                Ok(Self::check_in_memory(entries, key, &self.config))
            }
            RateLimitStore::Redis {
                client,
                namespace,
                fallback,
            } => match client.get_async_connection().await {
                Ok(mut conn) => {
                    match Self::check_with_redis(&mut conn, namespace, key, &self.config).await {
                        Ok(result) => Ok(result),
                        Err(err) => {
                            warn!("Redis rate limit error: {}", err);
                            Ok(Self::check_in_memory(fallback, key, &self.config))
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        "Failed to connect to Redis for rate limiting, using fallback: {}",
                        err
                    );
                    Ok(Self::check_in_memory(fallback, key, &self.config))
                }
            },
        }
    }

    fn check_in_memory(
        entries: &DashMap<String, RateLimitEntry>,
        key: &str,
        config: &RateLimitConfig,
    ) -> RateLimitResult {
        let mut entry = entries
            .entry(key.to_string())
            .or_insert_with(RateLimitEntry::new);

        if !entry.is_allowed(config.requests_per_window, config.window_duration) {
            let time_until_reset = entry.time_until_reset(config.window_duration);
            return RateLimitResult {
                allowed: false,
                limit: config.requests_per_window,
                remaining: 0,
                reset_time: time_until_reset,
            };
        }

        entry.increment(config.window_duration);
        let remaining = config.requests_per_window.saturating_sub(entry.count);
        let time_until_reset = entry.time_until_reset(config.window_duration);

        RateLimitResult {
            allowed: true,
            limit: config.requests_per_window,
            remaining,
            reset_time: time_until_reset,
        }
    }

    async fn check_with_redis<C>(
        conn: &mut C,
        namespace: &str,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, redis::RedisError>
    where
        C: redis::aio::ConnectionLike + Send,
    {
        let redis_key = format!("{}:{}", namespace, key);
        let limit = config.requests_per_window as i64;
        let window_secs = config.window_duration.as_secs().max(1);

        let count: i64 = conn.incr(&redis_key, 1).await?;
        if count == 1 {
            let _: Result<(), _> = conn.expire(&redis_key, window_secs as usize).await;
        } else {
            let ttl: i64 = conn.ttl(&redis_key).await.unwrap_or(-1);
            if ttl < 0 {
                let _: Result<(), _> = conn.expire(&redis_key, window_secs as usize).await;
            }
        }

        let ttl_secs = match conn.ttl::<_, i64>(&redis_key).await {
            Ok(ttl) if ttl > 0 => ttl as u64,
            _ => window_secs,
        };
        let allowed = count <= limit;
        let remaining = if allowed {
            config
                .requests_per_window
                .saturating_sub(count.max(0) as u32)
        } else {
            0
        };

        Ok(RateLimitResult {
            allowed,
            limit: config.requests_per_window,
            remaining,
            reset_time: Duration::from_secs(ttl_secs),
        })
    }

    pub async fn get_remaining_quota(&self, key: &str) -> u32 {
        match &self.store {
            RateLimitStore::InMemory { entries } => {
                Self::remaining_in_memory(entries, key, &self.config)
            }
            RateLimitStore::Redis {
                client,
                namespace,
                fallback,
            } => {
                let redis_key = format!("{}:{}", namespace, key);
                match client.get_async_connection().await {
                    Ok(mut conn) => match conn.get::<_, i64>(&redis_key).await {
                        Ok(count) if count > 0 => {
                            self.config.requests_per_window.saturating_sub(count as u32)
                        }
                        Ok(_) => self.config.requests_per_window,
                        Err(err) => {
                            warn!("Failed to get Redis quota for {}: {}", key, err);
                            Self::remaining_in_memory(fallback, key, &self.config)
                        }
                    },
                    Err(err) => {
                        warn!(
                            "Failed to connect to Redis for quota lookup, using fallback: {}",
                            err
                        );
                        Self::remaining_in_memory(fallback, key, &self.config)
                    }
                }
            }
        }
    }

    /// Drops expired windows so the in-memory map stays bounded.
    pub async fn cleanup_expired(&self) {
        let entries = match &self.store {
            RateLimitStore::InMemory { entries } => entries,
            RateLimitStore::Redis { fallback, .. } => fallback,
        };
        let now = Instant::now();
        entries.retain(|_, entry| {
            now.duration_since(entry.window_start) < self.config.window_duration
        });
    }

    fn remaining_in_memory(
        entries: &DashMap<String, RateLimitEntry>,
        key: &str,
        config: &RateLimitConfig,
    ) -> u32 {
        if let Some(entry) = entries.get(key) {
            let now = Instant::now();
            if now.duration_since(entry.window_start) >= config.window_duration {
                config.requests_per_window
            } else {
                config.requests_per_window.saturating_sub(entry.count)
            }
        } else {
            config.requests_per_window
        }
    }
}

#[derive(Debug)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: Duration,
}

#[derive(Clone, Debug)]
pub struct PathPolicy {
    pub prefix: String,
    pub requests_per_window: u32,
    pub window_duration: Duration,
}

// Key extraction functions

pub fn extract_ip_key(request: &Request) -> String {
    // Prefer the real client IP from proxy headers
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return format!("ip:{}", ip.trim());
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return format!("ip:{}", ip_str);
        }
    }

    "ip:unknown".to_string()
}

pub fn extract_api_key(request: &Request) -> Option<String> {
    if let Some(api_key) = request.headers().get("x-api-key") {
        if let Ok(key_str) = api_key.to_str() {
            return Some(format!("api_key:{}", key_str));
        }
    }

    None
}

/// Layer implementation for tower
#[derive(Clone)]
pub struct RateLimitLayer {
    rate_limiter: RateLimiter,
    path_policies: Arc<Vec<PathPolicy>>,
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig, backend: RateLimitBackend) -> Self {
        Self::from_limiter(RateLimiter::new(config, backend))
    }

    /// Wraps an existing limiter so the caller can keep a handle to the same
    /// store (e.g. for the cleanup task).
    pub fn from_limiter(rate_limiter: RateLimiter) -> Self {
        Self {
            rate_limiter,
            path_policies: Arc::new(Vec::new()),
        }
    }

    pub fn with_policies(mut self, policies: Vec<PathPolicy>) -> Self {
        self.path_policies = Arc::new(policies);
        self
    }
}

impl<S> tower::Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            rate_limiter: self.rate_limiter.clone(),
            path_policies: self.path_policies.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    rate_limiter: RateLimiter,
    path_policies: Arc<Vec<PathPolicy>>,
}

impl<S> tower::Service<Request> for RateLimitService<S>
where
    S: tower::Service<Request, Response = Response<axum::body::Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<axum::body::Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let rate_limiter = self.rate_limiter.clone();
        let mut inner = self.inner.clone();
        let policies = self.path_policies.clone();

        Box::pin(async move {
            // Operational endpoints are never limited
            let path = request.uri().path().to_string();
            if path.starts_with("/health") || path.starts_with("/docs") || path == "/metrics" {
                return inner.call(request).await;
            }

            // Extract key (prefer API key, then IP)
            let key = extract_api_key(&request).unwrap_or_else(|| extract_ip_key(&request));

            // Determine the effective policy: path prefix override, else global
            let mut effective = rate_limiter.config.clone();
            for p in policies.iter() {
                if path.starts_with(&p.prefix) {
                    effective.requests_per_window = p.requests_per_window;
                    effective.window_duration = p.window_duration;
                    break;
                }
            }

            let limiter = if effective.requests_per_window != rate_limiter.config.requests_per_window
                || effective.window_duration != rate_limiter.config.window_duration
            {
                rate_limiter.with_config(effective)
            } else {
                rate_limiter.clone()
            };

            match limiter.check_rate_limit(&key).await {
                Ok(result) => {
                    if !result.allowed {
                        warn!("Rate limit exceeded for key: {}", key);
                        counter!("storefront_rate_limit.denied", 1);

                        let mut response =
                            Response::new(axum::body::Body::from("Rate limit exceeded"));
                        *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;

                        if rate_limiter.config.enable_headers {
                            let headers = response.headers_mut();
                            headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
                            headers.insert("X-RateLimit-Remaining", num_to_header_value(0));
                            headers.insert(
                                "X-RateLimit-Reset",
                                num_to_header_value(result.reset_time.as_secs()),
                            );
                        }

                        return Ok(response);
                    }

                    let mut response = inner.call(request).await?;
                    counter!("storefront_rate_limit.allowed", 1);

                    if rate_limiter.config.enable_headers {
                        let headers = response.headers_mut();
                        headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
                        headers.insert(
                            "X-RateLimit-Remaining",
                            num_to_header_value(result.remaining),
                        );
                        headers.insert(
                            "X-RateLimit-Reset",
                            num_to_header_value(result.reset_time.as_secs()),
                        );
                    }

                    Ok(response)
                }
                Err(e) => {
                    warn!("Rate limiter error: {}", e);
                    // Continue with request on limiter error
                    inner.call(request).await
                }
            }
        })
    }
}

/// Background cleanup task bounding the in-memory store.
pub async fn start_cleanup_task(rate_limiter: RateLimiter, interval: Duration) {
    let mut interval_timer = tokio::time::interval(interval);

    loop {
        interval_timer.tick().await;
        rate_limiter.cleanup_expired().await;
        debug!("Rate limiter cleanup completed");
    }
}

/// Errors that can occur when parsing rate limit policy strings
#[derive(Debug, Error)]
pub enum PolicyParseError {
    #[error("Invalid policy format for '{spec}': expected 'path:limit:window_secs', got {parts} parts")]
    InvalidFormat { spec: String, parts: usize },

    #[error("Invalid limit value '{value}' in policy '{spec}': {reason}")]
    InvalidLimit {
        spec: String,
        value: String,
        reason: String,
    },

    #[error("Invalid window duration '{value}' in policy '{spec}': {reason}")]
    InvalidWindow {
        spec: String,
        value: String,
        reason: String,
    },

    #[error("Empty policy specification")]
    EmptySpec,

    #[error("Path policy must start with '/': got '{path}'")]
    InvalidPathFormat { path: String },

    #[error("Window duration must be at least 1 second, got {window_secs}")]
    WindowTooSmall { window_secs: u64 },

    #[error("Limit must be at least 1, got {limit}")]
    LimitTooSmall { limit: u32 },
}

/// Parse a path policy specification string.
///
/// Format: "path:limit:window_secs"
/// Example: "/api/v1/stores:100:60"
pub fn parse_path_policy(spec: &str) -> Result<PathPolicy, PolicyParseError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(PolicyParseError::EmptySpec);
    }

    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(PolicyParseError::InvalidFormat {
            spec: spec.to_string(),
            parts: parts.len(),
        });
    }

    let path = parts[0].trim();
    if !path.starts_with('/') {
        return Err(PolicyParseError::InvalidPathFormat {
            path: path.to_string(),
        });
    }

    let limit: u32 = parts[1]
        .trim()
        .parse()
        .map_err(|e| PolicyParseError::InvalidLimit {
            spec: spec.to_string(),
            value: parts[1].to_string(),
            reason: format!("{}", e),
        })?;

    if limit < 1 {
        return Err(PolicyParseError::LimitTooSmall { limit });
    }

    let window_secs: u64 =
        parts[2]
            .trim()
            .parse()
            .map_err(|e| PolicyParseError::InvalidWindow {
                spec: spec.to_string(),
                value: parts[2].to_string(),
                reason: format!("{}", e),
            })?;

    if window_secs < 1 {
        return Err(PolicyParseError::WindowTooSmall { window_secs });
    }

    Ok(PathPolicy {
        prefix: path.to_string(),
        requests_per_window: limit,
        window_duration: Duration::from_secs(window_secs),
    })
}

/// Parse multiple path policies from a comma-separated string, collecting
/// warnings for entries that fail to parse.
pub fn parse_path_policies(policies_str: &str) -> (Vec<PathPolicy>, Vec<String>) {
    let mut policies = Vec::new();
    let mut warnings = Vec::new();

    for spec in policies_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        match parse_path_policy(spec) {
            Ok(policy) => policies.push(policy),
            Err(e) => warnings.push(format!("Skipping invalid path policy '{}': {}", spec, e)),
        }
    }

    (policies, warnings)
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            RateLimitError::LimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
            RateLimitError::InvalidConfig(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid configuration")
            }
        };

        (status, message).into_response()
    }
}


#[cfg(test)]
mod rate_limiter_tests {
    use super::*;

    #[tokio::test]
    async fn basic_limit_enforcement() {
        let config = RateLimitConfig {
            requests_per_window: 2,
            window_duration: Duration::from_secs(60),
            ..Default::default()
        };

        let limiter = RateLimiter::in_memory(config);

        assert!(limiter.check_rate_limit("test_key").await.unwrap().allowed);
        assert!(limiter.check_rate_limit("test_key").await.unwrap().allowed);
        assert!(!limiter.check_rate_limit("test_key").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn different_keys_have_separate_limits() {
        let config = RateLimitConfig {
            requests_per_window: 1,
            window_duration: Duration::from_secs(60),
            ..Default::default()
        };

        let limiter = RateLimiter::in_memory(config);

        assert!(limiter.check_rate_limit("key1").await.unwrap().allowed);
        assert!(limiter.check_rate_limit("key2").await.unwrap().allowed);
        assert!(!limiter.check_rate_limit("key1").await.unwrap().allowed);
        assert!(!limiter.check_rate_limit("key2").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn quota_decreases_with_requests() {
        let config = RateLimitConfig {
            requests_per_window: 5,
            window_duration: Duration::from_secs(60),
            ..Default::default()
        };

        let limiter = RateLimiter::in_memory(config);

        assert_eq!(limiter.get_remaining_quota("test_key").await, 5);
        assert!(limiter.check_rate_limit("test_key").await.unwrap().allowed);
        assert_eq!(limiter.get_remaining_quota("test_key").await, 4);
    }

    #[tokio::test]
    async fn overrides_share_underlying_store() {
        let base_config = RateLimitConfig {
            requests_per_window: 2,
            window_duration: Duration::from_secs(60),
            ..Default::default()
        };
        let base = RateLimiter::in_memory(base_config.clone());

        let mut override_config = base_config.clone();
        override_config.requests_per_window = 1;
        let override_limiter = base.with_config(override_config);

        let first = base.check_rate_limit("shared-key").await.expect("first");
        assert!(first.allowed, "first request should be allowed");

        let second = override_limiter
            .check_rate_limit("shared-key")
            .await
            .expect("second");
        assert!(
            !second.allowed,
            "override limiter should see the incremented count"
        );
    }
}
