//! Rate limiting middleware
//!
//! Per-client token buckets. The auth surface is reachable without
//! credentials, so buckets key on the client IP reported by the reverse
//! proxy headers.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::{sync::Arc, time::Instant};

use crate::error::ApiError;

/// Token bucket for rate limiting
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, tokens_per_second: f64, max_tokens: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * tokens_per_second).min(max_tokens);
        self.last_update = now;

        // Try to consume a token
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rate limiter state
///
/// Buckets live in a sharded map, so checks for distinct clients never
/// contend. An entry's shard lock covers the refill-and-consume step.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, TokenBucket>>,
    tokens_per_second: f64,
    max_tokens: f64,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            tokens_per_second: requests_per_second as f64,
            max_tokens: (requests_per_second * 2) as f64, // Allow burst of 2x
        }
    }

    /// Check if a request from this client is allowed
    pub fn check(&self, key: &str) -> bool {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.max_tokens));

        bucket.try_consume(self.tokens_per_second, self.max_tokens)
    }

    /// Drop buckets idle for longer than `max_age`. Runs on the same cadence
    /// as the store sweeps: snapshot the idle keys, then re-check each under
    /// its shard lock so a just-refreshed bucket survives.
    pub fn prune_idle(&self, max_age: std::time::Duration) -> usize {
        let now = Instant::now();
        let idle: Vec<String> = self
            .buckets
            .iter()
            .filter(|entry| now.duration_since(entry.last_update) >= max_age)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in idle {
            if self
                .buckets
                .remove_if(&key, |_, bucket| {
                    now.duration_since(bucket.last_update) >= max_age
                })
                .is_some()
            {
                removed += 1;
            }
        }

        removed
    }
}

/// Create rate limiting middleware layer
pub fn rate_limit_layer(
    rate_limiter: RateLimiter,
) -> impl Fn(
    Request<Body>,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone
       + Send {
    move |request: Request<Body>, next: Next| {
        let rate_limiter = rate_limiter.clone();
        Box::pin(async move {
            let client_key = client_ip(request.headers());

            if !rate_limiter.check(&client_key) {
                tracing::warn!(client = %client_key, "Rate limit exceeded");
                let mut response = ApiError::TooManyRequests.into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
                return response;
            }

            next.run(request).await
        })
    }
}

/// Client IP as reported by the reverse proxy
pub fn client_ip(headers: &HeaderMap) -> String {
    // Try X-Forwarded-For first
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(s) = forwarded.to_str() {
            if let Some(ip) = s.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    // Try X-Real-IP
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(s) = real_ip.to_str() {
            return s.to_string();
        }
    }

    // Fallback to a default
    "unknown".to_string()
}
