//! Fixed-window rate limiting on top of a shared [`Cache`].

use crate::cache::Cache;
use std::{sync::Arc, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    /// Name of the limiter, part of the cache key.
    pub key: String,
    pub scope: String,
    /// Max. number of requests per window.
    pub limit: u32,
    /// Window length, also used as TTL of the counter.
    pub period: Duration,
}

impl RateLimit {
    pub fn api_default() -> Self {
        Self {
            key: "api_default".into(),
            scope: "api".into(),
            limit: 1000,
            period: Duration::from_secs(3600),
        }
    }

    pub fn auth_attempts() -> Self {
        Self {
            key: "auth_attempts".into(),
            scope: "auth".into(),
            limit: 5,
            period: Duration::from_secs(300),
        }
    }

    pub fn ip_default() -> Self {
        Self {
            key: "ip_default".into(),
            scope: "ip".into(),
            limit: 10_000,
            period: Duration::from_secs(86_400),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Denied { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    config: RateLimit,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn Cache>, config: RateLimit) -> Self {
        Self { cache, config }
    }

    pub fn config(&self) -> &RateLimit {
        &self.config
    }

    fn cache_key(&self, identifier: &str) -> String {
        let RateLimit { scope, key, .. } = &self.config;
        format!("rate_limit:{scope}:{key}:{identifier}")
    }

    /// Counts the request and decides whether it may pass.
    ///
    /// Cache failures never block a request.
    pub fn check(&self, identifier: &str) -> Decision {
        let key = self.cache_key(identifier);
        match self.try_check(&key) {
            Ok(decision) => decision,
            Err(err) => {
                log::warn!("Rate limiter '{}' unavailable: {err}", self.config.key);
                Decision::Allowed {
                    remaining: self.config.limit,
                }
            }
        }
    }

    fn try_check(&self, key: &str) -> crate::cache::Result<Decision> {
        let RateLimit { limit, period, .. } = self.config;
        let count = self.cache.get_i64(key)?.unwrap_or(0);
        if count >= i64::from(limit) {
            let retry_after = self.cache.ttl(key)?.unwrap_or(period);
            log::debug!("Rate limit exceeded for {key}");
            return Ok(Decision::Denied { retry_after });
        }
        let count = self.cache.incr_by(key, 1)?;
        if count == 1 {
            self.cache.expire(key, period)?;
        }
        let remaining = i64::from(limit).saturating_sub(count).max(0);
        Ok(Decision::Allowed {
            remaining: u32::try_from(remaining).unwrap_or(0),
        })
    }

    /// Requests left in the current window without counting one.
    pub fn remaining(&self, identifier: &str) -> u32 {
        let key = self.cache_key(identifier);
        let count = self.cache.get_i64(&key).ok().flatten().unwrap_or(0);
        u32::try_from(i64::from(self.config.limit).saturating_sub(count).max(0)).unwrap_or(0)
    }

    pub fn reset(&self, identifier: &str) {
        if let Err(err) = self.cache.delete(&self.cache_key(identifier)) {
            log::warn!("Could not reset rate limit: {err}");
        }
    }
}

/// The limiters applied by the web API.
#[derive(Clone)]
pub struct RateLimiters {
    pub api: RateLimiter,
    pub auth: RateLimiter,
    pub ip: RateLimiter,
}

impl RateLimiters {
    pub fn new(cache: Arc<dyn Cache>, api: RateLimit, auth: RateLimit, ip: RateLimit) -> Self {
        Self {
            api: RateLimiter::new(Arc::clone(&cache), api),
            auth: RateLimiter::new(Arc::clone(&cache), auth),
            ip: RateLimiter::new(cache, ip),
        }
    }

    pub fn with_defaults(cache: Arc<dyn Cache>) -> Self {
        Self::new(
            cache,
            RateLimit::api_default(),
            RateLimit::auth_attempts(),
            RateLimit::ip_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use std::thread;

    fn limiter(limit: u32, period: Duration) -> RateLimiter {
        RateLimiter::new(
            Arc::new(InMemoryCache::new()),
            RateLimit {
                key: "test".into(),
                scope: "unit".into(),
                limit,
                period,
            },
        )
    }

    #[test]
    fn deny_request_after_limit() {
        let limiter = limiter(3, Duration::from_secs(60));
        assert_eq!(Decision::Allowed { remaining: 2 }, limiter.check("alice"));
        assert_eq!(Decision::Allowed { remaining: 1 }, limiter.check("alice"));
        assert_eq!(Decision::Allowed { remaining: 0 }, limiter.check("alice"));
        match limiter.check("alice") {
            Decision::Denied { retry_after } => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::from_secs(55));
            }
            other => panic!("unexpected decision: {other:?}"),
        }
        // other identifiers are counted separately
        assert!(limiter.check("bob").is_allowed());
    }

    #[test]
    fn counter_resets_after_window() {
        let limiter = limiter(1, Duration::from_millis(50));
        assert!(limiter.check("alice").is_allowed());
        assert!(!limiter.check("alice").is_allowed());
        thread::sleep(Duration::from_millis(80));
        assert!(limiter.check("alice").is_allowed());
    }

    #[test]
    fn reset_clears_counter() {
        let limiter = limiter(1, Duration::from_secs(60));
        assert!(limiter.check("alice").is_allowed());
        assert_eq!(0, limiter.remaining("alice"));
        limiter.reset("alice");
        assert_eq!(1, limiter.remaining("alice"));
        assert!(limiter.check("alice").is_allowed());
    }

    #[test]
    fn default_limits() {
        assert_eq!(5, RateLimit::auth_attempts().limit);
        assert_eq!(Duration::from_secs(300), RateLimit::auth_attempts().period);
        assert_eq!(1000, RateLimit::api_default().limit);
        assert_eq!("ip", RateLimit::ip_default().scope);
    }
}
