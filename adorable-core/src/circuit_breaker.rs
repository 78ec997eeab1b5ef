//! Circuit breaker whose state lives in the shared [`Cache`].
//!
//! The state survives restarts of a single process, but transitions are
//! plain reads and writes and therefore not atomic across processes.

use crate::{cache::Cache, entities::Timestamp};
use parking_lot::Mutex;
use std::{collections::BTreeSet, fmt, str::FromStr, sync::Arc, time::Duration};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircuitState {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            "half_open" => Ok(Self::HalfOpen),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
    /// How long the single trial slot of the half-open state stays reserved.
    pub half_open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            half_open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum CircuitError<E> {
    #[error("Circuit '{0}' is open")]
    Open(String),
    #[error(transparent)]
    Inner(E),
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: String,
    cache: Arc<dyn Cache>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, cache: Arc<dyn Cache>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            cache,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn key(&self, suffix: &str) -> String {
        format!("circuit_breaker:{}:{suffix}", self.name)
    }

    pub fn state(&self) -> CircuitState {
        self.cache
            .get(&self.key("state"))
            .ok()
            .flatten()
            .and_then(|s| s.parse().ok())
            .unwrap_or(CircuitState::Closed)
    }

    fn set_state(&self, state: CircuitState) {
        if let Err(err) = self.cache.set(&self.key("state"), state.as_str(), None) {
            log::warn!("Unable to store state of circuit '{}': {err}", self.name);
        }
    }

    pub fn failures(&self) -> u32 {
        self.cache
            .get_i64(&self.key("failures"))
            .ok()
            .flatten()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    }

    fn try_reserve_trial(&self) -> bool {
        self.cache
            .set_if_absent(&self.key("trial"), "1", Some(self.config.half_open_timeout))
            .unwrap_or_else(|err| {
                log::warn!("Unable to reserve trial of circuit '{}': {err}", self.name);
                true
            })
    }

    pub fn can_execute(&self) -> bool {
        self.can_execute_at(Timestamp::now())
    }

    pub fn can_execute_at(&self, now: Timestamp) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let last_failure = self
                    .cache
                    .get_i64(&self.key("last_failure"))
                    .ok()
                    .flatten()
                    .map(Timestamp::from_millis);
                let elapsed = last_failure
                    .map(|at| (now - at).whole_milliseconds())
                    .unwrap_or(i128::MAX);
                if elapsed >= self.config.reset_timeout.as_millis() as i128 {
                    log::info!("Circuit '{}' is half-open", self.name);
                    self.set_state(CircuitState::HalfOpen);
                    self.try_reserve_trial()
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => self.try_reserve_trial(),
        }
    }

    fn delete(&self, suffix: &str) {
        if let Err(err) = self.cache.delete(&self.key(suffix)) {
            log::warn!("Unable to clear {suffix} of circuit '{}': {err}", self.name);
        }
    }

    /// Only a successful trial closes an open circuit.
    pub fn record_success(&self) {
        self.delete("failures");
        self.delete("trial");
        if self.state() == CircuitState::HalfOpen {
            log::info!("Circuit '{}' is closed again", self.name);
            self.set_state(CircuitState::Closed);
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Timestamp::now())
    }

    pub fn record_failure_at(&self, now: Timestamp) {
        let failures = self
            .cache
            .incr_by(&self.key("failures"), 1)
            .unwrap_or_else(|err| {
                log::warn!("Unable to count failure of circuit '{}': {err}", self.name);
                0
            });
        if let Err(err) = self
            .cache
            .set(&self.key("last_failure"), &now.as_millis().to_string(), None)
        {
            log::warn!("Unable to store last failure of circuit '{}': {err}", self.name);
        }
        self.delete("trial");
        let state = self.state();
        if state == CircuitState::HalfOpen
            || (state == CircuitState::Closed
                && failures >= i64::from(self.config.failure_threshold))
        {
            log::warn!(
                "Circuit '{}' opened after {failures} failure(s)",
                self.name
            );
            self.set_state(CircuitState::Open);
        }
    }

    /// Runs `f` if the circuit allows it and records the outcome.
    pub fn call<T, E, F>(&self, f: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.can_execute() {
            return Err(CircuitError::Open(self.name.clone()));
        }
        match f() {
            Ok(res) => {
                self.record_success();
                Ok(res)
            }
            Err(err) => {
                self.record_failure();
                Err(CircuitError::Inner(err))
            }
        }
    }

    pub fn reset(&self) {
        for suffix in ["state", "failures", "last_failure", "trial"] {
            self.delete(suffix);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitStatus {
    pub name: String,
    pub state: CircuitState,
    pub failures: u32,
}

/// Creates breakers on demand and remembers their names for reporting.
pub struct CircuitBreakers {
    cache: Arc<dyn Cache>,
    config: CircuitBreakerConfig,
    names: Mutex<BTreeSet<String>>,
}

impl CircuitBreakers {
    pub fn new(cache: Arc<dyn Cache>, config: CircuitBreakerConfig) -> Self {
        Self {
            cache,
            config,
            names: Default::default(),
        }
    }

    pub fn get(&self, name: &str) -> CircuitBreaker {
        self.names.lock().insert(name.to_owned());
        CircuitBreaker::new(name, Arc::clone(&self.cache), self.config)
    }

    pub fn status(&self) -> Vec<CircuitStatus> {
        self.names
            .lock()
            .iter()
            .map(|name| {
                let cb = CircuitBreaker::new(name.as_str(), Arc::clone(&self.cache), self.config);
                CircuitStatus {
                    name: name.clone(),
                    state: cb.state(),
                    failures: cb.failures(),
                }
            })
            .collect()
    }

    pub fn reset_all(&self) {
        for name in self.names.lock().iter() {
            CircuitBreaker::new(name.as_str(), Arc::clone(&self.cache), self.config).reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use time::Duration as TimeDuration;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            Arc::new(InMemoryCache::new()),
            CircuitBreakerConfig {
                failure_threshold: 3,
                reset_timeout: Duration::from_secs(60),
                half_open_timeout: Duration::from_secs(30),
            },
        )
    }

    #[test]
    fn opens_after_threshold() {
        let cb = breaker();
        let t0 = Timestamp::from_secs(1_000);
        cb.record_failure_at(t0);
        cb.record_failure_at(t0);
        assert_eq!(CircuitState::Closed, cb.state());
        assert!(cb.can_execute_at(t0));
        cb.record_failure_at(t0);
        assert_eq!(CircuitState::Open, cb.state());
        assert!(!cb.can_execute_at(t0 + TimeDuration::seconds(59)));
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = breaker();
        let t0 = Timestamp::from_secs(1_000);
        cb.record_failure_at(t0);
        cb.record_failure_at(t0);
        cb.record_success();
        assert_eq!(0, cb.failures());
        cb.record_failure_at(t0);
        cb.record_failure_at(t0);
        assert_eq!(CircuitState::Closed, cb.state());
    }

    #[test]
    fn late_success_does_not_close_open_circuit() {
        let cb = breaker();
        let t0 = Timestamp::from_secs(1_000);
        for _ in 0..3 {
            cb.record_failure_at(t0);
        }
        cb.record_success();
        assert_eq!(CircuitState::Open, cb.state());
        assert_eq!(0, cb.failures());
        assert!(!cb.can_execute_at(t0 + TimeDuration::seconds(1)));
    }

    #[test]
    fn allows_exactly_one_trial_after_reset_timeout() {
        let cb = breaker();
        let t0 = Timestamp::from_secs(1_000);
        for _ in 0..3 {
            cb.record_failure_at(t0);
        }
        let later = t0 + TimeDuration::seconds(60);
        assert!(cb.can_execute_at(later));
        assert_eq!(CircuitState::HalfOpen, cb.state());
        assert!(!cb.can_execute_at(later));
        assert!(!cb.can_execute_at(later + TimeDuration::seconds(1)));
    }

    #[test]
    fn successful_trial_closes() {
        let cb = breaker();
        let t0 = Timestamp::from_secs(1_000);
        for _ in 0..3 {
            cb.record_failure_at(t0);
        }
        assert!(cb.can_execute_at(t0 + TimeDuration::seconds(61)));
        cb.record_success();
        assert_eq!(CircuitState::Closed, cb.state());
        assert_eq!(0, cb.failures());
        assert!(cb.can_execute_at(t0 + TimeDuration::seconds(61)));
    }

    #[test]
    fn failed_trial_reopens() {
        let cb = breaker();
        let t0 = Timestamp::from_secs(1_000);
        for _ in 0..3 {
            cb.record_failure_at(t0);
        }
        let t1 = t0 + TimeDuration::seconds(61);
        assert!(cb.can_execute_at(t1));
        cb.record_failure_at(t1);
        assert_eq!(CircuitState::Open, cb.state());
        assert!(!cb.can_execute_at(t1 + TimeDuration::seconds(30)));
        assert!(cb.can_execute_at(t1 + TimeDuration::seconds(60)));
    }

    #[test]
    fn call_wraps_closure() {
        let cb = breaker();
        assert_eq!(42, cb.call(|| Ok::<_, ()>(42)).unwrap());
        for _ in 0..3 {
            assert!(matches!(cb.call(|| Err::<(), _>("boom")), Err(CircuitError::Inner("boom"))));
        }
        let mut called = false;
        let res = cb.call(|| {
            called = true;
            Ok::<_, ()>(())
        });
        assert!(matches!(res, Err(CircuitError::Open(_))));
        assert!(!called);
    }

    #[test]
    fn registry_reports_and_resets() {
        let breakers = CircuitBreakers::new(
            Arc::new(InMemoryCache::new()),
            CircuitBreakerConfig {
                failure_threshold: 1,
                ..Default::default()
            },
        );
        breakers.get("geocoding").record_failure();
        breakers.get("push");
        let status = breakers.status();
        assert_eq!(2, status.len());
        assert_eq!("geocoding", status[0].name);
        assert_eq!(CircuitState::Open, status[0].state);
        assert_eq!(CircuitState::Closed, status[1].state);
        breakers.reset_all();
        assert!(breakers
            .status()
            .iter()
            .all(|s| s.state == CircuitState::Closed && s.failures == 0));
    }
}
