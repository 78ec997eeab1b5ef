//! Health of the database, the cache and the external services.

use adorable_core::{
    cache::Cache,
    circuit_breaker::{CircuitBreakers, CircuitState},
};
use std::{sync::Arc, time::Instant};

use super::*;

/// Services that are guarded by a circuit breaker.
pub const GUARDED_SERVICES: [&str; 2] = ["geocoding", "push"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Healthy,
    /// Temporarily rejected by its circuit breaker.
    Unavailable,
    Error,
}

impl ServiceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Unavailable => "unavailable",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceHealth {
    pub name: String,
    pub status: ServiceStatus,
    pub error: Option<String>,
    pub response_time_ms: u64,
    /// Additional key figures, e.g. row counts or breaker failures.
    pub details: Payload,
    pub checked_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

impl OverallStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub services: Vec<ServiceHealth>,
    pub checked_at: Timestamp,
}

pub struct HealthChecker {
    connections: sqlite::Connections,
    cache: Arc<dyn Cache>,
    breakers: Arc<CircuitBreakers>,
}

impl HealthChecker {
    pub fn new(
        connections: sqlite::Connections,
        cache: Arc<dyn Cache>,
        breakers: Arc<CircuitBreakers>,
    ) -> Self {
        Self {
            connections,
            cache,
            breakers,
        }
    }

    pub fn service_names() -> impl Iterator<Item = &'static str> {
        ["database", "cache"].into_iter().chain(GUARDED_SERVICES)
    }

    pub fn check_all(&self) -> HealthReport {
        let services: Vec<_> = Self::service_names()
            .filter_map(|name| self.check_service(name))
            .collect();
        let status = if services.iter().all(|s| s.status == ServiceStatus::Healthy) {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        };
        HealthReport {
            status,
            services,
            checked_at: Timestamp::now(),
        }
    }

    /// `None` if the service is unknown.
    pub fn check_service(&self, name: &str) -> Option<ServiceHealth> {
        let started = Instant::now();
        let result = match name {
            "database" => self.check_database(),
            "cache" => self
                .cache
                .ping()
                .map(|()| Payload::new())
                .map_err(|err| err.to_string()),
            name if GUARDED_SERVICES.contains(&name) => return Some(self.check_breaker(name)),
            _ => return None,
        };
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (status, error, details) = match result {
            Ok(details) => (ServiceStatus::Healthy, None, details),
            Err(err) => {
                warn!("Health check of {name} failed: {err}");
                (ServiceStatus::Error, Some(err), Payload::new())
            }
        };
        Some(ServiceHealth {
            name: name.to_owned(),
            status,
            error,
            response_time_ms,
            details,
            checked_at: Timestamp::now(),
        })
    }

    fn check_database(&self) -> std::result::Result<Payload, String> {
        let db = self.connections.shared().map_err(|err| err.to_string())?;
        let users = db.count_users().map_err(|err| err.to_string())?;
        let places = db.count_places().map_err(|err| err.to_string())?;
        Ok([
            ("users".to_owned(), users.to_string()),
            ("places".to_owned(), places.to_string()),
        ]
        .into_iter()
        .collect())
    }

    fn check_breaker(&self, name: &str) -> ServiceHealth {
        let breaker = self.breakers.get(name);
        let state = breaker.state();
        let status = match state {
            CircuitState::Open => ServiceStatus::Unavailable,
            CircuitState::Closed | CircuitState::HalfOpen => ServiceStatus::Healthy,
        };
        let details = [
            ("circuit".to_owned(), state.to_string()),
            ("failures".to_owned(), breaker.failures().to_string()),
        ]
        .into_iter()
        .collect();
        ServiceHealth {
            name: name.to_owned(),
            status,
            error: (status != ServiceStatus::Healthy).then(|| format!("Circuit is {state}")),
            response_time_ms: 0,
            details,
            checked_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::prelude::*;
    use super::*;
    use adorable_core::{cache::InMemoryCache, circuit_breaker::CircuitBreakerConfig};

    fn checker(fixture: &BackendFixture) -> (HealthChecker, Arc<CircuitBreakers>) {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::default());
        let breakers = Arc::new(CircuitBreakers::new(
            cache.clone(),
            CircuitBreakerConfig {
                failure_threshold: 2,
                ..Default::default()
            },
        ));
        (
            HealthChecker::new(fixture.db_connections.clone(), cache, breakers.clone()),
            breakers,
        )
    }

    #[test]
    fn all_services_healthy() {
        let fixture = BackendFixture::new();
        fixture.create_user("alice", "alice@example.com", "secret123");
        let (checker, _) = checker(&fixture);
        let report = checker.check_all();
        assert_eq!(OverallStatus::Healthy, report.status);
        let names: Vec<_> = report.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(vec!["database", "cache", "geocoding", "push"], names);
        assert_eq!(Some("1"), report.services[0].details.get("users").map(String::as_str));
    }

    #[test]
    fn open_circuit_degrades() {
        let fixture = BackendFixture::new();
        let (checker, breakers) = checker(&fixture);
        let push = breakers.get("push");
        push.record_failure();
        push.record_failure();

        let health = checker.check_service("push").unwrap();
        assert_eq!(ServiceStatus::Unavailable, health.status);
        assert_eq!(Some("open"), health.details.get("circuit").map(String::as_str));
        assert_eq!(OverallStatus::Degraded, checker.check_all().status);

        breakers.reset_all();
        assert_eq!(OverallStatus::Healthy, checker.check_all().status);
    }

    #[test]
    fn unknown_service() {
        let fixture = BackendFixture::new();
        let (checker, _) = checker(&fixture);
        assert!(checker.check_service("mapbox").is_none());
    }
}
