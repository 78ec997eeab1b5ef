use std::sync::Arc;

use adorable_application::health::HealthChecker;
use adorable_core::{circuit_breaker::CircuitBreakers, monitoring::Metrics};

use super::*;

const DEFAULT_METRICS_HOURS: u32 = 24;
const MAX_METRICS_HOURS: u32 = 7 * 24;

#[get("/health")]
pub fn get_health(_throttle: Throttle, health: &State<HealthChecker>) -> Json<json::HealthReport> {
    Json(to_json::health_report(health.check_all()))
}

#[get("/health/detailed")]
pub fn get_health_detailed(
    _staff: Staff,
    health: &State<HealthChecker>,
    metrics: &State<Arc<Metrics>>,
    breakers: &State<Arc<CircuitBreakers>>,
) -> Json<json::DetailedHealth> {
    let requests = metrics.request_summary(DEFAULT_METRICS_HOURS, Timestamp::now());
    Json(json::DetailedHealth {
        health: to_json::health_report(health.check_all()),
        requests: to_json::request_metrics(requests),
        circuit_breakers: breakers
            .status()
            .into_iter()
            .map(to_json::circuit_breaker_status)
            .collect(),
    })
}

#[get("/health/service/<name>")]
pub fn get_service_health(
    _staff: Staff,
    health: &State<HealthChecker>,
    name: &str,
) -> Result<json::ServiceHealth> {
    let service = health
        .check_service(name)
        .ok_or_else(|| ApiError::not_found(format!("Unknown service: {name}")))?;
    Ok(Json(to_json::single_service_health(service)))
}

#[get("/metrics/requests?<hours>")]
pub fn get_request_metrics(
    _staff: Staff,
    metrics: &State<Arc<Metrics>>,
    hours: Option<u32>,
) -> Result<json::RequestMetrics> {
    let hours = match hours {
        None => DEFAULT_METRICS_HOURS,
        Some(0) => return Err(usecases::Error::InvalidLimit.into()),
        Some(hours) => hours.min(MAX_METRICS_HOURS),
    };
    let summary = metrics.request_summary(hours, Timestamp::now());
    Ok(Json(to_json::request_metrics(summary)))
}

#[get("/metrics/circuit-breakers")]
pub fn get_circuit_breakers(
    _staff: Staff,
    breakers: &State<Arc<CircuitBreakers>>,
) -> Json<Vec<json::CircuitBreakerStatus>> {
    Json(
        breakers
            .status()
            .into_iter()
            .map(to_json::circuit_breaker_status)
            .collect(),
    )
}
