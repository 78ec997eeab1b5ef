//! Hourly request and event counters kept in the shared cache.

use crate::{cache::Cache, entities::Timestamp};
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use time::{macros::format_description, Duration as TimeDuration};

const PREFIX: &str = "metrics";

/// Counters are kept for one day.
const RETENTION: Duration = Duration::from_secs(25 * 3600);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSummary {
    pub period_hours: u32,
    pub total_requests: u64,
    pub average_duration_ms: f64,
    /// Keyed by status class, e.g. `"2xx"`.
    pub status_classes: BTreeMap<String, u64>,
}

#[derive(Clone)]
pub struct Metrics {
    cache: Arc<dyn Cache>,
}

fn hour_bucket(at: Timestamp) -> String {
    at.into_inner()
        .format(format_description!("[year][month][day][hour]"))
        .unwrap_or_default()
}

fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

const STATUS_CLASSES: [&str; 5] = ["1xx", "2xx", "3xx", "4xx", "5xx"];

impl Metrics {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    fn incr(&self, key: &str, delta: i64) {
        match self.cache.incr_by(key, delta) {
            Ok(n) if n == delta => {
                if let Err(err) = self.cache.expire(key, RETENTION) {
                    log::warn!("Unable to set expiry of metric {key}: {err}");
                }
            }
            Ok(_) => {}
            Err(err) => {
                log::warn!("Unable to record metric {key}: {err}");
            }
        }
    }

    fn get(&self, key: &str) -> u64 {
        self.cache
            .get_i64(key)
            .ok()
            .flatten()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0)
    }

    pub fn record_request(&self, status: u16, duration: Duration) {
        self.record_request_at(Timestamp::now(), status, duration)
    }

    pub fn record_request_at(&self, at: Timestamp, status: u16, duration: Duration) {
        let bucket = hour_bucket(at);
        self.incr(&format!("{PREFIX}:request:{bucket}:count"), 1);
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        if millis > 0 {
            self.incr(&format!("{PREFIX}:request:{bucket}:duration_ms"), millis);
        }
        self.incr(
            &format!("{PREFIX}:request:{bucket}:status:{}", status_class(status)),
            1,
        );
    }

    /// Aggregates the last `hours` hourly buckets including the current one.
    pub fn request_summary(&self, hours: u32, now: Timestamp) -> RequestSummary {
        let mut summary = RequestSummary {
            period_hours: hours,
            ..Default::default()
        };
        let mut total_duration = 0;
        for i in 0..hours {
            let bucket = hour_bucket(now - TimeDuration::hours(i64::from(i)));
            summary.total_requests += self.get(&format!("{PREFIX}:request:{bucket}:count"));
            total_duration += self.get(&format!("{PREFIX}:request:{bucket}:duration_ms"));
            for class in STATUS_CLASSES {
                let n = self.get(&format!("{PREFIX}:request:{bucket}:status:{class}"));
                if n > 0 {
                    *summary.status_classes.entry(class.to_owned()).or_default() += n;
                }
            }
        }
        if summary.total_requests > 0 {
            summary.average_duration_ms = total_duration as f64 / summary.total_requests as f64;
        }
        summary
    }

    /// Counts a named event, e.g. `job.failed`.
    pub fn record_event(&self, name: &str) {
        let bucket = hour_bucket(Timestamp::now());
        self.incr(&format!("{PREFIX}:{name}:{bucket}"), 1);
    }

    pub fn event_count(&self, name: &str, hours: u32, now: Timestamp) -> u64 {
        (0..hours)
            .map(|i| hour_bucket(now - TimeDuration::hours(i64::from(i))))
            .map(|bucket| self.get(&format!("{PREFIX}:{name}:{bucket}")))
            .sum()
    }
}
