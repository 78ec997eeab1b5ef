use adorable_core::{gateways::realtime::RealtimeGateway, jobs::Job};
use std::sync::Arc;

use super::*;

/// Accepts jobs for asynchronous execution.
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: Job);
}

/// Performs the side effects of committed writes.
#[derive(Clone)]
pub struct EventDispatcher {
    realtime: Option<Arc<dyn RealtimeGateway + Send + Sync>>,
    jobs: Arc<dyn JobQueue>,
}

impl EventDispatcher {
    pub fn new(
        realtime: Option<Arc<dyn RealtimeGateway + Send + Sync>>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self { realtime, jobs }
    }

    /// Must only be called after the transaction that
    /// produced the events has been committed.
    pub fn dispatch(&self, events: Vec<Event>) {
        for event in events {
            if let Some(realtime) = &self.realtime {
                for mirror in event.realtime_mirrors() {
                    if let Err(err) = realtime.set(&mirror.path, &mirror.value) {
                        warn!("Failed to mirror record '{}': {err}", mirror.path);
                    }
                }
            }
            if let Some(job) = event.job() {
                debug!("Enqueueing job {}", job.name());
                self.jobs.enqueue(job);
            }
        }
    }
}
