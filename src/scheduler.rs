use std::{sync::Arc, time::Duration};

use adorable_application::prelude::JobQueue;
use adorable_core::jobs::Job;

use crate::config;

/// Periodically enqueues the jobs that need no trigger.
pub async fn run(queue: Arc<dyn JobQueue>, cfg: &config::Jobs) {
    let schedule = [
        (Job::CleanupExpiredTokens, cfg.cleanup_interval),
        (Job::UpdatePlaceRankings, cfg.rankings_interval),
        (Job::SendNotificationDigests, cfg.digest_interval),
        (Job::CalculatePlaceStatistics, cfg.statistics_interval),
    ];
    let tasks: Vec<_> = schedule
        .into_iter()
        .map(|(job, period)| tokio::spawn(enqueue_periodically(Arc::clone(&queue), job, period)))
        .collect();
    for task in tasks {
        if let Err(err) = task.await {
            log::error!("Job scheduler stopped: {err}");
        }
    }
}

async fn enqueue_periodically(queue: Arc<dyn JobQueue>, job: Job, period: Duration) {
    log::info!("Scheduling job {} every {period:?}", job.name());
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        log::debug!("Enqueueing scheduled job {}", job.name());
        queue.enqueue(job.clone());
    }
}
