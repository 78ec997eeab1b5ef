//! Execution of background jobs on a pool of worker threads.

use adorable_core::jobs::Job;
use parking_lot::Mutex;
use std::{
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use super::{dispatch::JobQueue, error::AppError, *};

mod handlers;

pub use self::handlers::JobContext;

/// Default wall-clock limit of a single attempt.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub workers: usize,
    pub time_limit: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

struct QueuedJob {
    job: Job,
    /// Number of failed attempts so far
    failures: u32,
}

/// Hands jobs over to the workers.
#[derive(Clone)]
pub struct JobSender {
    tx: mpsc::Sender<QueuedJob>,
}

impl JobSender {
    fn send(&self, queued: QueuedJob) {
        let name = queued.job.name();
        if self.tx.send(queued).is_err() {
            error!("Job queue has been closed, dropping job {name}");
        }
    }
}

impl JobQueue for JobSender {
    fn enqueue(&self, job: Job) {
        self.send(QueuedJob { job, failures: 0 });
    }
}

pub struct WorkerPool {
    sender: JobSender,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn start(ctx: Arc<JobContext>, config: WorkerConfig) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<QueuedJob>();
        let rx = Arc::new(Mutex::new(rx));
        let sender = JobSender { tx };
        let workers = (0..config.workers.max(1))
            .map(|i| {
                let rx = Arc::clone(&rx);
                let ctx = Arc::clone(&ctx);
                let sender = sender.clone();
                thread::Builder::new()
                    .name(format!("job-worker-{i}"))
                    .spawn(move || loop {
                        // The lock is released before the job runs
                        let next = rx.lock().recv();
                        let Ok(queued) = next else {
                            break;
                        };
                        process(&ctx, &sender, config.time_limit, queued);
                    })
            })
            .collect::<std::io::Result<Vec<_>>>()?;
        info!("Started {} job worker(s)", workers.len());
        Ok(Self { sender, workers })
    }

    pub fn sender(&self) -> JobSender {
        self.sender.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn process(ctx: &Arc<JobContext>, sender: &JobSender, time_limit: Duration, queued: QueuedJob) {
    let QueuedJob { job, failures } = queued;
    let attempts = failures + 1;
    debug!("Running job {} (attempt {attempts})", job.name());
    let run_ctx = Arc::clone(ctx);
    let run_job = job.clone();
    let outcome = run_with_time_limit(time_limit, move || handlers::run(&run_ctx, &run_job));
    match next_step(&job, attempts, outcome) {
        NextStep::Done(result) => record_result(ctx, &result),
        NextStep::Retry(delay) => {
            let sender = sender.clone();
            let spawned = thread::Builder::new()
                .name("job-retry".into())
                .spawn(move || {
                    thread::sleep(delay);
                    sender.send(QueuedJob {
                        job,
                        failures: attempts,
                    });
                });
            if let Err(err) = spawned {
                error!("Failed to schedule retry: {err}");
            }
        }
    }
}

#[derive(Debug)]
enum NextStep {
    Done(JobResult),
    Retry(Duration),
}

fn next_step(job: &Job, attempts: u32, outcome: anyhow::Result<()>) -> NextStep {
    match outcome {
        Ok(()) => {
            info!("Job {} succeeded after {attempts} attempt(s)", job.name());
            NextStep::Done(job.outcome(attempts, None))
        }
        Err(err) => {
            warn!("Job {} failed (attempt {attempts}): {err:#}", job.name());
            match job.retry_policy().next_attempt(attempts) {
                Some(delay) => NextStep::Retry(delay),
                None => {
                    error!(
                        "Giving up job {} [{}] after {attempts} attempt(s): {err:#}",
                        job.name(),
                        job.payload()
                    );
                    NextStep::Done(job.outcome(attempts, Some(format!("{err:#}"))))
                }
            }
        }
    }
}

/// Runs `f` on a separate thread and stops waiting for it after `limit`.
///
/// A thread that exceeds the limit keeps running detached,
/// its result is discarded.
fn run_with_time_limit<F>(limit: Duration, f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("job-attempt".into())
        .spawn(move || {
            let _ = tx.send(f());
        })?;
    match rx.recv_timeout(limit) {
        Ok(res) => res,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            Err(anyhow::anyhow!("Time limit of {limit:?} exceeded"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(anyhow::anyhow!("Job panicked")),
    }
}

fn record_result(ctx: &JobContext, result: &JobResult) {
    let res = ctx
        .connections
        .exclusive()
        .map_err(AppError::from)
        .and_then(|mut conn| {
            conn.transaction(|conn| conn.record_job_result(result))
                .map_err(AppError::from)
        });
    if let Err(err) = res {
        error!("Failed to record result of job {}: {err}", result.job_name);
    }
}

/// Runs a job in the current thread until it succeeds or
/// its retries are exhausted, waiting between the attempts.
pub fn run_to_completion(ctx: &Arc<JobContext>, job: Job, config: WorkerConfig) -> JobResult {
    run_attempts(ctx, job, config.time_limit, thread::sleep)
}

fn run_attempts<W>(ctx: &Arc<JobContext>, job: Job, time_limit: Duration, wait: W) -> JobResult
where
    W: Fn(Duration),
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let run_ctx = Arc::clone(ctx);
        let run_job = job.clone();
        let outcome = run_with_time_limit(time_limit, move || handlers::run(&run_ctx, &run_job));
        match next_step(&job, attempts, outcome) {
            NextStep::Done(result) => {
                record_result(ctx, &result);
                return result;
            }
            NextStep::Retry(delay) => wait(delay),
        }
    }
}
