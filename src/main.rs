use std::{path::PathBuf, sync::Arc};

use adorable_application::{
    jobs::{self, JobContext, WorkerConfig, WorkerPool},
    prelude::{EventDispatcher, JobQueue},
    sqlite::{run_embedded_database_migrations, Connections},
};
use adorable_core::{
    circuit_breaker::CircuitBreakers,
    db::PlaceIndexer,
    entities::JobStatus,
    jobs::Job,
    rate_limit::RateLimiters,
    util::place_index::InMemoryPlaceIndex,
};
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};

mod config;
mod gateways;
mod scheduler;

use self::config::Config;

#[derive(Parser)]
#[command(version, about = "Backend of the Adorable place discovery app")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server together with the job workers (default)
    Serve,
    /// Run a scheduled job once, e.g. `update_place_rankings`
    RunJob { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let cfg = Config::try_load_from_file_or_default(args.config.as_deref())?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::RunJob { name } => run_job(cfg, name).await,
    }
}

fn connect_db(cfg: &config::Db) -> Result<Connections> {
    log::info!(
        "Connecting to SQLite database '{}' (pool size = {})",
        cfg.conn_sqlite,
        cfg.conn_pool_size
    );
    let connections = Connections::init(&cfg.conn_sqlite, cfg.conn_pool_size.into())?;
    run_embedded_database_migrations(connections.exclusive()?)?;
    Ok(connections)
}

fn job_context(
    cfg: &Config,
    connections: Connections,
    index: Arc<dyn PlaceIndexer + Send + Sync>,
    breakers: &CircuitBreakers,
) -> Result<JobContext> {
    Ok(JobContext {
        connections,
        index,
        geocoder: gateways::geocoding_gateway(cfg.geocoding.gateway.as_ref(), breakers),
        push: gateways::push_gateway(&cfg.firebase, breakers),
        storage: gateways::file_storage(&cfg.storage)?,
        images: gateways::image_processor(&cfg.storage),
    })
}

async fn serve(cfg: Config) -> Result<()> {
    let connections = connect_db(&cfg.db)?;
    let cache = gateways::cache(&cfg.cache)?;
    let breakers = Arc::new(CircuitBreakers::new(
        Arc::clone(&cache),
        cfg.circuit_breaker,
    ));
    let index: Arc<dyn PlaceIndexer + Send + Sync> = Arc::new(InMemoryPlaceIndex::new());

    let ctx = job_context(&cfg, connections.clone(), Arc::clone(&index), &breakers)?;
    let storage = Arc::clone(&ctx.storage);
    let pool = WorkerPool::start(
        Arc::new(ctx),
        WorkerConfig {
            workers: cfg.jobs.workers,
            time_limit: cfg.jobs.time_limit,
        },
    )?;
    let queue: Arc<dyn JobQueue> = Arc::new(pool.sender());

    let notify = gateways::notification_gateway(
        cfg.email.gateway.clone(),
        &cfg.webserver.reset_password_url,
    )?;
    let config::RateLimits { api, auth, ip } = cfg.rate_limits;
    let services = adorable_webserver::Services {
        connections,
        dispatcher: EventDispatcher::new(
            gateways::realtime_gateway(&cfg.firebase),
            Arc::clone(&queue),
        ),
        rate_limiters: RateLimiters::new(Arc::clone(&cache), api, auth, ip),
        cache,
        breakers,
        index,
    };
    let web_gateways = adorable_webserver::Gateways {
        notify: Arc::new(notify),
        storage,
        identity: gateways::identity_provider(&cfg.auth),
    };
    let web_cfg = adorable_webserver::Cfg {
        jwt_secret: cfg.auth.jwt_secret,
        confirm_email_url: cfg.webserver.confirm_email_url,
        enable_cors: cfg.webserver.enable_cors,
    };

    let jobs_cfg = cfg.jobs;
    tokio::spawn(async move { scheduler::run(queue, &jobs_cfg).await });

    adorable_webserver::run(services, web_gateways, web_cfg).await;
    log::info!(
        "Web server stopped, shutting down {} job worker(s)",
        pool.worker_count()
    );
    Ok(())
}

async fn run_job(cfg: Config, name: String) -> Result<()> {
    let Some(job) = Job::scheduled_by_name(&name) else {
        bail!("Unknown job: {name}");
    };
    let connections = connect_db(&cfg.db)?;
    let cache = gateways::cache(&cfg.cache)?;
    let breakers = CircuitBreakers::new(cache, cfg.circuit_breaker);
    let index = Arc::new(InMemoryPlaceIndex::new());
    let ctx = Arc::new(job_context(&cfg, connections, index, &breakers)?);
    let worker_cfg = WorkerConfig {
        workers: 1,
        time_limit: cfg.jobs.time_limit,
    };
    let result =
        tokio::task::spawn_blocking(move || jobs::run_to_completion(&ctx, job, worker_cfg))
            .await?;
    match result.status {
        JobStatus::Succeeded => {
            log::info!(
                "Job {} succeeded after {} attempt(s)",
                result.job_name,
                result.attempts
            );
            Ok(())
        }
        JobStatus::Failed => Err(anyhow!(
            "Job {} failed after {} attempt(s): {}",
            result.job_name,
            result.attempts,
            result.last_error.unwrap_or_default()
        )),
    }
}
