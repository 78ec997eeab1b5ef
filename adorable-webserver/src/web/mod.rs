use std::sync::Arc;

use crate::core::{db::PlaceIndexer, prelude::*, usecases};

use adorable_application::{health::HealthChecker, prelude::EventDispatcher};
use adorable_core::{
    cache::Cache,
    circuit_breaker::CircuitBreakers,
    gateways::{identity::IdentityProvider, notify::NotificationGateway, storage::FileStorage},
    monitoring::Metrics,
    rate_limit::RateLimiters,
    security::ApiKeyStore,
};

use rocket::{config::Config as RocketCfg, Catcher, Rocket, Route};

pub mod api;
mod guards;
pub mod jwt;
mod metrics;
mod sqlite;

#[cfg(test)]
pub mod tests;

#[derive(Debug, Clone)]
pub struct Cfg {
    /// A random secret is generated if missing.
    pub jwt_secret: Option<String>,
    /// The link in the registration e-mail, the token is appended as query.
    pub confirm_email_url: String,
    pub enable_cors: bool,
}

/// The explicitly constructed services that are shared by all requests.
pub struct Services {
    pub connections: adorable_db_sqlite::Connections,
    pub dispatcher: EventDispatcher,
    pub cache: Arc<dyn Cache>,
    pub rate_limiters: RateLimiters,
    pub breakers: Arc<CircuitBreakers>,
    pub index: Arc<dyn PlaceIndexer + Send + Sync>,
}

pub struct Gateways {
    pub notify: Arc<dyn NotificationGateway + Send + Sync>,
    pub storage: Arc<dyn FileStorage + Send + Sync>,
    pub identity: Option<Arc<dyn IdentityProvider + Send + Sync>>,
}

fn index_all_places<D: PlaceRepo>(db: &D, indexer: &dyn PlaceIndexer) -> Result<usize> {
    // TODO: Load the places in chunks instead of all at once.
    let places = db.all_places()?;
    let count = places.len();
    for place in places {
        if let Err(err) = indexer.add_or_update_place(&place) {
            error!("Failed to index place {}: {}", place.id, err);
        }
    }
    if let Err(err) = indexer.flush_index() {
        error!("Failed to build place index: {}", err);
    }
    Ok(count)
}

fn initialize(connections: &sqlite::Connections, index: &dyn PlaceIndexer) {
    info!("Indexing all places...");
    match connections
        .shared()
        .map_err(AppError::from)
        .and_then(|db| index_all_places(&db, index))
    {
        Ok(count) => info!("Indexed {count} place(s)"),
        Err(err) => error!("Unable to index places: {err}"),
    }

    info!("Deleting expired user e-mail tokens...");
    match connections
        .transaction(|db| usecases::delete_expired_user_tokens(db, Timestamp::now()))
    {
        Ok(count) => debug!("Deleted {count} expired token(s)"),
        Err(err) => warn!("Unable to delete expired tokens: {err}"),
    }
}

pub(crate) struct InstanceOptions {
    mounts: Vec<(&'static str, Vec<Route>)>,
    catchers: Vec<Catcher>,
    rocket_cfg: Option<RocketCfg>,
    cfg: Cfg,
}

pub(crate) fn rocket_instance(
    options: InstanceOptions,
    services: Services,
    gateways: Gateways,
) -> Rocket<rocket::Build> {
    let InstanceOptions {
        mounts,
        catchers,
        rocket_cfg,
        cfg,
    } = options;
    let Services {
        connections,
        dispatcher,
        cache,
        rate_limiters,
        breakers,
        index,
    } = services;
    let Gateways {
        notify,
        storage,
        identity,
    } = gateways;

    let connections = sqlite::Connections::from(connections);
    initialize(&connections, &*index);

    let jwt_state = jwt::JwtState::new(cfg.jwt_secret.as_deref());
    let api_keys = ApiKeyStore::new(Arc::clone(&cache));
    let metrics = Arc::new(Metrics::new(Arc::clone(&cache)));
    let health = HealthChecker::new(
        (*connections).clone(),
        Arc::clone(&cache),
        Arc::clone(&breakers),
    );

    info!("Initialization finished");

    let r = match rocket_cfg {
        Some(cfg) => rocket::custom(cfg),
        None => rocket::build(),
    };

    let mut instance = r
        .manage(connections)
        .manage(dispatcher)
        .manage(jwt_state)
        .manage(rate_limiters)
        .manage(breakers)
        .manage(api_keys)
        .manage(Arc::clone(&metrics))
        .manage(health)
        .manage(guards::SearchIndex(index))
        .manage(guards::Storage(storage))
        .manage(guards::Notify(notify))
        .manage(guards::Identity(identity))
        .manage(cfg)
        .attach(metrics::RequestMetrics(metrics));

    for (m, r) in mounts {
        instance = instance.mount(m, r);
    }
    instance.register("/", catchers)
}

fn mounts() -> Vec<(&'static str, Vec<Route>)> {
    vec![("/api", api::routes())]
}

pub async fn run(services: Services, gateways: Gateways, cfg: Cfg) {
    let enable_cors = cfg.enable_cors;
    let options = InstanceOptions {
        mounts: mounts(),
        catchers: api::catchers(),
        rocket_cfg: None,
        cfg,
    };
    let instance = rocket_instance(options, services, gateways);
    let server_task = if enable_cors {
        match rocket_cors::CorsOptions::default().to_cors() {
            Ok(cors) => instance.attach(cors).launch(),
            Err(err) => {
                error!("Invalid CORS configuration: {err}");
                return;
            }
        }
    } else {
        instance.launch()
    };
    if let Err(err) = server_task.await {
        error!("Unable to run web server: {err}");
    }
}
