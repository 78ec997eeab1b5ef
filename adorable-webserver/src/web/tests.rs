use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use rocket::{config::Config as RocketCfg, http::ContentType, local::blocking::Client, Route};

use crate::{
    adapters::json,
    core::{prelude::*, usecases},
    web::{sqlite, Cfg, Gateways, InstanceOptions, Services},
};
use adorable_application::{
    jobs::{self, JobContext, WorkerConfig},
    prelude::{EventDispatcher, JobQueue},
};
use adorable_core::{
    cache::{Cache, InMemoryCache},
    circuit_breaker::{CircuitBreakerConfig, CircuitBreakers},
    gateways::{image::ImageProcessor, notify::NotificationGateway, storage::FileStorage},
    jobs::Job,
    rate_limit::{RateLimit, RateLimiters},
    util::place_index::InMemoryPlaceIndex,
};

pub mod prelude {
    pub use rocket::{
        http::{ContentType, Header, Status},
        local::blocking::{Client, LocalResponse},
    };

    pub use super::RecordingNotify;
    pub use crate::core::db::*;
}

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const CONFIRM_EMAIL_URL: &str = "https://adorable.example.com/confirm-email";

/// Max. number of login, registration and reset requests per test.
pub const AUTH_LIMIT: u32 = 20;

#[derive(Default)]
pub struct RecordingNotify {
    confirmation_urls: Mutex<Vec<String>>,
    reset_nonces: Mutex<Vec<EmailNonce>>,
}

impl RecordingNotify {
    pub fn last_confirmation_url(&self) -> Option<String> {
        self.confirmation_urls.lock().last().cloned()
    }
    pub fn last_reset_nonce(&self) -> Option<EmailNonce> {
        self.reset_nonces.lock().last().cloned()
    }
}

impl NotificationGateway for RecordingNotify {
    fn user_registered(&self, _: &User, confirm_email_url: &str) {
        self.confirmation_urls
            .lock()
            .push(confirm_email_url.to_owned());
    }
    fn user_reset_password_requested(&self, email_nonce: &EmailNonce) {
        self.reset_nonces.lock().push(email_nonce.clone());
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl FileStorage for MemoryStorage {
    fn store(&self, path: &str, content: &[u8]) -> anyhow::Result<()> {
        self.files.lock().insert(path.to_owned(), content.to_vec());
        Ok(())
    }
    fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No such file: {path}"))
    }
    fn remove(&self, path: &str) -> anyhow::Result<()> {
        self.files.lock().remove(path);
        Ok(())
    }
    fn local_path(&self, _: &str) -> Option<PathBuf> {
        None
    }
    fn url(&self, path: &str) -> String {
        format!("https://files.example.com/{path}")
    }
}

struct NoImages;

impl ImageProcessor for NoImages {
    fn thumbnail(&self, _: &Path, _: &Path, _: u32, _: u32) -> anyhow::Result<()> {
        anyhow::bail!("Image processing is not available in tests")
    }
}

/// Keeps the search index up to date immediately and
/// only records all other jobs.
pub struct IndexingQueue {
    ctx: Arc<JobContext>,
    recorded: Mutex<Vec<Job>>,
}

impl IndexingQueue {
    pub fn recorded(&self) -> Vec<Job> {
        self.recorded.lock().clone()
    }
}

impl JobQueue for IndexingQueue {
    fn enqueue(&self, job: Job) {
        match job {
            Job::UpdateSearchIndex { .. } => {
                jobs::run_to_completion(&self.ctx, job, WorkerConfig::default());
            }
            job => self.recorded.lock().push(job),
        }
    }
}

pub struct TestSetup {
    pub client: Client,
    pub db: sqlite::Connections,
    pub notify: Arc<RecordingNotify>,
    pub queue: Arc<IndexingQueue>,
}

fn test_cfg() -> Cfg {
    Cfg {
        jwt_secret: Some(TEST_JWT_SECRET.to_owned()),
        confirm_email_url: CONFIRM_EMAIL_URL.to_owned(),
        enable_cors: false,
    }
}

fn rocket_test_instance(
    mounts: Vec<(&'static str, Vec<Route>)>,
    rocket_cfg: RocketCfg,
) -> (
    rocket::Rocket<rocket::Build>,
    sqlite::Connections,
    Arc<RecordingNotify>,
    Arc<IndexingQueue>,
) {
    let _ = env_logger::builder().is_test(true).try_init();
    let connections = adorable_db_sqlite::Connections::init(":memory:", 1).unwrap();
    adorable_db_sqlite::run_embedded_database_migrations(connections.exclusive().unwrap())
        .unwrap();
    let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
    let index = Arc::new(InMemoryPlaceIndex::new());
    let storage = Arc::new(MemoryStorage::default());
    let notify = Arc::new(RecordingNotify::default());
    let ctx = Arc::new(JobContext {
        connections: connections.clone(),
        index: index.clone(),
        geocoder: None,
        push: None,
        storage: storage.clone(),
        images: Arc::new(NoImages),
    });
    let queue = Arc::new(IndexingQueue {
        ctx,
        recorded: Mutex::default(),
    });
    let rate_limiters = RateLimiters::new(
        Arc::clone(&cache),
        RateLimit::api_default(),
        RateLimit {
            limit: AUTH_LIMIT,
            ..RateLimit::auth_attempts()
        },
        RateLimit::ip_default(),
    );
    let services = Services {
        connections: connections.clone(),
        dispatcher: EventDispatcher::new(None, queue.clone()),
        breakers: Arc::new(CircuitBreakers::new(
            Arc::clone(&cache),
            CircuitBreakerConfig::default(),
        )),
        rate_limiters,
        cache,
        index,
    };
    let gateways = Gateways {
        notify: notify.clone(),
        storage,
        identity: None,
    };
    let options = InstanceOptions {
        mounts,
        catchers: super::api::catchers(),
        rocket_cfg: Some(rocket_cfg),
        cfg: test_cfg(),
    };
    let rocket = super::rocket_instance(options, services, gateways);
    (rocket, connections.into(), notify, queue)
}

pub fn rocket_test_setup(mounts: Vec<(&'static str, Vec<Route>)>) -> TestSetup {
    let (rocket, db, notify, queue) = rocket_test_instance(mounts, RocketCfg::debug_default());
    let client = Client::tracked(rocket).unwrap();
    TestSetup {
        client,
        db,
        notify,
        queue,
    }
}

/// Registers a user with a confirmed e-mail address.
pub fn register_user(db: &sqlite::Connections, username: &str, email: &str, pw: &str) -> User {
    db.transaction(|conn| {
        let mut user = usecases::register_user(
            conn,
            usecases::NewUser {
                username: username.into(),
                email: email.into(),
                password: pw.into(),
                first_name: None,
                last_name: None,
            },
            Timestamp::now(),
        )?;
        user.email_confirmed = true;
        conn.update_user(&user)?;
        Ok(user)
    })
    .unwrap()
}

pub fn register_staff(db: &sqlite::Connections, username: &str, email: &str, pw: &str) -> User {
    let mut user = register_user(db, username, email, pw);
    user.role = Role::Staff;
    db.transaction(|conn| Ok(conn.update_user(&user)?)).unwrap();
    user
}

/// Logs in and returns the bearer token.
pub fn login(client: &Client, email: &str, pw: &str) -> String {
    let res = client
        .post("/users/login")
        .header(ContentType::JSON)
        .body(format!(r#"{{"email":"{email}","password":"{pw}"}}"#))
        .dispatch();
    assert_eq!(res.status(), rocket::http::Status::Ok);
    res.into_json::<json::JwtToken>().unwrap().token
}

#[test]
fn index_places_on_startup() {
    let connections = adorable_db_sqlite::Connections::init(":memory:", 1).unwrap();
    adorable_db_sqlite::run_embedded_database_migrations(connections.exclusive().unwrap())
        .unwrap();
    let db = sqlite::Connections::from(connections);
    let user = register_user(&db, "alice", "alice@example.com", "secret123");
    db.transaction(|conn| {
        usecases::create_place(
            conn,
            &user,
            usecases::NewPlace {
                name: "Library".into(),
                ..Default::default()
            },
            Timestamp::now(),
        )
    })
    .unwrap();
    let index = InMemoryPlaceIndex::new();
    super::initialize(&db, &index);
    let found = index.query_places(&PlaceQuery::default()).unwrap();
    assert_eq!(1, found.len());
}

#[test]
fn schedule_geocoding_for_new_places() {
    let TestSetup {
        client, db, queue, ..
    } = rocket_test_setup(vec![("/", super::api::routes())]);
    register_user(&db, "alice", "alice@example.com", "secret123");
    let token = login(&client, "alice@example.com", "secret123");
    let res = client
        .post("/places")
        .header(ContentType::JSON)
        .header(rocket::http::Header::new(
            "Authorization",
            format!("Bearer {token}"),
        ))
        .body(r#"{"name":"Town hall","address":"Main Street 1"}"#)
        .dispatch();
    let place: json::Place = res.into_json().unwrap();
    assert_eq!(
        vec![Job::GeocodePlace {
            place_id: place.id.into()
        }],
        queue.recorded()
    );
}
