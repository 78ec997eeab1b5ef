pub mod prelude {
    use adorable_core::gateways::{
        geocode::GeoCodingGateway,
        identity::{IdentityProvider, VerifiedIdentity},
        image::ImageProcessor,
        notify::NotificationGateway,
        push::{PushGateway, PushMessage, PushReport},
        realtime::RealtimeGateway,
        storage::FileStorage,
    };
    use parking_lot::Mutex;
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    pub use adorable_core::{
        db::*,
        entities::*,
        jobs::Job,
        repositories::{Error as RepoError, *},
        usecases,
        util::place_index::InMemoryPlaceIndex,
    };
    pub use std::sync::Arc;

    pub mod sqlite {
        pub use super::super::super::sqlite::*;
    }

    pub use crate::{
        dispatch::{EventDispatcher, JobQueue},
        error::{AppError, BError},
        jobs::JobContext,
        prelude as flows,
    };

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
    pub struct RecordingRealtime {
        fail: bool,
        records: Mutex<Vec<(String, Payload)>>,
    }

    impl RecordingRealtime {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }
        pub fn paths(&self) -> Vec<String> {
            self.records.lock().iter().map(|(p, _)| p.clone()).collect()
        }
        pub fn clear(&self) {
            self.records.lock().clear();
        }
    }

    impl RealtimeGateway for RecordingRealtime {
        fn set(&self, path: &str, value: &Payload) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("realtime store unavailable");
            }
            self.records.lock().push((path.to_owned(), value.clone()));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingQueue {
        jobs: Mutex<Vec<Job>>,
    }

    impl RecordingQueue {
        pub fn jobs(&self) -> Vec<Job> {
            self.jobs.lock().clone()
        }
        pub fn clear(&self) {
            self.jobs.lock().clear();
        }
    }

    impl JobQueue for RecordingQueue {
        fn enqueue(&self, job: Job) {
            self.jobs.lock().push(job);
        }
    }

    #[derive(Default)]
    pub struct RecordingPush {
        sent: Mutex<Vec<(Vec<String>, PushMessage)>>,
    }

    impl RecordingPush {
        pub fn sent(&self) -> Vec<(Vec<String>, PushMessage)> {
            self.sent.lock().clone()
        }
    }

    impl PushGateway for RecordingPush {
        fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> anyhow::Result<PushReport> {
            self.sent.lock().push((tokens.to_vec(), message.clone()));
            Ok(PushReport {
                success_count: tokens.len(),
                failure_count: 0,
            })
        }
    }

    /// Resolves every address to the same point.
    pub struct StaticGeocoder(pub Option<MapPoint>);

    impl GeoCodingGateway for StaticGeocoder {
        fn resolve_address(&self, _: &str) -> Option<MapPoint> {
            self.0
        }
    }

    /// Copies the image instead of scaling it.
    pub struct CopyImages;

    impl ImageProcessor for CopyImages {
        fn thumbnail(&self, src: &Path, dst: &Path, _: u32, _: u32) -> anyhow::Result<()> {
            fs::copy(src, dst)?;
            Ok(())
        }
    }

    pub struct StaticIdentityProvider {
        token: String,
        email: EmailAddress,
    }

    impl StaticIdentityProvider {
        pub fn new(token: &str, email: &str) -> Self {
            Self {
                token: token.to_owned(),
                email: EmailAddress::new_unchecked(email.to_owned()),
            }
        }
    }

    impl IdentityProvider for StaticIdentityProvider {
        fn verify_id_token(&self, id_token: &str) -> Option<VerifiedIdentity> {
            (id_token == self.token).then(|| VerifiedIdentity {
                uid: format!("uid-{}", self.token),
                email: self.email.clone(),
                email_verified: true,
            })
        }
    }

    /// File storage in a temporary directory that is removed on drop.
    #[derive(Clone)]
    pub struct TempDirStorage {
        root: Arc<TempDir>,
    }

    struct TempDir(PathBuf);

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    impl TempDirStorage {
        pub fn new() -> Self {
            let root = std::env::temp_dir().join(format!("adorable-test-{}", Id::new()));
            fs::create_dir_all(&root).unwrap();
            Self {
                root: Arc::new(TempDir(root)),
            }
        }
        fn path(&self, path: &str) -> PathBuf {
            self.root.0.join(path)
        }
    }

    impl FileStorage for TempDirStorage {
        fn store(&self, path: &str, content: &[u8]) -> anyhow::Result<()> {
            let path = self.path(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            Ok(())
        }
        fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
            Ok(fs::read(self.path(path))?)
        }
        fn remove(&self, path: &str) -> anyhow::Result<()> {
            match fs::remove_file(self.path(path)) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            }
        }
        fn local_path(&self, path: &str) -> Option<PathBuf> {
            Some(self.path(path))
        }
        fn url(&self, path: &str) -> String {
            format!("https://files.example.com/{path}")
        }
    }

    pub struct BackendFixture {
        pub db_connections: sqlite::Connections,
        pub notify: RecordingNotify,
        pub storage: TempDirStorage,
        pub realtime: Arc<RecordingRealtime>,
        pub queue: Arc<RecordingQueue>,
        pub dispatcher: EventDispatcher,
        pub index: Arc<InMemoryPlaceIndex>,
        pub push: Arc<RecordingPush>,
    }

    impl BackendFixture {
        pub fn new() -> Self {
            let _ = env_logger::builder().is_test(true).try_init();
            let db_connections = sqlite::Connections::init(":memory:", 1).unwrap();
            sqlite::run_embedded_database_migrations(db_connections.exclusive().unwrap())
                .unwrap();
            let realtime = Arc::new(RecordingRealtime::default());
            let queue = Arc::new(RecordingQueue::default());
            let dispatcher = EventDispatcher::new(Some(realtime.clone()), queue.clone());
            Self {
                db_connections,
                notify: RecordingNotify::default(),
                storage: TempDirStorage::new(),
                realtime,
                queue,
                dispatcher,
                index: Arc::new(InMemoryPlaceIndex::new()),
                push: Arc::new(RecordingPush::default()),
            }
        }

        pub fn job_context(&self) -> Arc<JobContext> {
            self.job_context_with_geocoder(None)
        }

        pub fn job_context_with_geocoder(&self, pos: Option<MapPoint>) -> Arc<JobContext> {
            Arc::new(JobContext {
                connections: self.db_connections.clone(),
                index: self.index.clone(),
                geocoder: Some(Arc::new(StaticGeocoder(pos))),
                push: Some(self.push.clone()),
                storage: Arc::new(self.storage.clone()),
                images: Arc::new(CopyImages),
            })
        }

        /// Registers a user with a confirmed email address.
        pub fn create_user(&self, username: &str, email: &str, password: &str) -> User {
            let mut db = self.db_connections.exclusive().unwrap();
            db.transaction(|conn| {
                let mut user = usecases::register_user(
                    conn,
                    usecases::NewUser {
                        username: username.into(),
                        email: email.into(),
                        password: password.into(),
                        first_name: None,
                        last_name: None,
                    },
                    Timestamp::now(),
                )?;
                user.email_confirmed = true;
                conn.update_user(&user)?;
                Ok::<_, usecases::Error>(user)
            })
            .unwrap()
        }

        pub fn create_place(&self, user: &User, name: &str) -> Place {
            let new_place = usecases::NewPlace {
                lat: Some(52.52),
                lng: Some(13.40),
                ..new_place(name, None)
            };
            flows::create_place(&self.db_connections, &self.dispatcher, user, new_place).unwrap()
        }

        pub fn get_user(&self, id: &Id) -> User {
            self.db_connections.shared().unwrap().get_user(id).unwrap()
        }

        pub fn get_place(&self, id: &Id) -> Place {
            self.db_connections.shared().unwrap().get_place(id).unwrap()
        }
    }

    pub fn new_place(name: &str, address: Option<&str>) -> usecases::NewPlace {
        usecases::NewPlace {
            name: name.into(),
            description: format!("All about {name}"),
            address: address.unwrap_or_default().into(),
            lat: None,
            lng: None,
            category: "restaurant".into(),
            tags: vec![],
        }
    }
}
