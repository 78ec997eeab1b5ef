use adorable_core::{
    circuit_breaker::CircuitBreakerConfig, entities::EmailAddress, rate_limit::RateLimit,
};
use anyhow::{anyhow, bail, Result};
use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

mod raw;

const DEFAULT_CONFIG_FILE_NAME: &str = "adorable.toml";

const ENV_NAME_DB_URL: &str = "DATABASE_URL";
const ENV_NAME_REDIS_URL: &str = "REDIS_URL";
const ENV_NAME_JWT_SECRET: &str = "JWT_SECRET";

const DEFAULT_MAILGUN_API_BASE_URL: &str = "https://api.eu.mailgun.net/v3";

pub struct Config {
    pub db: Db,
    pub cache: Cache,
    pub webserver: WebServer,
    pub auth: Auth,
    pub rate_limits: RateLimits,
    pub circuit_breaker: CircuitBreakerConfig,
    pub jobs: Jobs,
    pub storage: Storage,
    pub email: Email,
    pub geocoding: Geocoding,
    pub firebase: Firebase,
}

impl Config {
    pub fn try_load_from_file_or_default<P: AsRef<Path>>(file_path: Option<P>) -> Result<Self> {
        let file_path: &Path = file_path.as_ref().map(|p| p.as_ref()).unwrap_or_else(|| {
            log::info!("No configuration file specified. load {DEFAULT_CONFIG_FILE_NAME}");
            Path::new(DEFAULT_CONFIG_FILE_NAME)
        });

        let cfg_string = match fs::read_to_string(file_path) {
            Ok(cfg_string) => cfg_string,
            Err(err) => match err.kind() {
                ErrorKind::NotFound => {
                    log::info!(
                        "{} not found => load default configuration.",
                        file_path.display()
                    );
                    String::new()
                }
                _ => return Err(err.into()),
            },
        };
        let mut cfg = Self::try_from(raw::parse_with_defaults(&cfg_string)?)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(db_url) = env::var(ENV_NAME_DB_URL) {
            self.db.conn_sqlite = db_url;
        }
        if let Ok(redis_url) = env::var(ENV_NAME_REDIS_URL) {
            self.cache.redis_url = Some(redis_url);
        }
        if let Ok(secret) = env::var(ENV_NAME_JWT_SECRET) {
            self.auth.jwt_secret = Some(secret);
        }
    }
}

pub struct Db {
    /// SQLite connection
    pub conn_sqlite: String,
    pub conn_pool_size: u8,
}

pub struct Cache {
    /// The in-memory cache is used if missing.
    pub redis_url: Option<String>,
    pub pool_size: u32,
}

pub struct WebServer {
    pub enable_cors: bool,
    pub confirm_email_url: String,
    pub reset_password_url: String,
}

pub struct Auth {
    pub jwt_secret: Option<String>,
    /// Enables the login with tokens of the identity provider.
    pub identity_api_key: Option<String>,
}

pub struct RateLimits {
    pub api: RateLimit,
    pub auth: RateLimit,
    pub ip: RateLimit,
}

pub struct Jobs {
    pub workers: usize,
    pub time_limit: Duration,
    pub cleanup_interval: Duration,
    pub rankings_interval: Duration,
    pub digest_interval: Duration,
    pub statistics_interval: Duration,
}

pub struct Storage {
    pub media_root: PathBuf,
    pub base_url: String,
    pub convert_program: Option<String>,
}

pub struct Email {
    pub gateway: Option<EmailGateway>,
}

#[derive(Clone)]
pub enum EmailGateway {
    MailGun {
        api_base_url: String,
        api_key: String,
        domain: String,
        sender_address: EmailAddress,
    },
    Sendmail {
        sender_address: EmailAddress,
    },
    /// For local testing purposes
    EmailToJsonFile {
        /// File system directory for writing emails into JSON files.
        dir: PathBuf,
    },
}

pub struct Geocoding {
    pub gateway: Option<GeocodingGateway>,
}

pub enum GeocodingGateway {
    OpenCage { api_key: String },
}

pub struct Firebase {
    pub push_server_key: Option<String>,
    pub realtime: Option<Realtime>,
}

pub struct Realtime {
    pub database_url: String,
    pub secret: Option<String>,
}

fn rate_limit(key: &str, scope: &str, raw: raw::RateLimit) -> Result<RateLimit> {
    let raw::RateLimit { limit, period } = raw;
    if limit == 0 || period.is_zero() {
        bail!("Invalid rate limit '{key}': limit and period must be greater than zero");
    }
    Ok(RateLimit {
        key: key.to_owned(),
        scope: scope.to_owned(),
        limit,
        period,
    })
}

fn email_gateway(
    gw_name: raw::EmailGateway,
    gateway: Option<&raw::Gateway>,
) -> Result<EmailGateway> {
    let toml_name = gw_name.name();
    let gateway = gateway.cloned().unwrap_or_default();
    let missing = || anyhow!("Missing {toml_name} gateway configuration");
    let gw = match gw_name {
        raw::EmailGateway::Mailgun => {
            let raw::MailGun {
                api_key,
                domain,
                sender_address,
                api_base_url,
            } = gateway.mailgun.ok_or_else(missing)?;
            let sender_address = sender_address.parse()?;
            log::info!("Use Mailgun gateway");
            EmailGateway::MailGun {
                api_base_url: api_base_url
                    .unwrap_or_else(|| DEFAULT_MAILGUN_API_BASE_URL.to_owned()),
                api_key,
                domain,
                sender_address,
            }
        }
        raw::EmailGateway::Sendmail => {
            let raw::Sendmail { sender_address } = gateway.sendmail.ok_or_else(missing)?;
            let sender_address = sender_address.parse()?;
            log::info!("Use sendmail gateway");
            EmailGateway::Sendmail { sender_address }
        }
        raw::EmailGateway::EmailToJsonFile => {
            let raw::EmailToJsonFile { dir } = gateway.email_to_json_file.ok_or_else(missing)?;
            log::info!("Use JSON file email gateway ({})", dir.display());
            EmailGateway::EmailToJsonFile { dir }
        }
    };
    Ok(gw)
}

impl TryFrom<raw::Config> for Config {
    type Error = anyhow::Error;
    fn try_from(from: raw::Config) -> Result<Self> {
        let raw::Config {
            db,
            cache,
            webserver,
            auth,
            rate_limits,
            circuit_breaker,
            jobs,
            storage,
            email,
            geocoding,
            firebase,
            gateway,
        } = from;

        let raw::Db {
            connection_sqlite,
            connection_pool_size,
        } = db;
        if connection_pool_size == 0 {
            bail!("The database connection pool must not be empty");
        }
        let db = Db {
            conn_sqlite: connection_sqlite,
            conn_pool_size: connection_pool_size,
        };

        let raw::Cache {
            redis_url,
            pool_size,
        } = cache;
        let cache = Cache {
            redis_url: redis_url.filter(|url| !url.trim().is_empty()),
            pool_size: pool_size.max(1),
        };

        let raw::WebServer {
            cors,
            confirm_email_url,
            reset_password_url,
        } = webserver;
        let webserver = WebServer {
            enable_cors: cors,
            confirm_email_url,
            reset_password_url,
        };

        let raw::Auth {
            jwt_secret,
            identity_api_key,
        } = auth.unwrap_or_default();
        let auth = Auth {
            jwt_secret,
            identity_api_key,
        };

        let raw::RateLimits { api, auth: auth_limit, ip } = rate_limits;
        let defaults = (
            RateLimit::api_default(),
            RateLimit::auth_attempts(),
            RateLimit::ip_default(),
        );
        let rate_limits = RateLimits {
            api: rate_limit(&defaults.0.key, &defaults.0.scope, api)?,
            auth: rate_limit(&defaults.1.key, &defaults.1.scope, auth_limit)?,
            ip: rate_limit(&defaults.2.key, &defaults.2.scope, ip)?,
        };

        let raw::CircuitBreaker {
            failure_threshold,
            reset_timeout,
            half_open_timeout,
        } = circuit_breaker;
        if failure_threshold == 0 {
            bail!("The circuit breaker failure threshold must be greater than zero");
        }
        let circuit_breaker = CircuitBreakerConfig {
            failure_threshold,
            reset_timeout,
            half_open_timeout,
        };

        let raw::Jobs {
            workers,
            time_limit,
            cleanup_interval,
            rankings_interval,
            digest_interval,
            statistics_interval,
        } = jobs;
        let intervals = [
            cleanup_interval,
            rankings_interval,
            digest_interval,
            statistics_interval,
        ];
        if workers == 0 || time_limit.is_zero() || intervals.iter().any(Duration::is_zero) {
            bail!("Invalid job configuration");
        }
        let jobs = Jobs {
            workers,
            time_limit,
            cleanup_interval,
            rankings_interval,
            digest_interval,
            statistics_interval,
        };

        let raw::Storage {
            media_root,
            base_url,
            convert_program,
        } = storage;
        let storage = Storage {
            media_root,
            base_url,
            convert_program,
        };

        let email_gateway = match email.and_then(|m| m.gateway) {
            Some(gw_name) => Some(email_gateway(gw_name, gateway.as_ref())?),
            None => None,
        };
        let email = Email {
            gateway: email_gateway,
        };

        let geo_gateway = match geocoding.and_then(|g| g.gateway) {
            Some(gw_name) => {
                let toml_name = gw_name.name();
                let gateway = gateway.ok_or_else(|| anyhow!("Missing gateway configuration"))?;
                let gw = match gw_name {
                    raw::GeocodingGateway::Opencage => {
                        let raw::OpenCage { api_key } = gateway.opencage.ok_or_else(|| {
                            anyhow!("Missing {toml_name} gateway configuration")
                        })?;
                        GeocodingGateway::OpenCage { api_key }
                    }
                };
                Some(gw)
            }
            None => None,
        };
        let geocoding = Geocoding {
            gateway: geo_gateway,
        };

        let firebase = match firebase {
            Some(raw::Firebase {
                server_key,
                realtime_database_url,
                realtime_secret,
            }) => Firebase {
                push_server_key: server_key,
                realtime: realtime_database_url.map(|database_url| Realtime {
                    database_url,
                    secret: realtime_secret,
                }),
            },
            None => Firebase {
                push_server_key: None,
                realtime: None,
            },
        };

        Ok(Self {
            db,
            cache,
            webserver,
            auth,
            rate_limits,
            circuit_breaker,
            jobs,
            storage,
            email,
            geocoding,
            firebase,
        })
    }
}
