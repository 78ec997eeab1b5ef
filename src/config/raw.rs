use duration_str::deserialize_duration;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_CONFIG_FILE: &str = include_str!("adorable.default.toml");

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub db: Db,
    pub cache: Cache,
    pub webserver: WebServer,
    pub auth: Option<Auth>,
    pub rate_limits: RateLimits,
    pub circuit_breaker: CircuitBreaker,
    pub jobs: Jobs,
    pub storage: Storage,
    pub email: Option<Email>,
    pub geocoding: Option<Geocoding>,
    pub firebase: Option<Firebase>,
    pub gateway: Option<Gateway>,
}

/// Parses the given configuration on top of the embedded defaults.
///
/// Tables are merged recursively, all other values
/// of `overlay` replace the defaults.
pub fn parse_with_defaults(overlay: &str) -> Result<Config, toml::de::Error> {
    let mut table: toml::Table = toml::from_str(DEFAULT_CONFIG_FILE)?;
    let overlay: toml::Table = toml::from_str(overlay)?;
    merge(&mut table, overlay);
    toml::Value::Table(table).try_into()
}

fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay) if base.get(&key).is_some_and(toml::Value::is_table) => {
                if let Some(toml::Value::Table(base)) = base.get_mut(&key) {
                    merge(base, overlay);
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Db {
    pub connection_sqlite: String,
    pub connection_pool_size: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cache {
    pub redis_url: Option<String>,
    pub pool_size: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebServer {
    pub cors: bool,
    pub confirm_email_url: String,
    pub reset_password_url: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Auth {
    pub jwt_secret: Option<String>,
    pub identity_api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimits {
    pub api: RateLimit,
    pub auth: RateLimit,
    pub ip: RateLimit,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimit {
    pub limit: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub period: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CircuitBreaker {
    pub failure_threshold: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub reset_timeout: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub half_open_timeout: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Jobs {
    pub workers: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub time_limit: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub cleanup_interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub rankings_interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub digest_interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub statistics_interval: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Storage {
    pub media_root: PathBuf,
    pub base_url: String,
    pub convert_program: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Email {
    pub gateway: Option<EmailGateway>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailGateway {
    Mailgun,
    Sendmail,
    EmailToJsonFile,
}

impl EmailGateway {
    /// The name as written in the configuration file.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mailgun => "mailgun",
            Self::Sendmail => "sendmail",
            Self::EmailToJsonFile => "email-to-json-file",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Geocoding {
    pub gateway: Option<GeocodingGateway>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeocodingGateway {
    Opencage,
}

impl GeocodingGateway {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Opencage => "opencage",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Firebase {
    pub server_key: Option<String>,
    pub realtime_database_url: Option<String>,
    pub realtime_secret: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Gateway {
    pub mailgun: Option<MailGun>,
    pub sendmail: Option<Sendmail>,
    pub email_to_json_file: Option<EmailToJsonFile>,
    pub opencage: Option<OpenCage>,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MailGun {
    pub api_key: String,
    pub domain: String,
    pub sender_address: String,
    pub api_base_url: Option<String>,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sendmail {
    pub sender_address: String,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EmailToJsonFile {
    pub dir: PathBuf,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpenCage {
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_default_config_from_file() {
        let cfg = parse_with_defaults("").unwrap();
        assert_eq!(10, cfg.db.connection_pool_size);
        assert!(cfg.cache.redis_url.is_none());
        assert_eq!(5, cfg.rate_limits.auth.limit);
        assert_eq!(Duration::from_secs(300), cfg.rate_limits.auth.period);
        assert_eq!(Duration::from_secs(30 * 60), cfg.jobs.time_limit);
        assert_eq!(Duration::from_secs(24 * 60 * 60), cfg.jobs.cleanup_interval);
        assert!(cfg.gateway.is_none());
    }

    #[test]
    fn override_single_values() {
        let cfg = parse_with_defaults(
            r#"
            [rate-limits.api]
            limit = 50

            [jobs]
            workers = 8
            "#,
        )
        .unwrap();
        assert_eq!(50, cfg.rate_limits.api.limit);
        assert_eq!(Duration::from_secs(3600), cfg.rate_limits.api.period);
        assert_eq!(8, cfg.jobs.workers);
        assert_eq!(Duration::from_secs(3600), cfg.jobs.rankings_interval);
    }

    #[test]
    fn reject_invalid_durations() {
        assert!(parse_with_defaults("[jobs]\ntime-limit = \"soon\"").is_err());
    }

    #[test]
    fn parse_full_config_example_from_file() {
        let cfg_string = fs::read_to_string("src/config/adorable.full-example.toml").unwrap();
        let cfg = parse_with_defaults(&cfg_string).unwrap();
        assert!(cfg.gateway.unwrap().mailgun.is_some());
    }
}
