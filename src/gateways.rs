use std::sync::Arc;

use adorable_core::{
    cache::{Cache, InMemoryCache},
    circuit_breaker::CircuitBreakers,
    entities::{EmailAddress, EmailContent},
    gateways::{
        email::EmailGateway, geocode::GeoCodingGateway, identity::IdentityProvider,
        image::ImageProcessor, push::PushGateway,
        realtime::RealtimeGateway, storage::FileStorage,
    },
};
use adorable_gateways::{
    email::{mailgun::Mailgun, send_to_json_file::SendToJsonFile, sendmail::Sendmail},
    firebase::{FirebaseIdentity, FirebasePush, FirebaseRealtime},
    imagemagick::ImageMagick,
    local_storage::LocalFileStorage,
    notify::{DummyMailGw, Notify},
    opencage::OpenCage,
    redis_cache::RedisCache,
};
use anyhow::Result;

use crate::config;

/// Names of the circuit breakers that guard outbound calls.
pub const GEOCODING_CIRCUIT: &str = "geocoding";
pub const PUSH_CIRCUIT: &str = "push";

pub fn cache(cfg: &config::Cache) -> Result<Arc<dyn Cache>> {
    match &cfg.redis_url {
        Some(url) => {
            log::info!("Use Redis cache");
            Ok(Arc::new(RedisCache::connect(url, cfg.pool_size)?))
        }
        None => {
            log::warn!("No Redis cache configured: rate limits and circuit breakers are not shared between processes");
            Ok(Arc::new(InMemoryCache::new()))
        }
    }
}

pub fn notification_gateway(
    email_cfg: Option<config::EmailGateway>,
    reset_password_url: &str,
) -> Result<Notify> {
    Ok(Notify::new(email_gateway(email_cfg)?, reset_password_url))
}

pub fn email_gateway(cfg: Option<config::EmailGateway>) -> Result<EmailGw> {
    let gw = match cfg {
        Some(config::EmailGateway::MailGun {
            api_base_url,
            api_key,
            domain,
            sender_address,
        }) => EmailGw::new(Mailgun {
            api_key,
            api_base_url,
            domain,
            from_email: sender_address,
        }),
        Some(config::EmailGateway::Sendmail { sender_address }) => {
            EmailGw::new(Sendmail::new(sender_address))
        }
        Some(config::EmailGateway::EmailToJsonFile { dir }) => {
            EmailGw::new(SendToJsonFile::try_new(dir)?)
        }
        None => {
            log::warn!("No e-mail gateway was configured");
            EmailGw::new(DummyMailGw)
        }
    };
    Ok(gw)
}

pub fn geocoding_gateway(
    cfg: Option<&config::GeocodingGateway>,
    breakers: &CircuitBreakers,
) -> Option<Arc<dyn GeoCodingGateway + Send + Sync>> {
    match cfg {
        Some(config::GeocodingGateway::OpenCage { api_key }) => {
            log::info!("Use OpenCage geocoding gateway");
            let gw = OpenCage::new(api_key.clone())
                .with_circuit_breaker(breakers.get(GEOCODING_CIRCUIT));
            Some(Arc::new(gw))
        }
        None => {
            log::warn!("No geocoding gateway was configured: places are not geocoded");
            None
        }
    }
}

pub fn push_gateway(
    cfg: &config::Firebase,
    breakers: &CircuitBreakers,
) -> Option<Arc<dyn PushGateway + Send + Sync>> {
    let Some(server_key) = &cfg.push_server_key else {
        log::warn!("No push gateway was configured");
        return None;
    };
    let gw =
        FirebasePush::new(server_key.as_str()).with_circuit_breaker(breakers.get(PUSH_CIRCUIT));
    Some(Arc::new(gw))
}

pub fn realtime_gateway(cfg: &config::Firebase) -> Option<Arc<dyn RealtimeGateway + Send + Sync>> {
    cfg.realtime.as_ref().map(|rt| {
        log::info!("Mirror records into {}", rt.database_url);
        Arc::new(FirebaseRealtime::new(
            rt.database_url.as_str(),
            rt.secret.clone(),
        )) as Arc<dyn RealtimeGateway + Send + Sync>
    })
}

pub fn identity_provider(cfg: &config::Auth) -> Option<Arc<dyn IdentityProvider + Send + Sync>> {
    cfg.identity_api_key
        .as_deref()
        .map(|key| Arc::new(FirebaseIdentity::new(key)) as Arc<dyn IdentityProvider + Send + Sync>)
}

pub fn file_storage(cfg: &config::Storage) -> Result<Arc<dyn FileStorage + Send + Sync>> {
    let storage = LocalFileStorage::try_new(&cfg.media_root, cfg.base_url.as_str())?;
    log::info!("Store files in {}", cfg.media_root.display());
    Ok(Arc::new(storage))
}

pub fn image_processor(cfg: &config::Storage) -> Arc<dyn ImageProcessor + Send + Sync> {
    match &cfg.convert_program {
        Some(program) => Arc::new(ImageMagick::new(program.as_str())),
        None => Arc::new(ImageMagick::default()),
    }
}

pub struct EmailGw(Box<dyn EmailGateway + Send + Sync + 'static>);

impl EmailGw {
    pub fn new<G>(gw: G) -> Self
    where
        G: EmailGateway + Send + Sync + 'static,
    {
        Self(Box::new(gw))
    }
}

impl EmailGateway for EmailGw {
    fn compose_and_send(&self, recipients: &[EmailAddress], email: &EmailContent) {
        self.0.compose_and_send(recipients, email);
    }
}

