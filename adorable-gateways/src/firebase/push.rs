use adorable_core::{
    circuit_breaker::CircuitBreaker,
    gateways::push::{PushGateway, PushMessage, PushReport, MAX_PUSH_BATCH_SIZE},
};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::guarded;

const DEFAULT_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// Push notifications via Firebase Cloud Messaging.
#[derive(Clone)]
pub struct FirebasePush {
    server_key: String,
    send_url: String,
    breaker: Option<CircuitBreaker>,
}

impl FirebasePush {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            server_key: server_key.into(),
            send_url: DEFAULT_SEND_URL.to_owned(),
            breaker: None,
        }
    }

    pub fn with_send_url(mut self, send_url: impl Into<String>) -> Self {
        self.send_url = send_url.into();
        self
    }

    pub fn with_circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct MulticastRequest<'a> {
    registration_ids: &'a [String],
    notification: Notification<'a>,
    data: &'a BTreeMap<String, String>,
}

impl<'a> MulticastRequest<'a> {
    fn new(tokens: &'a [String], message: &'a PushMessage) -> Self {
        let PushMessage { title, body, data } = message;
        Self {
            registration_ids: tokens,
            notification: Notification { title, body },
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MulticastResponse {
    success: usize,
    failure: usize,
}

impl From<MulticastResponse> for PushReport {
    fn from(from: MulticastResponse) -> Self {
        let MulticastResponse { success, failure } = from;
        Self {
            success_count: success,
            failure_count: failure,
        }
    }
}

impl PushGateway for FirebasePush {
    fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> Result<PushReport> {
        if tokens.is_empty() {
            return Ok(PushReport::default());
        }
        if tokens.len() > MAX_PUSH_BATCH_SIZE {
            bail!(
                "Too many device tokens: {} > {MAX_PUSH_BATCH_SIZE}",
                tokens.len()
            );
        }
        let request = MulticastRequest::new(tokens, message);
        guarded(self.breaker.as_ref(), || {
            let response = super::blocking_client()?
                .post(&self.send_url)
                .header("Authorization", format!("key={}", self.server_key))
                .json(&request)
                .send()?;
            if !response.status().is_success() {
                bail!("Push request failed with status {}", response.status());
            }
            let response: MulticastResponse = response.json()?;
            log::debug!(
                "Sent push message to {} device(s): {} succeeded, {} failed",
                tokens.len(),
                response.success,
                response.failure
            );
            Ok(response.into())
        })
    }
}
