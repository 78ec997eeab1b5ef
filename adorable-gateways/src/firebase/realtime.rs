use adorable_core::{entities::Payload, gateways::realtime::RealtimeGateway};
use anyhow::{bail, Result};
use serde_json::{Map, Value};
use std::thread;

/// Writes records into the Firebase Realtime Database.
#[derive(Debug, Clone)]
pub struct FirebaseRealtime {
    database_url: String,
    auth_secret: Option<String>,
}

impl FirebaseRealtime {
    pub fn new(database_url: impl Into<String>, auth_secret: Option<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth_secret,
        }
    }

    fn record_url(&self, path: &str) -> String {
        let base = self.database_url.trim_end_matches('/');
        let path = path.trim_matches('/');
        match &self.auth_secret {
            Some(secret) => format!("{base}/{path}.json?auth={secret}"),
            None => format!("{base}/{path}.json"),
        }
    }
}

/// Keys must not contain '.', so `data.key` entries
/// are nested into a `data` object.
fn to_document(value: &Payload) -> Value {
    let mut doc = Map::new();
    let mut data = Map::new();
    for (key, val) in value {
        match key.strip_prefix("data.") {
            Some(data_key) => {
                data.insert(data_key.to_owned(), Value::String(val.clone()));
            }
            None => {
                doc.insert(key.clone(), Value::String(val.clone()));
            }
        }
    }
    if !data.is_empty() {
        doc.insert("data".to_owned(), Value::Object(data));
    }
    Value::Object(doc)
}

impl FirebaseRealtime {
    fn put(&self, path: &str, doc: &Value) -> Result<()> {
        let response = super::blocking_client()?
            .put(self.record_url(path))
            .json(doc)
            .send()?;
        if !response.status().is_success() {
            bail!(
                "Unable to write realtime record '{path}': {}",
                response.status()
            );
        }
        log::debug!("Wrote realtime record '{path}'");
        Ok(())
    }
}

impl RealtimeGateway for FirebaseRealtime {
    /// The record is written in the background, failures are only logged.
    fn set(&self, path: &str, value: &Payload) -> Result<()> {
        let gw = self.clone();
        let path = path.to_owned();
        let doc = to_document(value);
        thread::Builder::new()
            .name("realtime".into())
            .spawn(move || {
                if let Err(err) = gw.put(&path, &doc) {
                    log::warn!("{err}");
                }
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nest_data_entries() {
        let mut value = Payload::new();
        value.insert("id".into(), "n1".into());
        value.insert("data.chat_id".into(), "c1".into());
        value.insert("data.sender_id".into(), "u1".into());
        assert_eq!(
            to_document(&value),
            serde_json::json!({
                "id": "n1",
                "data": { "chat_id": "c1", "sender_id": "u1" }
            })
        );
    }

    #[test]
    fn no_empty_data_object() {
        let mut value = Payload::new();
        value.insert("id".into(), "a1".into());
        assert_eq!(to_document(&value), serde_json::json!({ "id": "a1" }));
    }

    #[test]
    fn build_record_urls() {
        let rt = FirebaseRealtime::new("https://db.example.com/", Some("s3cret".into()));
        assert_eq!(
            "https://db.example.com/chats/c1/messages/m1.json?auth=s3cret",
            rt.record_url("/chats/c1/messages/m1")
        );
        let rt = FirebaseRealtime::new("https://db.example.com", None);
        assert_eq!("https://db.example.com/feeds/u1.json", rt.record_url("feeds/u1"));
    }
}
