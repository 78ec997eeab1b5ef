use adorable_core::entities::*;
use anyhow::Result;
use itertools::Itertools;
use std::thread;

use super::EmailGateway;

/// An email gateway based on mailgun.net.
#[derive(Debug, Clone)]
pub struct Mailgun {
    pub api_key: String,
    pub api_base_url: String,
    pub domain: String,
    pub from_email: EmailAddress,
}

impl Mailgun {
    fn messages_url(&self) -> String {
        let Self {
            api_base_url,
            domain,
            ..
        } = self;
        format!("{}/{domain}/messages", api_base_url.trim_end_matches('/'))
    }

    fn send(&self, params: Vec<(&'static str, String)>) {
        let url = self.messages_url();
        let key = self.api_key.clone();
        thread::spawn(move || {
            if let Err(err) = send_raw(&url, &key, params) {
                log::warn!("Could not send e-mail: {err}");
            }
        });
    }
}

#[derive(Debug, serde::Deserialize, thiserror::Error)]
#[error("{message}")]
struct JsonError {
    pub message: String,
}

#[cfg(not(test))]
fn send_raw(url: &str, api_key: &str, params: Vec<(&'static str, String)>) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let response = client
        .post(url)
        .form(&params)
        .basic_auth("api", Some(api_key))
        .send()?;
    if response.status().is_success() {
        log::debug!("Mail provider response: {response:#?}");
        Ok(())
    } else {
        let json_error: JsonError = response.json()?;
        Err(json_error.into())
    }
}

/// Don't actually send e-mails while running the tests.
#[cfg(test)]
fn send_raw(_: &str, _: &str, params: Vec<(&'static str, String)>) -> Result<()> {
    log::debug!("Would send e-mail: {params:?}");
    Ok(())
}

impl EmailGateway for Mailgun {
    fn compose_and_send(&self, recipients: &[EmailAddress], email: &EmailContent) {
        if recipients.is_empty() {
            log::warn!("No valid email addresses specified");
            return;
        }
        log::debug!(
            "Sending e-mails from {} to {} recipient(s)",
            self.from_email,
            recipients.len()
        );
        let recipients: String = recipients.iter().map(EmailAddress::as_str).join(",");
        let from = self.from_email.to_string();
        let params = vec![
            ("to", self.from_email.as_str().to_owned()), // `to` is required
            ("from", from),
            ("bcc", recipients),
            ("subject", email.subject.clone()),
            ("text", email.body.clone()),
        ];
        self.send(params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_without_duplicate_slashes() {
        let gw = Mailgun {
            api_key: "key".into(),
            api_base_url: "https://api.eu.mailgun.net/v3/".into(),
            domain: "mg.example.com".into(),
            from_email: EmailAddress::new_unchecked("noreply@example.com".into()),
        };
        assert_eq!(
            "https://api.eu.mailgun.net/v3/mg.example.com/messages",
            gw.messages_url()
        );
    }
}
