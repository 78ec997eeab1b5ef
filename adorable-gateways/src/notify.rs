use std::sync::Arc;

use adorable_core::{
    entities::*,
    gateways::{email::EmailGateway, notify::NotificationGateway},
};

use crate::user_communication;

/// Sends account related e-mails through the configured [`EmailGateway`].
#[derive(Clone)]
pub struct Notify {
    email_gw: Arc<dyn EmailGateway + Send + Sync + 'static>,
    reset_password_url: String,
}

impl Notify {
    /// `reset_password_url` is the page of the frontend that
    /// accepts the token as `token` query parameter.
    pub fn new<G>(gw: G, reset_password_url: impl Into<String>) -> Self
    where
        G: EmailGateway + Send + Sync + 'static,
    {
        Self {
            email_gw: Arc::new(gw),
            reset_password_url: reset_password_url.into(),
        }
    }
}

impl NotificationGateway for Notify {
    fn user_registered(&self, user: &User, confirm_email_url: &str) {
        match user_communication::user_registration_email(&user.username, confirm_email_url) {
            Ok(content) => {
                log::info!("Sending confirmation e-mail to user {}", user.id);
                self.email_gw
                    .compose_and_send(&[user.email.clone()], &content);
            }
            Err(err) => log::error!("Unable to render registration e-mail: {err}"),
        }
    }

    fn user_reset_password_requested(&self, email_nonce: &EmailNonce) {
        let url = format!(
            "{}?token={}",
            self.reset_password_url,
            email_nonce.encode_to_string()
        );
        match user_communication::user_reset_password_email(&url) {
            Ok(content) => {
                log::info!("Sending e-mail after password reset requested");
                self.email_gw
                    .compose_and_send(&[email_nonce.email.clone()], &content);
            }
            Err(err) => log::error!("Unable to render password reset e-mail: {err}"),
        }
    }
}

/// Only logs the e-mails instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyMailGw;

impl EmailGateway for DummyMailGw {
    fn compose_and_send(&self, recipients: &[EmailAddress], email: &EmailContent) {
        log::debug!(
            "Cannot send e-mail '{}' to {} recipient(s) because no e-mail gateway was configured",
            email.subject,
            recipients.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Outbox(Arc<Mutex<Vec<(Vec<EmailAddress>, EmailContent)>>>);

    impl EmailGateway for Outbox {
        fn compose_and_send(&self, recipients: &[EmailAddress], email: &EmailContent) {
            self.0
                .lock()
                .unwrap()
                .push((recipients.to_vec(), email.clone()));
        }
    }

    #[test]
    fn send_reset_password_link() {
        let outbox = Outbox::default();
        let notify = Notify::new(outbox.clone(), "https://adorable.app/reset-password");
        let email_nonce = EmailNonce::new(EmailAddress::new_unchecked("a@example.com".into()));
        notify.user_reset_password_requested(&email_nonce);

        let sent = outbox.0.lock().unwrap();
        assert_eq!(1, sent.len());
        assert_eq!("a@example.com", sent[0].0[0].as_str());
        let expected_url = format!(
            "https://adorable.app/reset-password?token={}",
            email_nonce.encode_to_string()
        );
        assert!(sent[0].1.body.contains(&expected_url));
    }

    #[test]
    fn send_confirmation_link() {
        let outbox = Outbox::default();
        let notify = Notify::new(outbox.clone(), "https://adorable.app/reset-password");
        let user = User {
            id: Id::new(),
            username: "bob".into(),
            email: EmailAddress::new_unchecked("bob@example.com".into()),
            email_confirmed: false,
            password: Password::from_hash(String::new()),
            role: Role::User,
            profile: Default::default(),
            notifications: Default::default(),
            privacy: Default::default(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        };
        notify.user_registered(&user, "https://adorable.app/confirm?token=t");
        let sent = outbox.0.lock().unwrap();
        assert_eq!(1, sent.len());
        assert!(sent[0].1.body.contains("https://adorable.app/confirm?token=t"));
    }
}
