use adorable_entities::{nonce::EmailNonce, user::User};

/// E-mails sent to users on account related events.
pub trait NotificationGateway {
    fn user_registered(&self, user: &User, confirm_email_url: &str);
    fn user_reset_password_requested(&self, email_nonce: &EmailNonce);
}
