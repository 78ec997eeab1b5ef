use adorable_entities::email::*;

pub trait EmailGateway {
    /// Delivery happens in the background, failures are only logged.
    fn compose_and_send(&self, recipients: &[EmailAddress], email: &EmailContent);
}
