pub mod mailgun;
pub mod send_to_json_file;
pub mod sendmail;

pub use adorable_core::gateways::email::EmailGateway;
