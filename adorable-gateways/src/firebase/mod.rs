//! Firebase services: identity lookup, realtime database and
//! cloud messaging, all accessed through their REST APIs.

mod identity;
mod push;
mod realtime;

pub use self::{identity::*, push::*, realtime::*};

use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn blocking_client() -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
}
