use std::{sync::Arc, time::Instant};

use adorable_core::monitoring::Metrics;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Request, Response,
};

/// Records the status and duration of every response.
pub struct RequestMetrics(pub Arc<Metrics>);

#[derive(Clone, Copy)]
struct RequestStart(Option<Instant>);

#[rocket::async_trait]
impl Fairing for RequestMetrics {
    fn info(&self) -> Info {
        Info {
            name: "Request metrics",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut rocket::Data<'_>) {
        request.local_cache(|| RequestStart(Some(Instant::now())));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let RequestStart(start) = *request.local_cache(|| RequestStart(None));
        let Some(start) = start else {
            return;
        };
        self.0.record_request(response.status().code, start.elapsed());
    }
}
