//! # adorable-gateways
//!
//! Implementations of the gateway traits of `adorable-core`
//! that talk to external services.

use adorable_core::circuit_breaker::{CircuitBreaker, CircuitError};

pub mod email;
pub mod firebase;
pub mod imagemagick;
pub mod local_storage;
pub mod notify;
pub mod opencage;
pub mod redis_cache;
mod user_communication;

/// Runs `f` through the breaker if there is one.
fn guarded<T, F>(breaker: Option<&CircuitBreaker>, f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    let Some(breaker) = breaker else {
        return f();
    };
    breaker.call(f).map_err(|err| match err {
        CircuitError::Open(name) => anyhow::anyhow!("Circuit '{name}' is open"),
        CircuitError::Inner(err) => err,
    })
}
