//! # adorable-core
//!
//! Business logic of the Adorable backend: repository and gateway
//! abstractions, use cases, post-write fan-out, background job
//! policies and the cache based cross-cutting services
//! (rate limiting, circuit breaking, request signing, metrics).

pub mod cache;
pub mod circuit_breaker;
pub mod db;
pub mod events;
pub mod fanout;
pub mod gateways;
pub mod jobs;
pub mod monitoring;
pub mod rate_limit;
pub mod repositories;
pub mod security;
pub mod usecases;
pub mod util;

pub mod entities {
    pub use adorable_entities::{
        activity::*, chat::*, email::*, file::*, geo::*, id::*, job::*, location::*, nonce::*,
        notification::*, password::*, place::*, rating::*, review::*, social::*, time::*,
        user::*,
    };
}
