#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(test, deny(warnings))]

//! # adorable-entities
//!
//! Reusable, agnostic domain entities for the Adorable backend.
//!
//! The entities only contain generic functionality that does not reveal any application-specific business logic.

pub mod activity;
pub mod chat;
pub mod email;
pub mod file;
pub mod geo;
pub mod id;
pub mod job;
pub mod location;
pub mod nonce;
pub mod notification;
pub mod password;
pub mod place;
pub mod rating;
pub mod review;
pub mod social;
pub mod time;
pub mod user;

#[cfg(any(test, feature = "builders"))]
pub mod builders;
