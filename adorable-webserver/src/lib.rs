#![allow(proc_macro_derive_resolution_fallback)]
#![recursion_limit = "128"]

#[macro_use]
extern crate log;

mod adapters;
mod core;
mod web;

pub use web::{Cfg, Gateways, Services};

pub async fn run(services: Services, gateways: Gateways, cfg: Cfg) {
    web::run(services, gateways, cfg).await;
}
