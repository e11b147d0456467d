//! Operational configuration for a name-index node.
//!
//! Everything here is node-local tuning; protocol-identity values live in
//! `stela-params`.

pub mod btcio;
mod config;

pub use config::*;
