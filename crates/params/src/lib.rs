//! Consensus-critical parameters of the naming protocol.

mod params;
pub mod serde_helpers;

pub use params::*;
