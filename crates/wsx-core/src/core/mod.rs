//! Internal implementation modules for `wsx-core`.
//!
//! Most callers should go through `wsx_core::api` rather than importing these
//! modules directly.

pub mod commands;
pub mod config;
pub mod error;
pub mod tooling;
pub mod transport;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;
