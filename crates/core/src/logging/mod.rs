//! Logging setup for native front ends
//!
//! Library code only emits `tracing` events; binaries call [`init_tracing`]
//! once at startup to install a subscriber.

pub mod config;
pub mod init;

pub use config::InstrumentationConfig;
pub use init::{init_default, init_dev, init_tracing};
