//! Infrastructure layer module
//!
//! Configuration loading, logging setup and the wiring that assembles the
//! concrete adapters into a running orchestrator.

pub mod config;
pub mod logging;
pub mod setup;
