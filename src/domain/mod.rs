//! Domain layer for the Reforge transformation engine
//!
//! This module contains the job model, per-file outcome types and the ports
//! through which services reach storage and external collaborators.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
