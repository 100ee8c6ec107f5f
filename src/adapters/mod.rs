//! Infrastructure adapters for external systems.

pub mod ai;
pub mod http;
pub mod memory;
pub mod sqlite;
pub mod verifier;
pub mod workspace;

pub use workspace::LocalWorkspace;
