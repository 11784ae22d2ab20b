//! Observability: logging/tracing bootstrap for ledger processes.

pub mod tracing;

pub use crate::tracing::init;
