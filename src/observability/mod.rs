//! Observability: structured logging setup for the CLI and embedding services.

#[cfg(feature = "cli")]
mod tracing_init;

#[cfg(feature = "cli")]
pub use tracing_init::*;
