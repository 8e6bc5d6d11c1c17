//! Observability module providing structured logging.
//!
//! Console logging is configurable as pretty, compact or JSON output, with
//! `RUST_LOG` taking precedence over the configured level and filter.

mod tracing_init;

pub use tracing_init::*;
