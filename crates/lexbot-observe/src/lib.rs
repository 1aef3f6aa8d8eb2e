//! Observability setup for Lexbot.

pub mod tracing_setup;
