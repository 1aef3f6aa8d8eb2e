//! Session-service RPC implementations.

pub mod http_store;

pub use http_store::HttpSessionStore;
