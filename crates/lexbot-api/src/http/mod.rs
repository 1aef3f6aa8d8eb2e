//! HTTP/WebSocket surface for Lexbot.

pub mod handlers;
pub mod router;
pub mod sink;
