//! Shared domain types for Lexbot.
//!
//! This crate contains the core domain types used across the Lexbot
//! service: chat turns, model stream events, tool calls, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod chat;
pub mod error;
pub mod llm;
pub mod tool;
