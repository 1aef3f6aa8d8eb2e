//! Orchestration engine and collaborator trait definitions for Lexbot.
//!
//! This crate defines the "ports" (collaborator traits) that the
//! infrastructure layer implements, plus the streaming tool-use engine
//! that drives a generative model through think -> call tool -> resume
//! rounds. It depends only on `lexbot-types` -- never on `lexbot-infra`
//! or any HTTP crate.

pub mod agent;
pub mod llm;
pub mod retrieval;
pub mod session;
pub mod sink;
pub mod statute;
