//! Session persistence collaborator contract.
//!
//! The session service is the only writer of durable conversation
//! state. The engine reads it once at the end of a request (to decide
//! between creating and updating) and writes once. There is no
//! optimistic-concurrency check: two simultaneous requests against the
//! same session race with last-writer-wins semantics.

use lexbot_types::chat::{ConversationTurn, SaveOperation};
use lexbot_types::error::SessionStoreError;

/// Trait for the durable session record store.
///
/// Implementations live in lexbot-infra (e.g., `HttpSessionStore`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionStore: Send + Sync {
    /// Load a session's turn history. `None` signals a session that does
    /// not exist yet.
    fn load(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<ConversationTurn>>, SessionStoreError>> + Send;

    /// Append a turn, creating the session when `op` is `AddSession`.
    ///
    /// `title` is only meaningful for `AddSession`; updates pass an
    /// empty string -- a title is computed at most once per session.
    fn save(
        &self,
        op: SaveOperation,
        user_id: &str,
        session_id: &str,
        entry: &ConversationTurn,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), SessionStoreError>> + Send;
}
