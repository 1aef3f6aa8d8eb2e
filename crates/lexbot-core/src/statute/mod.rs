//! Statute chapter fetch collaborator contract.

use lexbot_types::error::StatuteError;

/// Sentinel returned when neither the requested chapter nor either
/// adjacent chapter exists in the archive.
pub const CHAPTER_NOT_FOUND: &str = "Chapter not found!";

/// Trait for the document-chapter store.
///
/// Implementations live in lexbot-infra (e.g., `StatuteArchive`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait StatuteStore: Send + Sync {
    /// Fetch one chapter's text by year, series (`acts`/`resolves`), and
    /// chapter number.
    ///
    /// A missing chapter falls back to the two adjacent chapter numbers,
    /// concatenating whatever exists; when neither exists the fixed
    /// [`CHAPTER_NOT_FOUND`] sentinel is returned as `Ok`. Real backend
    /// failures (and non-numeric chapter input) are `Err` -- the engine
    /// treats those as a local tool failure, not a request failure.
    fn fetch_chapter(
        &self,
        year: &str,
        law_type: &str,
        chapter: &str,
    ) -> impl std::future::Future<Output = Result<String, StatuteError>> + Send;
}
