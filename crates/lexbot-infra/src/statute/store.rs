//! S3-backed statute chapter archive with adjacent-chapter fallback.
//!
//! Document identity follows the archive's key scheme:
//! `{law_type}/{year}/chapter-{n}.txt`. The raw object fetch is behind
//! the [`ObjectFetcher`] seam so the fallback logic is testable without
//! an object store.

use secrecy::{ExposeSecret, SecretString};

use lexbot_core::statute::{StatuteStore, CHAPTER_NOT_FOUND};
use lexbot_types::error::StatuteError;

/// Raw object fetch: `Ok(None)` means the key does not exist; `Err` is
/// a real backend failure and is never masked.
pub trait ObjectFetcher: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StatuteError>> + Send;
}

/// Object fetcher reading from an S3 bucket over HTTPS.
pub struct S3ObjectFetcher {
    client: reqwest::Client,
    api_key: SecretString,
    bucket: String,
    region: String,
}

impl S3ObjectFetcher {
    pub fn new(
        client: reqwest::Client,
        api_key: SecretString,
        bucket: String,
        region: String,
    ) -> Self {
        Self {
            client,
            api_key,
            bucket,
            region,
        }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}

impl ObjectFetcher for S3ObjectFetcher {
    async fn get(&self, key: &str) -> Result<Option<String>, StatuteError> {
        let url = self.url(key);
        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| StatuteError::Backend(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 404 {
            tracing::debug!(key = %key, bucket = %self.bucket, "no such object");
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(StatuteError::Backend(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| StatuteError::Backend(format!("body read failed: {e}")))?;
        Ok(Some(text))
    }
}

/// Build the archive key for one chapter.
pub fn chapter_key(law_type: &str, year: &str, chapter: i64) -> String {
    format!("{law_type}/{year}/chapter-{chapter}.txt")
}

/// Chapter archive implementing [`StatuteStore`] over any object fetch.
pub struct StatuteArchive<F> {
    fetcher: F,
}

impl<F: ObjectFetcher> StatuteArchive<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: ObjectFetcher> StatuteStore for StatuteArchive<F> {
    async fn fetch_chapter(
        &self,
        year: &str,
        law_type: &str,
        chapter: &str,
    ) -> Result<String, StatuteError> {
        let number: i64 = chapter
            .trim()
            .parse()
            .map_err(|_| StatuteError::InvalidChapter(chapter.to_string()))?;

        if let Some(text) = self.fetcher.get(&chapter_key(law_type, year, number)).await? {
            return Ok(text);
        }

        tracing::warn!(year, law_type, chapter = number, "chapter missing, trying neighbors");

        let mut combined = String::new();
        for adjacent in [number - 1, number + 1] {
            if let Some(text) = self
                .fetcher
                .get(&chapter_key(law_type, year, adjacent))
                .await?
            {
                combined.push_str(&text);
            }
        }

        if combined.is_empty() {
            Ok(CHAPTER_NOT_FOUND.to_string())
        } else {
            Ok(combined)
        }
    }
}
