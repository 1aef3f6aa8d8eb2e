//! Citation accumulator with uri-level deduplication.

use std::collections::HashSet;

use lexbot_types::chat::SourceDocument;

/// Collects the sources cited across all retrieval calls within one
/// answer, preserving insertion order and dropping repeat uris.
///
/// The first-seen title for a uri is the one retained.
#[derive(Debug, Default)]
pub struct SourceAccumulator {
    seen: HashSet<String>,
    sources: Vec<SourceDocument>,
}

impl SourceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one source; a repeat uri is silently dropped.
    pub fn add(&mut self, source: SourceDocument) {
        if self.seen.insert(source.uri.clone()) {
            self.sources.push(source);
        }
    }

    /// Add every source from a retrieval result, in order.
    pub fn extend(&mut self, sources: impl IntoIterator<Item = SourceDocument>) {
        for source in sources {
            self.add(source);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn as_slice(&self) -> &[SourceDocument] {
        &self.sources
    }

    pub fn into_vec(self) -> Vec<SourceDocument> {
        self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, uri: &str) -> SourceDocument {
        SourceDocument {
            title: title.to_string(),
            uri: uri.to_string(),
        }
    }

    #[test]
    fn test_first_seen_title_wins() {
        let mut acc = SourceAccumulator::new();
        acc.add(doc("original title", "doc/1"));
        acc.add(doc("later title", "doc/1"));
        let sources = acc.into_vec();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "original title");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut acc = SourceAccumulator::new();
        acc.extend([doc("b", "doc/2"), doc("a", "doc/1"), doc("c", "doc/3")]);
        let uris: Vec<&str> = acc.as_slice().iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["doc/2", "doc/1", "doc/3"]);
    }

    #[test]
    fn test_dedup_across_extends() {
        let mut acc = SourceAccumulator::new();
        acc.extend([doc("a", "doc/1")]);
        acc.extend([doc("a again", "doc/1"), doc("b", "doc/2")]);
        assert_eq!(acc.as_slice().len(), 2);
    }

    #[test]
    fn test_empty() {
        let acc = SourceAccumulator::new();
        assert!(acc.is_empty());
        assert!(acc.into_vec().is_empty());
    }
}
