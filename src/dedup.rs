//! Record deduplication.
//!
//! Overlapping selectors and repeated scans return the same comment through
//! different structural paths. Records are keyed on author plus body and only
//! the first occurrence of a key survives.

use std::collections::HashSet;

use tracing::debug;

use crate::dom;
use crate::options::DedupStrategy;
use crate::result::ChildRecord;

/// Derive the deduplication key for a record.
///
/// `author` is the display name, or the profile link when no name was found.
/// The body is whitespace-normalized before keying. With
/// `DedupStrategy::Prefix` only the first `len` characters take part.
#[must_use]
pub fn derive_key(author: &str, text: &str, strategy: DedupStrategy) -> String {
    let body = dom::normalize_whitespace(text);
    match strategy {
        DedupStrategy::Prefix { len } => {
            let prefix: String = body.chars().take(len).collect();
            format!("{author}:{prefix}")
        }
        DedupStrategy::ContentHash => {
            format!("{author}:{}", blake3::hash(body.as_bytes()).to_hex())
        }
    }
}

/// Keys seen so far in one harvest.
///
/// Create one per invocation; it is never shared between runs.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    dropped: usize,
}

impl Deduplicator {
    /// Empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the key and report whether this is its first occurrence.
    pub fn admit(&mut self, record: &ChildRecord) -> bool {
        if self.seen.insert(record.dedup_key.clone()) {
            true
        } else {
            debug!(key = %record.dedup_key, "dropping duplicate record");
            self.dropped += 1;
            false
        }
    }

    /// Keep the first occurrence of each key, preserving order.
    pub fn filter(&mut self, records: Vec<ChildRecord>) -> Vec<ChildRecord> {
        records.into_iter().filter(|r| self.admit(r)).collect()
    }

    /// Number of records rejected so far.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX_30: DedupStrategy = DedupStrategy::Prefix { len: 30 };

    fn record(author: &str, text: &str, strategy: DedupStrategy) -> ChildRecord {
        ChildRecord {
            author: author.to_string(),
            text: text.to_string(),
            dedup_key: derive_key(author, text, strategy),
            ..ChildRecord::default()
        }
    }

    #[test]
    fn test_prefix_key_truncates_by_chars() {
        assert_eq!(derive_key("Ana", "short", PREFIX_30), "Ana:short");

        let long = "é".repeat(40);
        let key = derive_key("Ana", &long, PREFIX_30);
        assert_eq!(key, format!("Ana:{}", "é".repeat(30)));
    }

    #[test]
    fn test_key_normalizes_whitespace() {
        assert_eq!(
            derive_key("Ana", "  hello \n  world ", PREFIX_30),
            derive_key("Ana", "hello world", PREFIX_30)
        );
    }

    #[test]
    fn test_content_hash_key_distinguishes_long_shared_prefix() {
        let shared = "This opening sentence is definitely longer than thirty characters";
        let a = format!("{shared} and then says one thing.");
        let b = format!("{shared} and then says another.");

        assert_eq!(derive_key("Ana", &a, PREFIX_30), derive_key("Ana", &b, PREFIX_30));
        assert_ne!(
            derive_key("Ana", &a, DedupStrategy::ContentHash),
            derive_key("Ana", &b, DedupStrategy::ContentHash)
        );
        assert!(derive_key("Ana", &a, DedupStrategy::ContentHash).starts_with("Ana:"));
    }

    #[test]
    fn test_filter_keeps_first_seen_order() {
        let records = vec![
            record("A", "first comment", PREFIX_30),
            record("B", "second comment", PREFIX_30),
            record("A", "first comment", PREFIX_30),
            record("C", "third comment", PREFIX_30),
            record("B", "second comment", PREFIX_30),
        ];

        let mut dedup = Deduplicator::new();
        let kept = dedup.filter(records);

        let texts: Vec<_> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first comment", "second comment", "third comment"]);
        assert_eq!(dedup.dropped(), 2);
    }

    #[test]
    fn test_same_text_different_author_is_kept() {
        let mut dedup = Deduplicator::new();
        let kept = dedup.filter(vec![
            record("A", "+1", PREFIX_30),
            record("B", "+1", PREFIX_30),
        ]);

        assert_eq!(kept.len(), 2);
        assert_eq!(dedup.dropped(), 0);
    }

    #[test]
    fn test_separate_instances_are_independent() {
        let r = record("A", "hello", PREFIX_30);

        let mut first = Deduplicator::new();
        assert!(first.admit(&r));
        assert!(!first.admit(&r));

        let mut second = Deduplicator::new();
        assert!(second.admit(&r));
    }

    #[test]
    fn test_filter_empty() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.filter(Vec::new()).is_empty());
    }
}
