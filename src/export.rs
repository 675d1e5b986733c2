//! Result set serialization.
//!
//! The exporter produces bytes and a file name; persisting them is the
//! caller's job.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::error::Result;
use crate::options::Options;
use crate::result::ResultSet;

/// File extension of the payload.
pub const EXTENSION: &str = "json";

/// Last timestamp handed out, so names stay strictly increasing.
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Serialized payload plus where the caller should put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// UTF-8 JSON document.
    pub payload: Vec<u8>,

    /// `<source>_<epoch-millis>.json`
    pub suggested_name: String,
}

/// Serialize a result set.
///
/// The payload depends only on `result` and `options.pretty`; the creation
/// time appears in the suggested name alone.
///
/// # Errors
///
/// Returns `Error::Export` if serialization fails. Nothing is written.
pub fn export(result: &ResultSet, options: &Options) -> Result<Export> {
    let payload = serialize(result, options.pretty)?;
    let suggested_name = suggested_name(&options.source_label, next_stamp());
    Ok(Export { payload, suggested_name })
}

/// Serialize without naming.
///
/// # Errors
///
/// Returns `Error::Export` if serialization fails.
pub fn serialize(result: &ResultSet, pretty: bool) -> Result<Vec<u8>> {
    let payload = if pretty {
        serde_json::to_vec_pretty(result)?
    } else {
        serde_json::to_vec(result)?
    };
    Ok(payload)
}

/// Build `<source>_<millis>.json`, replacing characters that are unsafe in
/// file names.
#[must_use]
pub fn suggested_name(source_label: &str, millis: i64) -> String {
    let mut source: String = source_label
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if source.is_empty() {
        source.push_str("thread");
    }
    format!("{source}_{millis}.{EXTENSION}")
}

/// Current epoch millis, bumped past the previous stamp if the clock has not
/// moved on.
fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or(now);
    now.max(previous + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ChildRecord, ParentRecord};

    fn sample() -> ResultSet {
        ResultSet {
            parent: ParentRecord {
                author: "Grace".to_string(),
                content: "Post body".to_string(),
                source_url: "https://example.com/p/1".to_string(),
                engagement_count: 12,
                ..ParentRecord::default()
            },
            children: vec![ChildRecord {
                author: "Ada".to_string(),
                text: "Nice \"quoted\" reply \u{1F600}".to_string(),
                dedup_key: "Ada:Nice \"quoted\" reply \u{1F600}".to_string(),
                ..ChildRecord::default()
            }],
        }
    }

    #[test]
    fn test_payload_round_trips() {
        let result = sample();
        let export = export(&result, &Options::default()).unwrap();

        let parsed: ResultSet = serde_json::from_slice(&export.payload).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_payload_field_names() {
        let export = export(&sample(), &Options { pretty: false, ..Options::default() }).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&export.payload).unwrap();

        assert_eq!(value["parent"]["engagement_count"], 12);
        assert_eq!(value["parent"]["source_url"], "https://example.com/p/1");
        assert_eq!(value["children"][0]["author"], "Ada");
        assert!(value["children"][0]["dedup_key"].is_string());
        assert!(!String::from_utf8(export.payload).unwrap().contains('\n'));
    }

    #[test]
    fn test_payload_is_stable_across_exports() {
        let options = Options::default();
        let first = export(&sample(), &options).unwrap();
        let second = export(&sample(), &options).unwrap();

        assert_eq!(first.payload, second.payload);
        assert_ne!(first.suggested_name, second.suggested_name);
    }

    #[test]
    fn test_suggested_name_format() {
        assert_eq!(suggested_name("linkedin_post", 1_700_000_000_000), "linkedin_post_1700000000000.json");
        assert_eq!(suggested_name("my post/1", 5), "my_post_1_5.json");
        assert_eq!(suggested_name("  ", 5), "thread_5.json");
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let stamps: Vec<i64> = (0..50).map(|_| next_stamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_result_set_exports() {
        let export = export(&ResultSet::default(), &Options::default()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&export.payload).unwrap();

        assert_eq!(value["children"], serde_json::json!([]));
        assert!(export.suggested_name.starts_with("thread_"));
        assert!(export.suggested_name.ends_with(".json"));
    }
}
