//! EXIF extraction from fetched bytes.
//!
//! Tags are flattened into a string-keyed map and serialized to a single JSON
//! string stored in the sample metadata. Extraction is strictly best-effort:
//! any failure degrades to `None` and never fails the sample.

use exif::Reader;
use std::collections::BTreeMap;
use std::io::Cursor;

/// Decode EXIF tags from raw image bytes into a JSON string of
/// `tag name -> display value`.
///
/// Returns `None` when the payload carries no EXIF container, when parsing
/// fails, or when serialization fails.
pub fn extract_exif(data: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(data);
    let exif = Reader::new().read_from_container(&mut cursor).ok()?;

    let mut tags: BTreeMap<String, String> = BTreeMap::new();
    for field in exif.fields() {
        let value = field.display_value().to_string();
        let value = value.trim().trim_matches('"').trim();
        if value.is_empty() {
            continue;
        }
        tags.insert(field.tag.to_string(), value.to_string());
    }

    if tags.is_empty() {
        return None;
    }
    serde_json::to_string(&tags).ok()
}
