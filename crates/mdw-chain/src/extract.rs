//! Field extraction from raw ledger blob objects.
//!
//! Each logical attribute is looked up under a prioritized list of alias keys,
//! since objects written by different package versions name their fields
//! differently. Extraction is total: a missing or oddly typed field falls
//! back to a default, and only an object with no content section (or no
//! usable identifier at all) yields `None`.

use chrono::{SecondsFormat, TimeZone, Utc};
use mdw_types::record::{now_iso8601, UNKNOWN_FILENAME, UNKNOWN_OWNER};
use mdw_types::BlobRecord;
use serde_json::{Map, Value};
use tracing::debug;

use crate::rpc::RawChainObject;

const BLOB_ID_KEYS: &[&str] = &["blob_id", "blobId"];
const FILENAME_KEYS: &[&str] = &["filename", "name"];
const SIZE_KEYS: &[&str] = &["size", "length", "content_length"];
const CREATED_AT_KEYS: &[&str] = &["created_at", "createdAt", "timestamp"];
const CONTENT_KEYS: &[&str] = &["content", "data", "text", "body"];

/// Build a [`BlobRecord`] from a raw ledger object.
///
/// Returns `None` if the object has no content section or carries neither a
/// blob id nor an object id.
pub fn extract_record(raw: &RawChainObject) -> Option<BlobRecord> {
    let data = raw.0.get("data")?;
    let Some(content) = data.get("content").filter(|c| !c.is_null()) else {
        debug!(object_id = ?raw.object_id(), "skipping object without content section");
        return None;
    };

    let empty = Map::new();
    let fields = content.get("fields").and_then(Value::as_object).unwrap_or(&empty);
    let display = display_fields(data).unwrap_or(&empty);

    let raw_identifier = first_string(fields, BLOB_ID_KEYS);
    let chain_object_id = data.get("objectId").and_then(Value::as_str).map(str::to_string);

    let filename = first_string(fields, FILENAME_KEYS)
        .or_else(|| first_string(display, &["name"]))
        .unwrap_or_else(|| UNKNOWN_FILENAME.to_string());
    let size = first_u64(fields, SIZE_KEYS).unwrap_or(0);
    let created_at = first_timestamp(fields, CREATED_AT_KEYS).unwrap_or_else(now_iso8601);
    let owner = data
        .pointer("/owner/AddressOwner")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_OWNER)
        .to_string();

    let mut record = BlobRecord::new(raw_identifier, chain_object_id)?
        .with_filename(filename)
        .with_size(size)
        .with_created_at(created_at)
        .with_owner(owner);
    if let Some(text) = first_string(fields, CONTENT_KEYS) {
        record = record.with_content(text);
    }
    Some(record)
}

/// Display metadata lives under `display.data` on current nodes and directly
/// under `display` on older ones.
fn display_fields(data: &Value) -> Option<&Map<String, Value>> {
    let display = data.get("display")?;
    display
        .get("data")
        .and_then(Value::as_object)
        .or_else(|| display.as_object())
}

fn first_string(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_u64(fields: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Strings are passed through; numbers are epoch milliseconds.
fn first_timestamp(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            let millis = n.as_i64()?;
            let time = Utc.timestamp_millis_opt(millis).single()?;
            Some(time.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blob_object(fields: Value) -> RawChainObject {
        RawChainObject(json!({
            "data": {
                "objectId": "0x5b1c8a0f",
                "content": { "dataType": "moveObject", "fields": fields },
                "owner": { "AddressOwner": "0xowner" }
            }
        }))
    }

    #[test]
    fn extracts_current_schema() {
        let raw = blob_object(json!({
            "blob_id": "255",
            "size": "1024",
            "filename": "notes.md",
            "created_at": "2024-03-01T10:00:00.000Z",
            "deletable": true
        }));
        let record = extract_record(&raw).unwrap();
        assert_eq!(record.blob_id(), "0xff");
        assert_eq!(record.raw_identifier.as_deref(), Some("255"));
        assert_eq!(record.url_safe_identifier.as_deref(), Some("_w"));
        assert_eq!(record.chain_object_id.as_deref(), Some("0x5b1c8a0f"));
        assert_eq!(record.filename, "notes.md");
        assert_eq!(record.size_bytes, 1024);
        assert_eq!(record.created_at, "2024-03-01T10:00:00.000Z");
        assert_eq!(record.owner, "0xowner");
        assert!(record.content.is_none());
    }

    #[test]
    fn extracts_alias_keys() {
        let raw = blob_object(json!({
            "blobId": 42,
            "length": 7,
            "name": "alias.md",
            "timestamp": 1_700_000_000_000i64,
            "text": "# hello"
        }));
        let record = extract_record(&raw).unwrap();
        assert_eq!(record.raw_identifier.as_deref(), Some("42"));
        assert_eq!(record.blob_id(), "0x2a");
        assert_eq!(record.filename, "alias.md");
        assert_eq!(record.size_bytes, 7);
        assert_eq!(record.created_at, "2023-11-14T22:13:20.000Z");
        assert_eq!(record.content.as_deref(), Some("# hello"));
    }

    #[test]
    fn falls_back_to_display_name_and_defaults() {
        let raw = RawChainObject(json!({
            "data": {
                "objectId": "0xabc",
                "content": { "fields": { "size": "not-a-number" } },
                "display": { "data": { "name": "From display.md" } }
            }
        }));
        let record = extract_record(&raw).unwrap();
        assert_eq!(record.blob_id(), "0xabc");
        assert_eq!(record.filename, "From display.md");
        assert_eq!(record.size_bytes, 0);
        assert_eq!(record.owner, UNKNOWN_OWNER);
        assert!(record.created_at_time().is_some());
    }

    #[test]
    fn missing_content_is_none() {
        let raw = RawChainObject(json!({ "data": { "objectId": "0xabc" } }));
        assert!(extract_record(&raw).is_none());

        let raw = RawChainObject(json!({ "data": { "objectId": "0xabc", "content": null } }));
        assert!(extract_record(&raw).is_none());

        let raw = RawChainObject(json!({ "error": { "code": "notExists" } }));
        assert!(extract_record(&raw).is_none());
    }

    #[test]
    fn no_identifier_is_none() {
        let raw = RawChainObject(json!({
            "data": { "content": { "fields": { "filename": "orphan.md" } } }
        }));
        assert!(extract_record(&raw).is_none());
    }

    #[test]
    fn content_without_fields_uses_object_id() {
        let raw = RawChainObject(json!({
            "data": { "objectId": "0xabc", "content": { "dataType": "package" } }
        }));
        let record = extract_record(&raw).unwrap();
        assert_eq!(record.blob_id(), "0xabc");
        assert_eq!(record.filename, UNKNOWN_FILENAME);
    }
}
