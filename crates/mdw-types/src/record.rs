use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::blob_id::{decimal_to_hex, decimal_to_url_safe_base64, is_decimal};
use crate::network::Network;

/// Filename used when a record carries none.
pub const UNKNOWN_FILENAME: &str = "unknown.md";

/// Owner used when a record carries none.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Canonical record of a stored Markdown document.
///
/// The display identifier (`blob_id`) is picked once, at construction, by
/// priority: converted hex form, then the raw identifier, then the ledger
/// object id. It is never empty and never recomputed.
///
/// Serialized field names match the layout the browser app kept in local
/// storage, so older caches still load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRecord {
    blob_id: String,
    /// Raw decimal u256 identifier as reported by the ledger.
    #[serde(default, alias = "walrusBlobId", skip_serializing_if = "Option::is_none")]
    pub raw_identifier: Option<String>,
    /// `0x` hex form of the raw identifier.
    #[serde(default, alias = "convertedBlobId", skip_serializing_if = "Option::is_none")]
    pub converted_identifier: Option<String>,
    /// URL-safe base64 form of the raw identifier.
    #[serde(default, alias = "urlSafeBase64Id", skip_serializing_if = "Option::is_none")]
    pub url_safe_identifier: Option<String>,
    /// Id of the ledger object wrapping the blob.
    #[serde(default, alias = "suiObjectId", skip_serializing_if = "Option::is_none")]
    pub chain_object_id: Option<String>,
    pub filename: String,
    #[serde(default, alias = "size")]
    pub size_bytes: u64,
    /// ISO-8601 creation time.
    pub created_at: String,
    pub owner: String,
    /// Document text; only present when cached locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl BlobRecord {
    /// Build a record from whichever identifiers are available.
    ///
    /// Returns `None` when neither identifier is usable. A purely numeric raw
    /// identifier is also converted into its hex and URL-safe base64 forms.
    pub fn new(raw_identifier: Option<String>, chain_object_id: Option<String>) -> Option<Self> {
        let raw_identifier = raw_identifier.filter(|s| !s.trim().is_empty());
        let chain_object_id = chain_object_id.filter(|s| !s.trim().is_empty());

        let (converted_identifier, url_safe_identifier) = match raw_identifier.as_deref() {
            Some(raw) if is_decimal(raw) => {
                (decimal_to_hex(raw).ok(), decimal_to_url_safe_base64(raw))
            }
            _ => (None, None),
        };

        let blob_id = converted_identifier
            .clone()
            .or_else(|| raw_identifier.clone())
            .or_else(|| chain_object_id.clone())?;

        Some(Self {
            blob_id,
            raw_identifier,
            converted_identifier,
            url_safe_identifier,
            chain_object_id,
            filename: UNKNOWN_FILENAME.to_string(),
            size_bytes: 0,
            created_at: now_iso8601(),
            owner: UNKNOWN_OWNER.to_string(),
            content: None,
        })
    }

    /// Record for a document this client just saved.
    pub fn for_saved_document(
        blob_id: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
        owner: impl Into<String>,
    ) -> Option<Self> {
        let content = content.into();
        Some(
            Self::new(Some(blob_id.into()), None)?
                .with_filename(filename)
                .with_size(content.len() as u64)
                .with_owner(owner)
                .with_content(content),
        )
    }

    /// Set the stored file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Set the blob size in bytes.
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Set the creation time. Expected to be ISO-8601; anything else sorts
    /// last in listings.
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    /// Set the owning address.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Attach the document text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// The display identifier.
    pub fn blob_id(&self) -> &str {
        &self.blob_id
    }

    /// Whether the display identifier is usable. Only false for records
    /// deserialized from a damaged store.
    pub fn is_valid(&self) -> bool {
        !self.blob_id.trim().is_empty()
    }

    /// Parsed `created_at`, if it is valid RFC 3339.
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Explorer page for this record.
    pub fn explorer_url(&self, network: Network) -> String {
        network.explorer_blob_url(&self.blob_id)
    }

    /// Fold a newer record with the same id into this one.
    ///
    /// The newer record's fields win. Optional fields the newer record lacks
    /// (identifiers, cached `content`) keep their current values.
    pub fn merge_from(&mut self, newer: BlobRecord) {
        let raw_identifier = newer.raw_identifier.or_else(|| self.raw_identifier.take());
        let converted_identifier = newer
            .converted_identifier
            .or_else(|| self.converted_identifier.take());
        let url_safe_identifier = newer
            .url_safe_identifier
            .or_else(|| self.url_safe_identifier.take());
        let chain_object_id = newer.chain_object_id.or_else(|| self.chain_object_id.take());
        let content = newer.content.or_else(|| self.content.take());
        *self = BlobRecord {
            raw_identifier,
            converted_identifier,
            url_safe_identifier,
            chain_object_id,
            content,
            ..newer
        };
    }
}

/// Current time as an ISO-8601 string with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
