use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

pub const TAG_CONTENT_TYPE: &str = "content-type";
pub const TAG_CREATED_AT: &str = "created-at";
pub const TAG_APP: &str = "app";

/// A Markdown document packaged for the storage network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkdownFile {
    pub contents: Vec<u8>,
    /// File name stored alongside the blob.
    pub identifier: String,
    pub tags: BTreeMap<String, String>,
}

impl MarkdownFile {
    /// Package Markdown text with the standard tags, stamped with `now`.
    pub fn from_markdown(content: &str, filename: &str, app_tag: &str, now: DateTime<Utc>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(TAG_CONTENT_TYPE.to_string(), "text/markdown".to_string());
        tags.insert(
            TAG_CREATED_AT.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        tags.insert(TAG_APP.to_string(), app_tag.to_string());
        Self {
            contents: content.as_bytes().to_vec(),
            identifier: filename.to_string(),
            tags,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.contents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn packages_markdown_with_tags() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let file = MarkdownFile::from_markdown("# Title\n\nbody", "notes.md", "md2walrus", now);
        assert_eq!(file.identifier, "notes.md");
        assert_eq!(file.contents, b"# Title\n\nbody");
        assert_eq!(file.tags[TAG_CONTENT_TYPE], "text/markdown");
        assert_eq!(file.tags[TAG_CREATED_AT], "2024-03-01T10:00:00.000Z");
        assert_eq!(file.tags[TAG_APP], "md2walrus");
    }

    #[test]
    fn size_counts_utf8_bytes() {
        let file = MarkdownFile::from_markdown("héllo", "a.md", "x", Utc::now());
        assert_eq!(file.size(), 6);
    }
}
