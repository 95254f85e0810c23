//! Foundation types for md2walrus.
//!
//! This crate provides the identifier, record, and state types shared by every
//! other md2walrus crate.
//!
//! # Key Types
//!
//! - [`IdFormat`]: Textual format of a blob identifier (decimal, hex, object id)
//! - [`BlobRecord`]: Canonical record of a stored Markdown document
//! - [`SaveStage`] / [`SaveState`]: Progress of one save through the write protocol
//! - [`Network`]: The ledger network a client talks to

pub mod blob_id;
pub mod error;
pub mod network;
pub mod record;
pub mod save_state;

pub use blob_id::{
    convert_id, decimal_to_bytes, decimal_to_hex, decimal_to_url_safe_base64, detect_format,
    hex_to_decimal, short_blob_id, url_safe_base64_to_decimal, IdFormat, TargetFormat,
};
pub use error::{TypeError, TypeResult};
pub use network::Network;
pub use record::{now_iso8601, BlobRecord};
pub use save_state::{SaveStage, SaveState};
