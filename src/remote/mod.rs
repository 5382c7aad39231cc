//! The remote document service, seen through injected capabilities.
//!
//! The conversion engine only talks to the traits in this module. The
//! blocking HTTP client in [`http`] is one implementation; tests use
//! in-memory fakes.

mod http;
mod pagination;
pub mod wire;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{BlockDescriptor, ImageRef, TableSpec};

pub use http::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, LarkClient, MAX_PAGE_SIZE};
pub use pagination::{PaginationError, fetch_all_blocks};

/// Errors reported by a remote capability.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("vendor error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("expected {expected} blocks to be created, vendor reported {created}")]
    ShortCreate { expected: usize, created: usize },

    #[error("no access token configured")]
    MissingToken,
}

/// Result of one children-creation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedBlocks {
    pub created_count: usize,
    /// Ids of the created blocks, in request order.
    pub ids: Vec<String>,
}

/// One block as returned by the document-read API.
///
/// The type-specific payload stays as raw JSON keyed by field name
/// (`heading1`, `code`, `table`...); the renderer picks what it knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteBlock {
    pub block_id: String,
    pub block_type: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RemoteBlock {
    /// Payload object stored under `name`, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// One page of a block listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlockPage {
    #[serde(default)]
    pub items: Vec<RemoteBlock>,
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Creates blocks in a document.
pub trait BlockSink {
    /// Inserts `blocks` under `parent_id` starting at `index`, in one call.
    fn create_blocks(
        &mut self,
        document_id: &str,
        parent_id: &str,
        index: usize,
        blocks: &[BlockDescriptor],
    ) -> Result<CreatedBlocks, RemoteError>;

    /// Creates a table and all of its cells atomically. Returns the table's id.
    fn create_table(
        &mut self,
        document_id: &str,
        parent_id: &str,
        index: usize,
        table: &TableSpec,
    ) -> Result<String, RemoteError>;
}

/// Lists the blocks of a document, one page at a time.
pub trait BlockSource {
    fn list_blocks(
        &mut self,
        document_id: &str,
        page_token: Option<&str>,
    ) -> Result<BlockPage, RemoteError>;
}

/// Attaches picture data to a created image placeholder.
pub trait ImageBinder {
    fn bind_image(
        &mut self,
        document_id: &str,
        block_id: &str,
        image: &ImageRef,
    ) -> Result<(), RemoteError>;
}
