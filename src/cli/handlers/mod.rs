//! Command handlers for the CLI.

mod convert;
mod download;
mod upload;


use crate::domain::ImageRef;
use crate::remote::{ImageBinder, RemoteError};

pub use convert::{dispatch_plan_json, handle_convert};
pub use download::{handle_download, handle_render, parse_block_dump, resolve_root};
pub use upload::{handle_create, handle_upload, upload_conversion};

// ===========================================
// Shared Utilities
// ===========================================

/// Image binder that leaves placeholders empty and says so.
///
/// Uploading picture data is not part of this tool; the placeholder block
/// keeps its position so it can be filled in by hand.
#[derive(Debug, Default)]
pub(crate) struct LoggingBinder {
    pub(crate) pending: Vec<String>,
}

impl ImageBinder for LoggingBinder {
    fn bind_image(
        &mut self,
        _document_id: &str,
        block_id: &str,
        image: &ImageRef,
    ) -> Result<(), RemoteError> {
        log::warn!(
            "image '{}' left as an empty placeholder in block {}",
            image.source,
            block_id
        );
        self.pending.push(block_id.to_string());
        Ok(())
    }
}
