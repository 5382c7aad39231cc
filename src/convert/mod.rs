//! Bidirectional conversion between Markdown and vendor blocks.
//!
//! Upload path: Markdown → [`markdown_to_blocks`] → [`plan_dispatch`] →
//! [`Uploader`]. Download path: [`fetch_all_blocks`](crate::remote::fetch_all_blocks)
//! → [`blocks_to_markdown`].

mod inline;
pub mod plan;
mod summary;
mod to_blocks;
mod to_markdown;

use pulldown_cmark::Options;

pub use inline::{emit_runs, extract_runs};
pub use plan::{
    DispatchError, DispatchUnit, ImageBinding, MAX_BATCH_SIZE, PlanOptions, UploadReport, Uploader,
    bind_images, plan_dispatch,
};
pub use summary::ConversionSummary;
pub use to_blocks::{
    Conversion, ConvertOptions, DEFAULT_PARAGRAPH_LIMIT, ImageReference, markdown_to_blocks,
};
pub use to_markdown::{RenderOptions, blocks_to_markdown};

/// Parser extensions enabled for every conversion.
pub(crate) fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);
    options
}
