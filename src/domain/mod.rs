//! Core types: block kinds and payloads, styled runs, language codes

mod block;
mod language;
mod run;

pub use block::{
    Align, BlockDescriptor, BlockError, BlockKind, BlockPayload, ImageRef, ListKind, TableSpec,
    count_blocks,
};
pub use language::{LanguageMap, PLAIN_TEXT};
pub use run::{RunList, StyledRun};
