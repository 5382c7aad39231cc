//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Result of uploading one file.
#[derive(Debug, Serialize)]
pub struct UploadOutput {
    pub document_id: String,
    pub parent_id: String,
    pub start_index: usize,
    pub created: usize,
    pub calls: usize,
    pub block_ids: Vec<String>,
    pub images_pending: usize,
}

/// Print `data` as pretty JSON wrapped in `{ "data": ... }`.
pub fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&Output::new(data))?);
    Ok(())
}
