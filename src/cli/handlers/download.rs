//! Handlers for the `download` and `render` commands.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::cli::config::Config;
use crate::cli::{DownloadArgs, RenderArgs};
use crate::convert::{RenderOptions, blocks_to_markdown};
use crate::domain::BlockKind;
use crate::infra::write_atomic;
use crate::remote::{LarkClient, RemoteBlock, fetch_all_blocks};

/// Handle the download command - fetch every block, then render.
pub fn handle_download(args: &DownloadArgs, config: &Config) -> Result<()> {
    let mut client = LarkClient::new(config.client_settings())?;
    let blocks = fetch_all_blocks(&mut client, &args.document)
        .with_context(|| format!("failed to list blocks of {}", args.document))?;

    let markdown = blocks_to_markdown(&blocks, &args.document, &render_options(config, args.title));
    write_output(&markdown, args.output.as_deref())
}

/// Handle the render command - offline rendering of a saved listing.
pub fn handle_render(args: &RenderArgs, config: &Config) -> Result<()> {
    let text = std::fs::read_to_string(&args.blocks)
        .with_context(|| format!("failed to read {}", args.blocks.display()))?;
    let blocks = parse_block_dump(&text)
        .with_context(|| format!("failed to parse {}", args.blocks.display()))?;

    let root = match &args.root {
        Some(root) => root.clone(),
        None => resolve_root(&blocks)?,
    };
    let markdown = blocks_to_markdown(&blocks, &root, &render_options(config, args.title));
    write_output(&markdown, args.output.as_deref())
}

fn render_options(config: &Config, include_title: bool) -> RenderOptions {
    RenderOptions {
        languages: config.language_map(),
        include_title,
    }
}

/// Accepts a bare block array, a page (`{ "items": [...] }`), or a full
/// API response (`{ "data": { "items": [...] } }`).
pub fn parse_block_dump(text: &str) -> Result<Vec<RemoteBlock>> {
    let value: Value = serde_json::from_str(text)?;
    let items = if value.is_array() {
        value
    } else if let Some(items) = value.get("items") {
        items.clone()
    } else if let Some(items) = value.get("data").and_then(|d| d.get("items")) {
        items.clone()
    } else {
        bail!("expected a block array or an object with \"items\"");
    };
    Ok(serde_json::from_value(items)?)
}

/// The first page block, or else the parent of the first block.
pub fn resolve_root(blocks: &[RemoteBlock]) -> Result<String> {
    if let Some(page) = blocks
        .iter()
        .find(|b| b.block_type == BlockKind::Page.code())
    {
        return Ok(page.block_id.clone());
    }
    match blocks.first().and_then(|b| b.parent_id.clone()) {
        Some(parent) => Ok(parent),
        None => bail!("cannot determine the root block; pass --root"),
    }
}

fn write_output(markdown: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_atomic(path, markdown)?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}
