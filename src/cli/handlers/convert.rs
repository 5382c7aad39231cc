//! Handler for the `convert` command.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::{Value, json};

use crate::cli::ConvertArgs;
use crate::cli::config::Config;
use crate::cli::output::{OutputFormat, print_json};
use crate::convert::{
    ConversionSummary, DispatchUnit, PlanOptions, markdown_to_blocks, plan_dispatch,
};
use crate::domain::{BlockDescriptor, BlockPayload};
use crate::infra::{read_markdown, scan_markdown_files};
use crate::remote::wire::{children_request, table_request};

#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    title: Option<String>,
    summary: ConversionSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    plan: Vec<Value>,
}

/// Handle the convert command - convert without touching the network.
pub fn handle_convert(args: &ConvertArgs, config: &Config) -> Result<()> {
    let files = source_files(&args.path)?;
    let convert_options = config.convert_options();
    let plan_options = config.plan_options();

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let source = read_markdown(&path)?;
        let conversion = markdown_to_blocks(&source.body, &convert_options);
        log::info!("{}: {} top-level blocks", path.display(), conversion.blocks.len());

        reports.push(FileReport {
            title: source.title(),
            summary: ConversionSummary::new(&conversion, plan_options),
            images: conversion
                .images
                .iter()
                .map(|r| r.image.source.clone())
                .collect(),
            plan: dispatch_plan_json(&conversion.blocks, 0, plan_options),
            path,
        });
    }

    match args.format {
        OutputFormat::Human => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", report.path.display());
                if let Some(title) = &report.title {
                    println!("title: {}", title);
                }
                println!("{}", report.summary);
                for image in &report.images {
                    println!("  image: {}", image);
                }
            }
        }
        OutputFormat::Json => print_json(&reports)?,
    }

    Ok(())
}

fn source_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let files = scan_markdown_files(path)?;
    if files.is_empty() {
        bail!("no Markdown files found under {}", path.display());
    }
    Ok(files)
}

/// The creation calls an upload would issue, as request bodies.
///
/// Nested children are listed under the unit that creates their parent,
/// with `block` giving the parent's offset inside that unit.
pub fn dispatch_plan_json(
    blocks: &[BlockDescriptor],
    start_index: usize,
    options: PlanOptions,
) -> Vec<Value> {
    plan_dispatch(blocks, start_index, options)
        .into_iter()
        .map(|unit| match unit {
            DispatchUnit::Plain {
                start_index,
                blocks,
            } => {
                let nested: Vec<Value> = blocks
                    .iter()
                    .enumerate()
                    .filter(|(_, block)| !block.children().is_empty())
                    .map(|(offset, block)| {
                        json!({
                            "block": offset,
                            "units": dispatch_plan_json(block.children(), 0, options),
                        })
                    })
                    .collect();
                let mut value = json!({
                    "kind": "plain",
                    "start_index": start_index,
                    "request": children_request(blocks, start_index),
                });
                if !nested.is_empty() {
                    value["children"] = Value::Array(nested);
                }
                value
            }
            DispatchUnit::Table { start_index, block } => {
                let request = match block.payload() {
                    BlockPayload::Table(spec) => table_request(spec, start_index),
                    _ => Value::Null,
                };
                json!({
                    "kind": "table",
                    "start_index": start_index,
                    "request": request,
                })
            }
        })
        .collect()
}
