//! Handlers for the `upload` and `create` commands.

use anyhow::{Context, Result};

use crate::cli::config::Config;
use crate::cli::output::{OutputFormat, UploadOutput, print_json};
use crate::cli::{CreateArgs, UploadArgs};
use crate::convert::{Conversion, PlanOptions, Uploader, bind_images, markdown_to_blocks};
use crate::infra::read_markdown;
use crate::remote::{BlockSink, LarkClient};

use super::LoggingBinder;

/// Handle the upload command - append a file's blocks to a document.
pub fn handle_upload(args: &UploadArgs, config: &Config) -> Result<()> {
    let source = read_markdown(&args.file)?;
    let conversion = markdown_to_blocks(&source.body, &config.convert_options());

    let mut client = LarkClient::new(config.client_settings())?;
    // The page block shares the document's id.
    let parent = args.parent.as_deref().unwrap_or(&args.document);
    let index = match args.index {
        Some(index) => index,
        None => client
            .child_count(&args.document, parent)
            .with_context(|| format!("failed to read block {}", parent))?,
    };

    let output = upload_conversion(
        &mut client,
        &args.document,
        parent,
        index,
        &conversion,
        config.plan_options(),
    )?;
    print_upload(args.format, &output)
}

/// Handle the create command - new document, then upload into it.
pub fn handle_create(args: &CreateArgs, config: &Config) -> Result<()> {
    let source = read_markdown(&args.file)?;
    let conversion = markdown_to_blocks(&source.body, &config.convert_options());
    let title = args.title.clone().or_else(|| source.title());

    let mut client = LarkClient::new(config.client_settings())?;
    let document_id = client
        .create_document(title.as_deref(), args.folder.as_deref())
        .context("failed to create document")?;

    let output = upload_conversion(
        &mut client,
        &document_id,
        &document_id,
        0,
        &conversion,
        config.plan_options(),
    )?;
    print_upload(args.format, &output)
}

/// Uploads a conversion through `sink` and leaves images as placeholders.
pub fn upload_conversion<S: BlockSink>(
    sink: &mut S,
    document_id: &str,
    parent_id: &str,
    start_index: usize,
    conversion: &Conversion,
    options: PlanOptions,
) -> Result<UploadOutput> {
    let report = Uploader::new(sink, options).upload(document_id, parent_id, start_index, conversion)?;

    let mut binder = LoggingBinder::default();
    bind_images(&mut binder, document_id, &report.images)?;

    Ok(UploadOutput {
        document_id: document_id.to_string(),
        parent_id: parent_id.to_string(),
        start_index,
        created: report.created,
        calls: report.units,
        block_ids: report.block_ids,
        images_pending: binder.pending.len(),
    })
}

fn print_upload(format: OutputFormat, output: &UploadOutput) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!(
                "Created {} blocks in {} calls in document {}",
                output.created, output.calls, output.document_id
            );
            if output.images_pending > 0 {
                println!(
                    "{} image placeholders left empty; add the pictures in the editor",
                    output.images_pending
                );
            }
        }
        OutputFormat::Json => print_json(output)?,
    }
    Ok(())
}
