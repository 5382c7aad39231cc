//! Batch/index planning and sequential dispatch of block creation calls.
//!
//! The vendor caps a creation call at 50 blocks, and tables must go through
//! their own descendant call: mixing table and non-table creations in one
//! call does not keep indices consistent. The planner therefore cuts the
//! block list into plain batches and isolated table units, threading one
//! running insertion index through all of them.

use thiserror::Error;

use crate::domain::{BlockDescriptor, BlockPayload, ImageRef, count_blocks};
use crate::remote::{BlockSink, ImageBinder, RemoteError};

use super::to_blocks::Conversion;

/// Hard per-call cap imposed by the vendor.
pub const MAX_BATCH_SIZE: usize = 50;

/// Planner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    batch_size: usize,
}

impl PlanOptions {
    /// Creates options with the batch size clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self::new(MAX_BATCH_SIZE)
    }
}

/// One outbound creation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchUnit<'a> {
    /// Up to `batch_size` non-table blocks created in one children call.
    Plain {
        start_index: usize,
        blocks: &'a [BlockDescriptor],
    },
    /// A single table created atomically with all of its cells.
    Table {
        start_index: usize,
        block: &'a BlockDescriptor,
    },
}

impl<'a> DispatchUnit<'a> {
    pub fn start_index(&self) -> usize {
        match self {
            DispatchUnit::Plain { start_index, .. } | DispatchUnit::Table { start_index, .. } => {
                *start_index
            }
        }
    }

    /// Number of blocks this unit inserts under its parent.
    pub fn delivered_count(&self) -> usize {
        match self {
            DispatchUnit::Plain { blocks, .. } => blocks.len(),
            DispatchUnit::Table { .. } => 1,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, DispatchUnit::Table { .. })
    }

    /// The top-level blocks inserted by this unit.
    pub fn blocks(&self) -> &'a [BlockDescriptor] {
        match self {
            DispatchUnit::Plain { blocks, .. } => *blocks,
            DispatchUnit::Table { block, .. } => std::slice::from_ref(*block),
        }
    }
}

/// Splits sibling blocks into dispatch units starting at `start_index`.
///
/// Each unit's start index equals the previous unit's start index plus the
/// number of blocks it delivers.
pub fn plan_dispatch<'a>(
    blocks: &'a [BlockDescriptor],
    start_index: usize,
    options: PlanOptions,
) -> Vec<DispatchUnit<'a>> {
    let mut units = Vec::new();
    let mut index = start_index;
    let mut run_start = 0;

    for (i, block) in blocks.iter().enumerate() {
        if block.is_table() {
            push_plain(&mut units, &blocks[run_start..i], &mut index, options);
            units.push(DispatchUnit::Table {
                start_index: index,
                block,
            });
            index += 1;
            run_start = i + 1;
        }
    }
    push_plain(&mut units, &blocks[run_start..], &mut index, options);

    units
}

fn push_plain<'a>(
    units: &mut Vec<DispatchUnit<'a>>,
    run: &'a [BlockDescriptor],
    index: &mut usize,
    options: PlanOptions,
) {
    for chunk in run.chunks(options.batch_size()) {
        units.push(DispatchUnit::Plain {
            start_index: *index,
            blocks: chunk,
        });
        *index += chunk.len();
    }
}

/// An upload aborted by a failed unit.
///
/// Already created blocks are not rolled back.
#[derive(Debug, Error)]
#[error("{created} of {total} blocks created before failure, last error: {source}")]
pub struct DispatchError {
    pub created: usize,
    pub total: usize,
    #[source]
    pub source: RemoteError,
}

/// A created image placeholder waiting for its picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBinding {
    pub block_id: String,
    pub image: ImageRef,
}

/// Outcome of a completed upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Blocks created, counting each table as one.
    pub created: usize,
    /// Creation calls issued.
    pub units: usize,
    /// Ids of the created top-level blocks, in document order.
    pub block_ids: Vec<String>,
    /// Image placeholders to bind, in document order.
    pub images: Vec<ImageBinding>,
}

/// Ids of a created subtree, mirroring the descriptor tree.
#[derive(Debug, Default)]
struct CreatedNode {
    id: String,
    children: Vec<CreatedNode>,
}

#[derive(Debug, Default)]
struct Progress {
    created: usize,
    units: usize,
}

/// Drives dispatch units against a [`BlockSink`], one at a time, in order.
pub struct Uploader<'s, S: BlockSink> {
    sink: &'s mut S,
    options: PlanOptions,
}

impl<'s, S: BlockSink> Uploader<'s, S> {
    pub fn new(sink: &'s mut S, options: PlanOptions) -> Self {
        Self { sink, options }
    }

    /// Creates all converted blocks under `parent_id`, starting at `start_index`.
    ///
    /// The destination is resolved once by the caller and threaded through
    /// every unit. The first failing unit aborts the rest of the document.
    pub fn upload(
        &mut self,
        document_id: &str,
        parent_id: &str,
        start_index: usize,
        conversion: &Conversion,
    ) -> Result<UploadReport, DispatchError> {
        let total = count_blocks(&conversion.blocks);
        let mut progress = Progress::default();

        let created = self
            .dispatch(
                document_id,
                parent_id,
                start_index,
                &conversion.blocks,
                &mut progress,
            )
            .map_err(|source| DispatchError {
                created: progress.created,
                total,
                source,
            })?;

        let images = conversion
            .images
            .iter()
            .filter_map(|reference| {
                let id = resolve_position(&created, &reference.position)?;
                Some(ImageBinding {
                    block_id: id.to_string(),
                    image: reference.image.clone(),
                })
            })
            .collect();

        log::info!(
            "created {} blocks in {} calls under {}",
            progress.created,
            progress.units,
            parent_id
        );

        Ok(UploadReport {
            created: progress.created,
            units: progress.units,
            block_ids: created.into_iter().map(|node| node.id).collect(),
            images,
        })
    }

    fn dispatch(
        &mut self,
        document_id: &str,
        parent_id: &str,
        start_index: usize,
        blocks: &[BlockDescriptor],
        progress: &mut Progress,
    ) -> Result<Vec<CreatedNode>, RemoteError> {
        let mut nodes = Vec::with_capacity(blocks.len());
        let mut expected_index = start_index;

        for unit in plan_dispatch(blocks, start_index, self.options) {
            debug_assert_eq!(unit.start_index(), expected_index);
            progress.units += 1;

            match unit {
                DispatchUnit::Plain {
                    start_index,
                    blocks,
                } => {
                    log::debug!(
                        "creating {} blocks under {} at index {}",
                        blocks.len(),
                        parent_id,
                        start_index
                    );
                    let created =
                        self.sink
                            .create_blocks(document_id, parent_id, start_index, blocks)?;
                    if created.created_count != blocks.len() || created.ids.len() != blocks.len()
                    {
                        // Whatever the vendor did create stays in the document.
                        progress.created += created.created_count.min(blocks.len());
                        let reported = if created.created_count != blocks.len() {
                            created.created_count
                        } else {
                            created.ids.len()
                        };
                        return Err(RemoteError::ShortCreate {
                            expected: blocks.len(),
                            created: reported,
                        });
                    }
                    progress.created += blocks.len();

                    for (block, id) in blocks.iter().zip(created.ids) {
                        let children = if block.children().is_empty() {
                            Vec::new()
                        } else {
                            self.dispatch(document_id, &id, 0, block.children(), progress)?
                        };
                        nodes.push(CreatedNode { id, children });
                    }
                }
                DispatchUnit::Table { start_index, block } => {
                    let BlockPayload::Table(spec) = block.payload() else {
                        continue;
                    };
                    log::debug!(
                        "creating {}x{} table under {} at index {}",
                        spec.row_size(),
                        spec.column_size(),
                        parent_id,
                        start_index
                    );
                    let id = self
                        .sink
                        .create_table(document_id, parent_id, start_index, spec)?;
                    progress.created += 1;
                    nodes.push(CreatedNode {
                        id,
                        children: Vec::new(),
                    });
                }
            }

            expected_index += unit.delivered_count();
        }

        Ok(nodes)
    }
}

fn resolve_position<'n>(nodes: &'n [CreatedNode], position: &[usize]) -> Option<&'n str> {
    let (&first, rest) = position.split_first()?;
    let node = nodes.get(first)?;
    if rest.is_empty() {
        Some(node.id.as_str())
    } else {
        resolve_position(&node.children, rest)
    }
}

/// Binds every image placeholder through `binder`, stopping at the first error.
///
/// Returns the number of images bound.
pub fn bind_images<B: ImageBinder>(
    binder: &mut B,
    document_id: &str,
    images: &[ImageBinding],
) -> Result<usize, RemoteError> {
    for (bound, binding) in images.iter().enumerate() {
        if let Err(err) = binder.bind_image(document_id, &binding.block_id, &binding.image) {
            log::warn!(
                "bound {} of {} images before failure on {}",
                bound,
                images.len(),
                binding.image.source
            );
            return Err(err);
        }
    }
    Ok(images.len())
}
