use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::{BlockDescriptor, count_blocks};

use super::plan::{PlanOptions, plan_dispatch};
use super::to_blocks::Conversion;

/// Counts describing a conversion, shown before (or instead of) an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Every block in the forest, counting each table as one.
    pub total_blocks: usize,
    pub top_level_blocks: usize,
    pub tables: usize,
    pub images: usize,
    /// Creation calls needed for the top-level blocks alone.
    pub dispatch_units: usize,
    /// Block count per kind name, e.g. `heading1` or `bullet`.
    pub kinds: BTreeMap<String, usize>,
}

impl ConversionSummary {
    pub fn new(conversion: &Conversion, options: PlanOptions) -> Self {
        let mut kinds = BTreeMap::new();
        tally(&conversion.blocks, &mut kinds);

        Self {
            total_blocks: count_blocks(&conversion.blocks),
            top_level_blocks: conversion.blocks.len(),
            tables: kinds.get("table").copied().unwrap_or(0),
            images: conversion.images.len(),
            dispatch_units: plan_dispatch(&conversion.blocks, 0, options).len(),
            kinds,
        }
    }
}

fn tally(blocks: &[BlockDescriptor], kinds: &mut BTreeMap<String, usize>) {
    for block in blocks {
        *kinds.entry(block.kind().to_string()).or_default() += 1;
        tally(block.children(), kinds);
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({} top-level), {}, {}",
            counted(self.total_blocks, "block"),
            self.top_level_blocks,
            counted(self.tables, "table"),
            counted(self.images, "image")
        )?;
        write!(
            f,
            "{} at top level",
            counted(self.dispatch_units, "creation call")
        )?;
        for (kind, count) in &self.kinds {
            write!(f, "\n  {:<16} {}", kind, count)?;
        }
        Ok(())
    }
}

fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
