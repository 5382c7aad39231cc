//! Vendor block model: type-code lookup table and the closed payload union.

use std::fmt;

use thiserror::Error;

use super::run::RunList;

/// Block kinds known to the document service.
///
/// The numeric codes are fixed by the vendor and are not an arithmetic
/// sequence; only the nine heading levels happen to be contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Page,
    Text,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Heading7,
    Heading8,
    Heading9,
    Bullet,
    Ordered,
    Code,
    Quote,
    Equation,
    Todo,
    Callout,
    Divider,
    Image,
    Table,
    TableCell,
    QuoteContainer,
    Whiteboard,
}

impl BlockKind {
    /// Every known kind, in code order.
    pub const ALL: [BlockKind; 24] = [
        BlockKind::Page,
        BlockKind::Text,
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::Heading3,
        BlockKind::Heading4,
        BlockKind::Heading5,
        BlockKind::Heading6,
        BlockKind::Heading7,
        BlockKind::Heading8,
        BlockKind::Heading9,
        BlockKind::Bullet,
        BlockKind::Ordered,
        BlockKind::Code,
        BlockKind::Quote,
        BlockKind::Equation,
        BlockKind::Todo,
        BlockKind::Callout,
        BlockKind::Divider,
        BlockKind::Image,
        BlockKind::Table,
        BlockKind::TableCell,
        BlockKind::QuoteContainer,
        BlockKind::Whiteboard,
    ];

    /// The vendor's integer `block_type`.
    pub fn code(self) -> u32 {
        match self {
            BlockKind::Page => 1,
            BlockKind::Text => 2,
            BlockKind::Heading1 => 3,
            BlockKind::Heading2 => 4,
            BlockKind::Heading3 => 5,
            BlockKind::Heading4 => 6,
            BlockKind::Heading5 => 7,
            BlockKind::Heading6 => 8,
            BlockKind::Heading7 => 9,
            BlockKind::Heading8 => 10,
            BlockKind::Heading9 => 11,
            BlockKind::Bullet => 12,
            BlockKind::Ordered => 13,
            BlockKind::Code => 14,
            BlockKind::Quote => 15,
            BlockKind::Equation => 16,
            BlockKind::Todo => 17,
            BlockKind::Callout => 19,
            BlockKind::Divider => 22,
            BlockKind::Image => 27,
            BlockKind::Table => 31,
            BlockKind::TableCell => 32,
            BlockKind::QuoteContainer => 34,
            BlockKind::Whiteboard => 43,
        }
    }

    /// Looks up a kind by vendor code. Unknown codes return `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    /// Heading kind for a level in `1..=9`.
    pub fn heading(level: u8) -> Option<Self> {
        match level {
            1 => Some(BlockKind::Heading1),
            2 => Some(BlockKind::Heading2),
            3 => Some(BlockKind::Heading3),
            4 => Some(BlockKind::Heading4),
            5 => Some(BlockKind::Heading5),
            6 => Some(BlockKind::Heading6),
            7 => Some(BlockKind::Heading7),
            8 => Some(BlockKind::Heading8),
            9 => Some(BlockKind::Heading9),
            _ => None,
        }
    }

    /// Heading level for heading kinds.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            BlockKind::Heading4 => Some(4),
            BlockKind::Heading5 => Some(5),
            BlockKind::Heading6 => Some(6),
            BlockKind::Heading7 => Some(7),
            BlockKind::Heading8 => Some(8),
            BlockKind::Heading9 => Some(9),
            _ => None,
        }
    }

    /// Name of the JSON field carrying this kind's payload.
    pub fn field_name(self) -> &'static str {
        match self {
            BlockKind::Page => "page",
            BlockKind::Text => "text",
            BlockKind::Heading1 => "heading1",
            BlockKind::Heading2 => "heading2",
            BlockKind::Heading3 => "heading3",
            BlockKind::Heading4 => "heading4",
            BlockKind::Heading5 => "heading5",
            BlockKind::Heading6 => "heading6",
            BlockKind::Heading7 => "heading7",
            BlockKind::Heading8 => "heading8",
            BlockKind::Heading9 => "heading9",
            BlockKind::Bullet => "bullet",
            BlockKind::Ordered => "ordered",
            BlockKind::Code => "code",
            BlockKind::Quote => "quote",
            BlockKind::Equation => "equation",
            BlockKind::Todo => "todo",
            BlockKind::Callout => "callout",
            BlockKind::Divider => "divider",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
            BlockKind::TableCell => "table_cell",
            BlockKind::QuoteContainer => "quote_container",
            BlockKind::Whiteboard => "board",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Horizontal alignment of a text-like block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn code(self) -> u32 {
        match self {
            Align::Left => 1,
            Align::Center => 2,
            Align::Right => 3,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            2 => Align::Center,
            3 => Align::Right,
            _ => Align::Left,
        }
    }
}

/// Bullet or ordered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
}

impl ListKind {
    pub fn block_kind(self) -> BlockKind {
        match self {
            ListKind::Bullet => BlockKind::Bullet,
            ListKind::Ordered => BlockKind::Ordered,
        }
    }
}

/// Errors raised when a block would violate the vendor schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("heading level {0} is outside 1..=9")]
    InvalidHeadingLevel(u8),

    #[error("table must have at least one row and one column")]
    EmptyTable,

    #[error("whiteboard size must be positive, got {width}x{height}")]
    InvalidWhiteboardSize { width: u32, height: u32 },
}

/// Table contents: a rectangular matrix of cell runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    rows: Vec<Vec<RunList>>,
    column_align: Vec<Align>,
    header_row: bool,
}

impl TableSpec {
    /// Builds a table, padding ragged rows with empty cells.
    ///
    /// Every cell carries at least one run because `RunList` cannot be empty.
    pub fn new(
        mut rows: Vec<Vec<RunList>>,
        mut column_align: Vec<Align>,
        header_row: bool,
    ) -> Result<Self, BlockError> {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return Err(BlockError::EmptyTable);
        }
        for row in &mut rows {
            row.resize_with(columns, RunList::empty);
        }
        column_align.resize(columns, Align::Left);
        Ok(Self {
            rows,
            column_align,
            header_row,
        })
    }

    pub fn row_size(&self) -> usize {
        self.rows.len()
    }

    pub fn column_size(&self) -> usize {
        self.column_align.len()
    }

    pub fn rows(&self) -> &[Vec<RunList>] {
        &self.rows
    }

    pub fn column_align(&self, column: usize) -> Align {
        self.column_align.get(column).copied().unwrap_or_default()
    }

    pub fn header_row(&self) -> bool {
        self.header_row
    }
}

/// Image placeholder: where the picture comes from and its alt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub source: String,
    pub alt: String,
}

/// Payload of one block, one variant per supported kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockPayload {
    Heading { level: u8, runs: RunList, align: Align },
    Text { runs: RunList, align: Align },
    Code { content: String, language: u32, wrap: bool },
    List { kind: ListKind, runs: RunList },
    Todo { runs: RunList, done: bool },
    Quote { runs: RunList },
    Equation { content: String },
    Table(TableSpec),
    Image(ImageRef),
    Divider,
    Whiteboard { align: Align, width: u32, height: u32 },
}

/// One block ready for upload, with nested children created under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    payload: BlockPayload,
    children: Vec<BlockDescriptor>,
}

impl BlockDescriptor {
    fn leaf(payload: BlockPayload) -> Self {
        Self {
            payload,
            children: Vec::new(),
        }
    }

    pub fn heading(level: u8, runs: RunList, align: Align) -> Result<Self, BlockError> {
        if BlockKind::heading(level).is_none() {
            return Err(BlockError::InvalidHeadingLevel(level));
        }
        Ok(Self::leaf(BlockPayload::Heading { level, runs, align }))
    }

    pub fn text(runs: RunList) -> Self {
        Self::leaf(BlockPayload::Text {
            runs,
            align: Align::Left,
        })
    }

    pub fn code(content: impl Into<String>, language: u32) -> Self {
        Self::leaf(BlockPayload::Code {
            content: content.into(),
            language,
            wrap: false,
        })
    }

    pub fn list_item(kind: ListKind, runs: RunList) -> Self {
        Self::leaf(BlockPayload::List { kind, runs })
    }

    pub fn todo(runs: RunList, done: bool) -> Self {
        Self::leaf(BlockPayload::Todo { runs, done })
    }

    pub fn quote(runs: RunList) -> Self {
        Self::leaf(BlockPayload::Quote { runs })
    }

    pub fn equation(content: impl Into<String>) -> Self {
        Self::leaf(BlockPayload::Equation {
            content: content.into(),
        })
    }

    pub fn table(spec: TableSpec) -> Self {
        Self::leaf(BlockPayload::Table(spec))
    }

    pub fn image(image: ImageRef) -> Self {
        Self::leaf(BlockPayload::Image(image))
    }

    pub fn divider() -> Self {
        Self::leaf(BlockPayload::Divider)
    }

    pub fn whiteboard(align: Align, width: u32, height: u32) -> Result<Self, BlockError> {
        if width == 0 || height == 0 {
            return Err(BlockError::InvalidWhiteboardSize { width, height });
        }
        Ok(Self::leaf(BlockPayload::Whiteboard {
            align,
            width,
            height,
        }))
    }

    /// Returns this block with `children` appended under it.
    pub fn with_children(mut self, children: Vec<BlockDescriptor>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn payload(&self) -> &BlockPayload {
        &self.payload
    }

    pub fn children(&self) -> &[BlockDescriptor] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<BlockDescriptor> {
        &mut self.children
    }

    pub fn kind(&self) -> BlockKind {
        match &self.payload {
            BlockPayload::Heading { level, .. } => {
                BlockKind::heading(*level).unwrap_or(BlockKind::Heading9)
            }
            BlockPayload::Text { .. } => BlockKind::Text,
            BlockPayload::Code { .. } => BlockKind::Code,
            BlockPayload::List { kind, .. } => kind.block_kind(),
            BlockPayload::Todo { .. } => BlockKind::Todo,
            BlockPayload::Quote { .. } => BlockKind::Quote,
            BlockPayload::Equation { .. } => BlockKind::Equation,
            BlockPayload::Table(_) => BlockKind::Table,
            BlockPayload::Image(_) => BlockKind::Image,
            BlockPayload::Divider => BlockKind::Divider,
            BlockPayload::Whiteboard { .. } => BlockKind::Whiteboard,
        }
    }

    /// The vendor `block_type` code.
    pub fn block_type(&self) -> u32 {
        self.kind().code()
    }

    pub fn is_table(&self) -> bool {
        matches!(self.payload, BlockPayload::Table(_))
    }

    /// The run list carried by text-like payloads.
    pub fn runs(&self) -> Option<&RunList> {
        match &self.payload {
            BlockPayload::Heading { runs, .. }
            | BlockPayload::Text { runs, .. }
            | BlockPayload::List { runs, .. }
            | BlockPayload::Todo { runs, .. }
            | BlockPayload::Quote { runs } => Some(runs),
            _ => None,
        }
    }

    /// Number of blocks in this subtree, counting a table as one block.
    pub fn tree_len(&self) -> usize {
        1 + self.children.iter().map(BlockDescriptor::tree_len).sum::<usize>()
    }
}

/// Total blocks across a forest of descriptors.
pub fn count_blocks(blocks: &[BlockDescriptor]) -> usize {
    blocks.iter().map(BlockDescriptor::tree_len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn heading_levels_have_distinct_codes_and_fields() {
        let kinds: Vec<BlockKind> = (1..=9).filter_map(BlockKind::heading).collect();
        assert_eq!(kinds.len(), 9);

        let codes: HashSet<u32> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), 9);

        for (i, kind) in kinds.iter().enumerate() {
            assert_eq!(kind.field_name(), format!("heading{}", i + 1));
            assert_eq!(kind.heading_level(), Some(i as u8 + 1));
        }
    }

    #[test]
    fn heading_level_out_of_range() {
        assert_eq!(BlockKind::heading(0), None);
        assert_eq!(BlockKind::heading(10), None);
        assert_eq!(
            BlockDescriptor::heading(10, RunList::plain("x"), Align::Left),
            Err(BlockError::InvalidHeadingLevel(10))
        );
    }

    #[test]
    fn codes_round_trip_through_lookup() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(BlockKind::from_code(999), None);
    }

    #[test]
    fn fixed_vendor_codes() {
        assert_eq!(BlockKind::Text.code(), 2);
        assert_eq!(BlockKind::Heading1.code(), 3);
        assert_eq!(BlockKind::Heading9.code(), 11);
        assert_eq!(BlockKind::Bullet.code(), 12);
        assert_eq!(BlockKind::Ordered.code(), 13);
        assert_eq!(BlockKind::Code.code(), 14);
        assert_eq!(BlockKind::Divider.code(), 22);
        assert_eq!(BlockKind::Image.code(), 27);
        assert_eq!(BlockKind::Table.code(), 31);
        assert_eq!(BlockKind::TableCell.code(), 32);
        assert_eq!(BlockKind::Whiteboard.code(), 43);
    }

    #[test]
    fn table_pads_ragged_rows() {
        let spec = TableSpec::new(
            vec![
                vec![RunList::plain("a"), RunList::plain("b")],
                vec![RunList::plain("c")],
            ],
            vec![Align::Center],
            true,
        )
        .unwrap();

        assert_eq!(spec.row_size(), 2);
        assert_eq!(spec.column_size(), 2);
        assert_eq!(spec.rows()[1][1], RunList::empty());
        assert_eq!(spec.column_align(0), Align::Center);
        assert_eq!(spec.column_align(1), Align::Left);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(
            TableSpec::new(Vec::new(), Vec::new(), false),
            Err(BlockError::EmptyTable)
        );
        assert_eq!(
            TableSpec::new(vec![Vec::new()], Vec::new(), false),
            Err(BlockError::EmptyTable)
        );
    }

    #[test]
    fn whiteboard_requires_positive_size() {
        assert!(BlockDescriptor::whiteboard(Align::Center, 0, 100).is_err());
        let board = BlockDescriptor::whiteboard(Align::Center, 800, 600).unwrap();
        assert_eq!(board.kind(), BlockKind::Whiteboard);
        assert_eq!(board.block_type(), 43);
    }

    #[test]
    fn tree_len_counts_children() {
        let item = BlockDescriptor::list_item(ListKind::Bullet, RunList::plain("a")).with_children(
            vec![
                BlockDescriptor::list_item(ListKind::Bullet, RunList::plain("b")),
                BlockDescriptor::list_item(ListKind::Bullet, RunList::plain("c")),
            ],
        );
        assert_eq!(item.tree_len(), 3);
        assert_eq!(count_blocks(&[item, BlockDescriptor::divider()]), 4);
    }
}
