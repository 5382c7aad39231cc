//! Markdown → vendor block conversion.
//!
//! Walks pulldown-cmark events once, in document order, and builds a forest
//! of [`BlockDescriptor`]s. Constructs without a vendor equivalent are
//! skipped with a warning; conversion itself never fails.

use std::sync::LazyLock;

use pulldown_cmark::{
    Alignment, CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd,
};
use regex::Regex;

use crate::domain::{
    Align, BlockDescriptor, ImageRef, LanguageMap, ListKind, RunList, StyledRun, TableSpec,
};

use super::inline::InlineCollector;
use super::markdown_options;

/// Default character ceiling for a single text block.
pub const DEFAULT_PARAGRAPH_LIMIT: usize = 2000;

/// CommonMark stops at six `#`; the vendor goes to nine.
static DEEP_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{7,9})[ \t]+").expect("deep heading pattern is valid"));

/// Options controlling Markdown → block conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Paragraphs longer than this many chars are split into several text blocks.
    pub paragraph_limit: usize,
    /// Fence tag → vendor language code.
    pub languages: LanguageMap,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            paragraph_limit: DEFAULT_PARAGRAPH_LIMIT,
            languages: LanguageMap::vendor_default(),
        }
    }
}

/// An image placeholder and where it sits in the block forest.
///
/// `position` holds the child index at each level, starting from the
/// top-level block list. The position is fixed at conversion time, so the
/// uploader can map it to the created block id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub position: Vec<usize>,
    pub image: ImageRef,
}

/// Result of converting one Markdown document.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub blocks: Vec<BlockDescriptor>,
    pub images: Vec<ImageReference>,
}

/// Converts Markdown text into vendor blocks plus image references.
///
/// # Example
///
/// ```
/// use larkmd::convert::{ConvertOptions, markdown_to_blocks};
/// use larkmd::domain::BlockKind;
///
/// let conversion = markdown_to_blocks("# Title\n\nBody", &ConvertOptions::default());
/// assert_eq!(conversion.blocks.len(), 2);
/// assert_eq!(conversion.blocks[0].kind(), BlockKind::Heading1);
/// ```
pub fn markdown_to_blocks(markdown: &str, options: &ConvertOptions) -> Conversion {
    let mut builder = Builder::new(options);
    for event in Parser::new_ext(markdown, markdown_options()) {
        builder.handle(event);
    }
    let blocks = builder.finish();
    let images = collect_images(&blocks);
    Conversion { blocks, images }
}

fn collect_images(blocks: &[BlockDescriptor]) -> Vec<ImageReference> {
    fn walk(blocks: &[BlockDescriptor], prefix: &mut Vec<usize>, out: &mut Vec<ImageReference>) {
        for (i, block) in blocks.iter().enumerate() {
            prefix.push(i);
            if let crate::domain::BlockPayload::Image(image) = block.payload() {
                out.push(ImageReference {
                    position: prefix.clone(),
                    image: image.clone(),
                });
            }
            walk(block.children(), prefix, out);
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    walk(blocks, &mut Vec::new(), &mut out);
    out
}

#[derive(Debug)]
struct ItemFrame {
    kind: ListKind,
    text: InlineCollector,
    children: Vec<BlockDescriptor>,
    task: Option<bool>,
}

#[derive(Debug)]
struct CodeFrame {
    language: String,
    content: String,
}

#[derive(Debug)]
struct TableFrame {
    aligns: Vec<Align>,
    rows: Vec<Vec<RunList>>,
    row: Vec<RunList>,
    cell: Option<InlineCollector>,
}

#[derive(Debug)]
struct ImageFrame {
    source: String,
    alt: String,
}

struct Builder<'o> {
    options: &'o ConvertOptions,
    out: Vec<BlockDescriptor>,
    lists: Vec<ListKind>,
    items: Vec<ItemFrame>,
    paragraph: InlineCollector,
    heading: Option<u8>,
    pending_images: Vec<BlockDescriptor>,
    quote_depth: usize,
    quote: InlineCollector,
    code: Option<CodeFrame>,
    table: Option<TableFrame>,
    image: Option<ImageFrame>,
    skip_depth: usize,
}

impl<'o> Builder<'o> {
    fn new(options: &'o ConvertOptions) -> Self {
        Self {
            options,
            out: Vec::new(),
            lists: Vec::new(),
            items: Vec::new(),
            paragraph: InlineCollector::new(),
            heading: None,
            pending_images: Vec::new(),
            quote_depth: 0,
            quote: InlineCollector::new(),
            code: None,
            table: None,
            image: None,
            skip_depth: 0,
        }
    }

    fn finish(mut self) -> Vec<BlockDescriptor> {
        if !self.paragraph.is_blank() {
            self.flush_paragraph();
        }
        self.out
    }

    fn handle(&mut self, event: Event<'_>) {
        if self.skip_depth > 0 {
            match event {
                Event::Start(_) => self.skip_depth += 1,
                Event::End(_) => self.skip_depth -= 1,
                _ => {}
            }
            return;
        }

        if let Some(code) = &mut self.code {
            match event {
                Event::Text(text) => code.content.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.end_code_block(),
                _ => {}
            }
            return;
        }

        if let Some(image) = &mut self.image {
            match event {
                Event::Text(text) | Event::Code(text) => image.alt.push_str(&text),
                Event::End(TagEnd::Image) => self.end_image(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::Paragraph) => self.start_paragraph(),
            Event::End(TagEnd::Paragraph) => self.end_paragraph(),

            Event::Start(Tag::Heading { level, .. }) => {
                if self.quote_depth > 0 {
                    self.separate();
                }
                self.heading = Some(heading_level(level));
            }
            Event::End(TagEnd::Heading(_)) => self.end_heading(),

            Event::Start(Tag::BlockQuote(_)) => {
                if self.quote_depth > 0 {
                    self.separate();
                }
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.flush_quote();
                }
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some(CodeFrame {
                    language,
                    content: String::new(),
                });
            }

            Event::Start(Tag::List(first)) => {
                self.lists.push(if first.is_some() {
                    ListKind::Ordered
                } else {
                    ListKind::Bullet
                });
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
            }
            Event::Start(Tag::Item) => self.start_item(),
            Event::End(TagEnd::Item) => self.end_item(),
            Event::TaskListMarker(done) => {
                if self.quote_depth > 0 {
                    self.quote
                        .push_run(StyledRun::plain(if done { "[x] " } else { "[ ] " }));
                } else if let Some(item) = self.items.last_mut() {
                    item.task = Some(done);
                }
            }

            Event::Start(Tag::Table(aligns)) => {
                self.table = Some(TableFrame {
                    aligns: aligns.iter().map(|a| column_align(*a)).collect(),
                    rows: Vec::new(),
                    row: Vec::new(),
                    cell: None,
                });
            }
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                if let Some(table) = &mut self.table {
                    table.row.clear();
                }
            }
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            Event::Start(Tag::TableCell) => {
                if let Some(table) = &mut self.table {
                    table.cell = Some(InlineCollector::new());
                }
            }
            Event::End(TagEnd::TableCell) => {
                if let Some(table) = &mut self.table {
                    if let Some(mut cell) = table.cell.take() {
                        table.row.push(cell.take());
                    }
                }
            }
            Event::End(TagEnd::Table) => self.end_table(),

            Event::Start(Tag::Image { dest_url, .. }) => {
                self.image = Some(ImageFrame {
                    source: dest_url.to_string(),
                    alt: String::new(),
                });
            }

            Event::DisplayMath(math) => self.display_math(&math),

            Event::Rule => {
                if self.quote_depth > 0 {
                    log::warn!("horizontal rule inside a blockquote is not supported, skipped");
                } else {
                    self.emit(BlockDescriptor::divider());
                }
            }

            Event::Start(tag) if !is_inline_tag(&tag) => {
                log::warn!("unsupported markdown construct {:?}, skipped", tag);
                self.skip_depth = 1;
            }

            other => {
                if !self.target().push_event(&other) {
                    log::warn!("unsupported markdown event {:?}, skipped", other);
                }
            }
        }
    }

    /// The collector receiving inline content in the current context.
    fn target(&mut self) -> &mut InlineCollector {
        if let Some(TableFrame {
            cell: Some(cell), ..
        }) = &mut self.table
        {
            cell
        } else if self.quote_depth > 0 {
            &mut self.quote
        } else if self.heading.is_some() {
            &mut self.paragraph
        } else if let Some(item) = self.items.last_mut() {
            &mut item.text
        } else {
            &mut self.paragraph
        }
    }

    /// Appends a block to the innermost open list item, or to the top level.
    fn emit(&mut self, block: BlockDescriptor) {
        match self.items.last_mut() {
            Some(item) => item.children.push(block),
            None => self.out.push(block),
        }
    }

    /// Inserts a line break between consecutive paragraphs sharing one collector.
    fn separate(&mut self) {
        let text = if self.quote_depth > 0 {
            &mut self.quote
        } else if self.heading.is_some() {
            return;
        } else if let Some(item) = self.items.last_mut() {
            &mut item.text
        } else {
            return;
        };
        if !text.is_blank() {
            text.push_run(StyledRun::plain("\n"));
        }
    }

    fn start_paragraph(&mut self) {
        self.separate();
    }

    fn end_paragraph(&mut self) {
        if self.quote_depth == 0 && self.items.is_empty() {
            self.flush_paragraph();
        }
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_blank() {
            self.paragraph.take();
            return;
        }

        let text = self.paragraph.plain_text();
        if self.paragraph.is_single_line() {
            if let Some(marker) = DEEP_HEADING.find(&text) {
                let level = text.chars().take_while(|&c| c == '#').count() as u8;
                self.paragraph.strip_prefix_chars(marker.as_str().chars().count());
                let runs = self.paragraph.take();
                self.emit_heading(level, runs);
                return;
            }
        }

        let runs = self.paragraph.take();
        for chunk in self.split(runs) {
            self.emit(BlockDescriptor::text(chunk));
        }
    }

    /// Cuts runs into pieces that fit one text payload.
    fn split(&self, runs: RunList) -> Vec<RunList> {
        runs.split_at_chars(self.options.paragraph_limit)
    }

    /// Emits a heading; text past the limit follows as plain text blocks.
    fn emit_heading(&mut self, level: u8, runs: RunList) {
        let mut chunks = self.split(runs).into_iter();
        let first = chunks.next().unwrap_or_default();
        match BlockDescriptor::heading(level, first, Align::Left) {
            Ok(block) => self.emit(block),
            Err(err) => {
                log::warn!("{}, heading skipped", err);
                return;
            }
        }
        let rest: Vec<RunList> = chunks.collect();
        if !rest.is_empty() {
            log::warn!(
                "heading longer than {} chars, remainder kept as text",
                self.options.paragraph_limit
            );
        }
        for chunk in rest {
            self.emit(BlockDescriptor::text(chunk));
        }
    }

    fn end_heading(&mut self) {
        let Some(level) = self.heading.take() else {
            return;
        };
        if self.quote_depth > 0 {
            return;
        }

        let runs = self.paragraph.take();
        self.emit_heading(level, runs);
        for image in std::mem::take(&mut self.pending_images) {
            self.emit(image);
        }
    }

    fn flush_quote(&mut self) {
        if self.quote.is_blank() {
            self.quote.take();
            return;
        }
        let runs = self.quote.take();
        for chunk in self.split(runs) {
            self.emit(BlockDescriptor::quote(chunk));
        }
    }

    fn start_item(&mut self) {
        if self.quote_depth > 0 {
            self.separate();
            let marker = match self.lists.last() {
                Some(ListKind::Ordered) => "1. ",
                _ => "- ",
            };
            self.quote.push_run(StyledRun::plain(marker));
            return;
        }
        self.items.push(ItemFrame {
            kind: self.lists.last().copied().unwrap_or(ListKind::Bullet),
            text: InlineCollector::new(),
            children: Vec::new(),
            task: None,
        });
    }

    fn end_item(&mut self) {
        if self.quote_depth > 0 {
            return;
        }
        let Some(mut frame) = self.items.pop() else {
            return;
        };
        // Overflow becomes text children ahead of the nested blocks.
        let mut chunks = self.split(frame.text.take()).into_iter();
        let runs = chunks.next().unwrap_or_default();
        let mut children: Vec<BlockDescriptor> = chunks.map(BlockDescriptor::text).collect();
        children.append(&mut frame.children);

        let block = match frame.task {
            Some(done) => BlockDescriptor::todo(runs, done),
            None => BlockDescriptor::list_item(frame.kind, runs),
        };
        self.emit(block.with_children(children));
    }

    fn end_code_block(&mut self) {
        let Some(frame) = self.code.take() else {
            return;
        };
        let content = frame
            .content
            .strip_suffix('\n')
            .unwrap_or(&frame.content)
            .to_string();

        if self.quote_depth > 0 {
            self.separate();
            self.quote.push_run(StyledRun {
                inline_code: true,
                ..StyledRun::plain(content)
            });
            return;
        }
        let language = self.options.languages.code_for(&frame.language);
        self.emit(BlockDescriptor::code(content, language));
    }

    fn end_table(&mut self) {
        let Some(frame) = self.table.take() else {
            return;
        };
        if self.quote_depth > 0 {
            log::warn!("table inside a blockquote is emitted after the quoted text");
            self.flush_quote();
        }
        match TableSpec::new(frame.rows, frame.aligns, true) {
            Ok(spec) => self.emit(BlockDescriptor::table(spec)),
            Err(err) => log::warn!("{}, table skipped", err),
        }
    }

    fn end_image(&mut self) {
        let Some(frame) = self.image.take() else {
            return;
        };

        let in_cell = self.table.as_ref().is_some_and(|t| t.cell.is_some());
        if in_cell || self.quote_depth > 0 {
            log::warn!(
                "image '{}' inside a table or quote is kept as alt text",
                frame.source
            );
            let alt = if frame.alt.is_empty() {
                frame.source
            } else {
                frame.alt
            };
            self.target().push_run(StyledRun::plain(alt));
            return;
        }

        let block = BlockDescriptor::image(ImageRef {
            source: frame.source,
            alt: frame.alt,
        });
        if self.heading.is_some() {
            self.pending_images.push(block);
        } else if !self.items.is_empty() {
            self.emit(block);
        } else {
            self.flush_paragraph();
            self.emit(block);
        }
    }

    fn display_math(&mut self, math: &str) {
        let at_top_level = self.quote_depth == 0
            && self.heading.is_none()
            && self.items.is_empty()
            && self.table.is_none();
        if at_top_level {
            self.flush_paragraph();
            self.emit(BlockDescriptor::equation(math.trim()));
        } else {
            self.target().push_run(StyledRun::equation(math.trim()));
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn column_align(alignment: Alignment) -> Align {
    match alignment {
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
        Alignment::None | Alignment::Left => Align::Left,
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. }
    )
}
