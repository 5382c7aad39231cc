//! Vendor blocks → Markdown, best effort.
//!
//! The flat block listing is indexed by id and walked from the root's
//! children in document order. Kinds this module does not know render as a
//! visible HTML comment and a warning; the rest of the document still
//! renders.

use std::collections::{HashMap, HashSet};

use crate::domain::{BlockKind, LanguageMap, StyledRun};
use crate::remote::RemoteBlock;
use crate::remote::wire::{self, TextBody};

use super::inline::emit_runs;

/// Options controlling block → Markdown rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Vendor language code → fence tag.
    pub languages: LanguageMap,
    /// Render the page block's title as a leading `# title`.
    pub include_title: bool,
}

/// Reconstructs Markdown from a complete block listing.
///
/// `root_id` is usually the document id, which is also the id of its page
/// block. When the root is absent from the listing, blocks whose
/// `parent_id` equals `root_id` are rendered in listing order.
pub fn blocks_to_markdown(blocks: &[RemoteBlock], root_id: &str, options: &RenderOptions) -> String {
    let renderer = Renderer::new(blocks, options);
    let mut visited = HashSet::new();

    let mut sections = Vec::new();
    let children: Vec<&str> = match renderer.by_id.get(root_id).copied() {
        Some(root) => {
            visited.insert(root.block_id.as_str());
            if options.include_title && root.block_type == BlockKind::Page.code() {
                if let Some(title) = wire::text_body(root, "page") {
                    let title = emit_runs(&wire::elements_to_runs(&title.elements));
                    if !title.trim().is_empty() {
                        sections.push(format!("# {}", title));
                    }
                }
            }
            root.children.iter().map(String::as_str).collect()
        }
        None => blocks
            .iter()
            .filter(|b| b.parent_id.as_deref() == Some(root_id))
            .map(|b| b.block_id.as_str())
            .collect(),
    };

    let body = renderer.render_children(&children, &mut visited);
    if !body.is_empty() {
        sections.push(body);
    }
    let mut out = sections.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

struct Renderer<'b, 'o> {
    by_id: HashMap<&'b str, &'b RemoteBlock>,
    options: &'o RenderOptions,
}

impl<'b, 'o> Renderer<'b, 'o> {
    fn new(blocks: &'b [RemoteBlock], options: &'o RenderOptions) -> Self {
        let by_id = blocks.iter().map(|b| (b.block_id.as_str(), b)).collect();
        Self { by_id, options }
    }

    /// Renders siblings; consecutive list items share a single line break.
    fn render_children(&self, ids: &[&'b str], visited: &mut HashSet<&'b str>) -> String {
        let mut out = String::new();
        let mut previous_was_item = false;

        for &id in ids {
            let Some(block) = self.by_id.get(id).copied() else {
                log::debug!("child {} missing from listing, skipped", id);
                continue;
            };
            if !visited.insert(block.block_id.as_str()) {
                log::warn!("block {} reached twice, skipped", id);
                continue;
            }

            let rendered = self.render_block(block, visited);
            if rendered.is_empty() {
                continue;
            }
            let is_item = is_list_item(block.block_type);
            if !out.is_empty() {
                out.push_str(if previous_was_item && is_item { "\n" } else { "\n\n" });
            }
            out.push_str(&rendered);
            previous_was_item = is_item;
        }
        out
    }

    fn child_ids(block: &'b RemoteBlock) -> Vec<&'b str> {
        block.children.iter().map(String::as_str).collect()
    }

    fn render_block(&self, block: &'b RemoteBlock, visited: &mut HashSet<&'b str>) -> String {
        let Some(kind) = BlockKind::from_code(block.block_type) else {
            return self.unsupported(block, visited);
        };

        match kind {
            BlockKind::Text => {
                let own = self.runs(block, kind);
                self.followed_by_children(own, block, visited)
            }
            kind if kind.heading_level().is_some() => {
                let level = kind.heading_level().unwrap_or(1) as usize;
                let own = format!("{} {}", "#".repeat(level), self.runs(block, kind));
                self.followed_by_children(own, block, visited)
            }
            BlockKind::Bullet | BlockKind::Ordered | BlockKind::Todo => {
                self.list_item(block, kind, visited)
            }
            BlockKind::Code => self.code(block),
            BlockKind::Quote => {
                let own = self.runs(block, kind);
                quote_lines(&self.followed_by_children(own, block, visited))
            }
            BlockKind::Callout | BlockKind::QuoteContainer => {
                quote_lines(&self.render_children(&Self::child_ids(block), visited))
            }
            BlockKind::Equation => {
                let content = wire::text_body(block, "equation")
                    .map(|body| body.plain_text())
                    .unwrap_or_default();
                format!("$$\n{}\n$$", content.trim_end_matches('\n'))
            }
            BlockKind::Divider => "---".to_string(),
            BlockKind::Image => {
                let token = wire::token(block, "image").unwrap_or_default();
                format!("![image]({})", token)
            }
            BlockKind::Whiteboard => {
                let token = wire::token(block, "board").unwrap_or_default();
                format!("<!-- whiteboard: {} -->", token)
            }
            BlockKind::Table => self.table(block, visited),
            BlockKind::TableCell | BlockKind::Page => {
                self.render_children(&Self::child_ids(block), visited)
            }
            _ => self.unsupported(block, visited),
        }
    }

    /// Markdown cannot nest blocks under a paragraph or heading, so their
    /// children are rendered right after them as siblings.
    fn followed_by_children(
        &self,
        own: String,
        block: &'b RemoteBlock,
        visited: &mut HashSet<&'b str>,
    ) -> String {
        if block.children.is_empty() {
            return own;
        }
        log::debug!(
            "children of block {} rendered after it, not nested",
            block.block_id
        );
        let children = self.render_children(&Self::child_ids(block), visited);
        match (own.is_empty(), children.is_empty()) {
            (_, true) => own,
            (true, false) => children,
            (false, false) => format!("{}\n\n{}", own, children),
        }
    }

    fn unsupported(&self, block: &'b RemoteBlock, visited: &mut HashSet<&'b str>) -> String {
        log::warn!(
            "unsupported block type {} ({}), rendered as a marker",
            block.block_type,
            block.block_id
        );
        let marker = format!("<!-- unsupported block type {} -->", block.block_type);
        let children = self.render_children(&Self::child_ids(block), visited);
        if children.is_empty() {
            marker
        } else {
            format!("{}\n\n{}", marker, children)
        }
    }

    fn body(&self, block: &RemoteBlock, kind: BlockKind) -> TextBody {
        wire::text_body(block, kind.field_name()).unwrap_or_default()
    }

    fn runs(&self, block: &RemoteBlock, kind: BlockKind) -> String {
        let runs: Vec<StyledRun> = wire::elements_to_runs(&self.body(block, kind).elements);
        emit_runs(&runs)
    }

    fn list_item(
        &self,
        block: &'b RemoteBlock,
        kind: BlockKind,
        visited: &mut HashSet<&'b str>,
    ) -> String {
        let marker = match kind {
            BlockKind::Ordered => "1. ".to_string(),
            BlockKind::Todo => {
                let done = self.body(block, kind).style.done.unwrap_or(false);
                format!("- [{}] ", if done { 'x' } else { ' ' })
            }
            _ => "- ".to_string(),
        };
        let mut out = format!("{}{}", marker, self.runs(block, kind));

        let nested = self.render_children(&Self::child_ids(block), visited);
        if !nested.is_empty() {
            let first_is_item = block
                .children
                .first()
                .and_then(|id| self.by_id.get(id.as_str()))
                .is_some_and(|child| is_list_item(child.block_type));
            out.push_str(if first_is_item { "\n" } else { "\n\n" });
            let indent = if kind == BlockKind::Ordered { "   " } else { "  " };
            out.push_str(&indent_lines(&nested, indent));
        }
        out
    }

    fn code(&self, block: &RemoteBlock) -> String {
        let body = self.body(block, BlockKind::Code);
        let content = body.plain_text();
        let tag = body
            .style
            .language
            .and_then(|code| self.options.languages.tag_for(code))
            .unwrap_or("");
        let fence = code_fence(&content);
        format!("{}{}\n{}\n{}", fence, tag, content.trim_end_matches('\n'), fence)
    }

    fn table(&self, block: &'b RemoteBlock, visited: &mut HashSet<&'b str>) -> String {
        let Some(table) = wire::table_body(block) else {
            return self.unsupported(block, visited);
        };
        let columns = table.property.column_size.max(1);
        let cell_ids: Vec<&'b str> = if block.children.is_empty() {
            table
                .cells
                .iter()
                .filter_map(|id| self.by_id.get_key_value(id.as_str()).map(|(key, _)| *key))
                .collect()
        } else {
            Self::child_ids(block)
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut aligns: Vec<u32> = vec![1; columns];
        for (i, chunk) in cell_ids.chunks(columns).enumerate() {
            let mut row = Vec::with_capacity(columns);
            for (c, &id) in chunk.iter().enumerate() {
                visited.insert(id);
                let (text, align) = self.cell(id, visited);
                if i == 0 {
                    aligns[c] = align;
                }
                row.push(text);
            }
            row.resize(columns, String::new());
            rows.push(row);
        }
        if rows.is_empty() {
            rows.push(vec![String::new(); columns]);
        }

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(table_row(&rows[0]));
        let separator: Vec<String> = aligns
            .iter()
            .map(|align| match align {
                2 => ":---:".to_string(),
                3 => "---:".to_string(),
                _ => "---".to_string(),
            })
            .collect();
        lines.push(format!("| {} |", separator.join(" | ")));
        for row in &rows[1..] {
            lines.push(table_row(row));
        }
        lines.join("\n")
    }

    /// Cell text (children joined with `<br>`) and the first child's alignment.
    fn cell(&self, id: &'b str, visited: &mut HashSet<&'b str>) -> (String, u32) {
        let Some(cell) = self.by_id.get(id).copied() else {
            return (String::new(), 1);
        };
        let mut parts = Vec::new();
        let mut align = None;
        for child_id in &cell.children {
            let Some(child) = self.by_id.get(child_id.as_str()).copied() else {
                continue;
            };
            visited.insert(child.block_id.as_str());
            let Some(kind) = BlockKind::from_code(child.block_type) else {
                continue;
            };
            if child.block_type == BlockKind::Text.code() && align.is_none() {
                align = self.body(child, kind).style.align;
            }
            let text = match kind {
                BlockKind::Image | BlockKind::Table | BlockKind::Divider => {
                    self.render_block(child, visited)
                }
                _ => self.runs(child, kind),
            };
            if !text.is_empty() {
                parts.push(text.replace('\n', "<br>"));
            }
        }
        (parts.join("<br>").replace('|', "\\|"), align.unwrap_or(1))
    }
}

fn is_list_item(block_type: u32) -> bool {
    matches!(
        BlockKind::from_code(block_type),
        Some(BlockKind::Bullet | BlockKind::Ordered | BlockKind::Todo)
    )
}

fn table_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent_lines(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A backtick fence longer than any backtick run in `content`, at least three.
fn code_fence(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn block(value: Value) -> RemoteBlock {
        serde_json::from_value(value).unwrap()
    }

    fn text(kind: &str, code: u32, id: &str, content: &str) -> RemoteBlock {
        block(json!({
            "block_id": id,
            "block_type": code,
            "parent_id": "doc",
            kind: { "elements": [{ "text_run": { "content": content } }] }
        }))
    }

    fn page(children: &[&str]) -> RemoteBlock {
        block(json!({
            "block_id": "doc",
            "block_type": 1,
            "children": children,
            "page": { "elements": [{ "text_run": { "content": "My Doc" } }] }
        }))
    }

    fn render(blocks: &[RemoteBlock]) -> String {
        blocks_to_markdown(blocks, "doc", &RenderOptions::default())
    }

    #[test]
    fn headings_text_and_lists() {
        let blocks = vec![
            page(&["h", "p", "b1", "b2"]),
            text("heading1", 3, "h", "Title"),
            text("text", 2, "p", "Hello"),
            text("bullet", 12, "b1", "item1"),
            text("bullet", 12, "b2", "item2"),
        ];
        assert_eq!(render(&blocks), "# Title\n\nHello\n\n- item1\n- item2\n");
    }

    #[test]
    fn title_is_optional() {
        let blocks = vec![page(&["p"]), text("text", 2, "p", "body")];
        let options = RenderOptions {
            include_title: true,
            ..RenderOptions::default()
        };
        assert_eq!(
            blocks_to_markdown(&blocks, "doc", &options),
            "# My Doc\n\nbody\n"
        );
    }

    #[test]
    fn styled_runs_are_emitted() {
        let p = block(json!({
            "block_id": "p", "block_type": 2,
            "text": { "elements": [
                { "text_run": { "content": "Hello " } },
                { "text_run": { "content": "world", "text_element_style": { "bold": true } } }
            ] }
        }));
        assert_eq!(render(&[page(&["p"]), p]), "Hello **world**\n");
    }

    #[test]
    fn code_block_uses_language_tag() {
        let code = block(json!({
            "block_id": "c", "block_type": 14,
            "code": {
                "elements": [{ "text_run": { "content": "fn main() {}" } }],
                "style": { "language": 53 }
            }
        }));
        assert_eq!(render(&[page(&["c"]), code]), "```rust\nfn main() {}\n```\n");
    }

    #[test]
    fn nested_list_items_are_indented() {
        let parent = block(json!({
            "block_id": "a", "block_type": 12, "children": ["b"],
            "bullet": { "elements": [{ "text_run": { "content": "outer" } }] }
        }));
        let child = text("ordered", 13, "b", "inner");
        assert_eq!(render(&[page(&["a"]), parent, child]), "- outer\n  1. inner\n");
    }

    #[test]
    fn children_of_text_and_headings_are_kept() {
        let parent = block(json!({
            "block_id": "p", "block_type": 2, "children": ["c"],
            "text": { "elements": [{ "text_run": { "content": "parent" } }] }
        }));
        let child = text("text", 2, "c", "CHILD");
        let heading = block(json!({
            "block_id": "h", "block_type": 4, "children": ["hb"],
            "heading2": { "elements": [{ "text_run": { "content": "Section" } }] }
        }));
        let item = text("bullet", 12, "hb", "under heading");
        assert_eq!(
            render(&[page(&["p", "h"]), parent, child, heading, item]),
            "parent\n\nCHILD\n\n## Section\n\n- under heading\n"
        );
    }

    #[test]
    fn children_of_quote_stay_quoted() {
        let quote = block(json!({
            "block_id": "q", "block_type": 15, "children": ["c"],
            "quote": { "elements": [{ "text_run": { "content": "said" } }] }
        }));
        let child = text("text", 2, "c", "more");
        assert_eq!(render(&[page(&["q"]), quote, child]), "> said\n>\n> more\n");
    }

    #[test]
    fn plain_text_is_escaped_on_download() {
        let blocks = vec![page(&["p"]), text("text", 2, "p", "# not a heading *really*")];
        assert_eq!(render(&blocks), "\\# not a heading \\*really\\*\n");
    }

    #[test]
    fn todo_quote_divider_equation() {
        let todo = block(json!({
            "block_id": "t", "block_type": 17,
            "todo": { "elements": [{ "text_run": { "content": "done" } }], "style": { "done": true } }
        }));
        let quote = text("quote", 15, "q", "line one\nline two");
        let divider = block(json!({ "block_id": "d", "block_type": 22, "divider": {} }));
        let eq = block(json!({
            "block_id": "e", "block_type": 16,
            "equation": { "elements": [{ "equation": { "content": "x^2\n" } }] }
        }));
        let out = render(&[page(&["t", "q", "d", "e"]), todo, quote, divider, eq]);
        assert_eq!(
            out,
            "- [x] done\n\n> line one\n> line two\n\n---\n\n$$\nx^2\n$$\n"
        );
    }

    #[test]
    fn table_is_reconstructed() {
        let table = block(json!({
            "block_id": "tbl", "block_type": 31, "children": ["c1", "c2", "c3", "c4"],
            "table": { "property": { "row_size": 2, "column_size": 2 }, "cells": ["c1", "c2", "c3", "c4"] }
        }));
        let mut blocks = vec![page(&["tbl"]), table];
        for (i, content) in ["a", "b|c", "", "d"].iter().enumerate() {
            let cell = format!("c{}", i + 1);
            let txt = format!("c{}t", i + 1);
            let align = if i == 1 { 2 } else { 1 };
            blocks.push(block(json!({
                "block_id": cell, "block_type": 32, "children": [txt], "table_cell": {}
            })));
            blocks.push(block(json!({
                "block_id": txt, "block_type": 2,
                "text": {
                    "elements": [{ "text_run": { "content": content } }],
                    "style": { "align": align }
                }
            })));
        }
        assert_eq!(
            render(&blocks),
            "| a | b\\|c |\n| --- | :---: |\n|  | d |\n"
        );
    }

    #[test]
    fn unknown_block_renders_marker_and_continues() {
        let unknown = block(json!({ "block_id": "x", "block_type": 999, "mystery": {} }));
        let after = text("text", 2, "p", "still here");
        let out = render(&[page(&["x", "p"]), unknown, after]);
        assert_eq!(out, "<!-- unsupported block type 999 -->\n\nstill here\n");
    }

    #[test]
    fn image_and_whiteboard_tokens() {
        let image = block(json!({ "block_id": "i", "block_type": 27, "image": { "token": "img1" } }));
        let board = block(json!({ "block_id": "w", "block_type": 43, "board": { "token": "wb1" } }));
        assert_eq!(
            render(&[page(&["i", "w"]), image, board]),
            "![image](img1)\n\n<!-- whiteboard: wb1 -->\n"
        );
    }

    #[test]
    fn missing_root_falls_back_to_parent_links() {
        let blocks = vec![text("text", 2, "a", "one"), text("text", 2, "b", "two")];
        assert_eq!(render(&blocks), "one\n\ntwo\n");
    }

    #[test]
    fn empty_listing_renders_nothing() {
        assert_eq!(render(&[]), "");
    }
}
