//! Inline style extraction (Markdown → styled runs) and emission (runs → Markdown).
//!
//! ```text
//! "Hello **world**."
//!     ↓ pulldown-cmark events
//! [Text("Hello "), Start(Strong), Text("world"), End(Strong), Text(".")]
//!     ↓ InlineCollector
//! [StyledRun("Hello "), StyledRun { bold, "world" }, StyledRun(".")]
//! ```
//!
//! Nested emphasis collapses into one run with several flags set. The
//! emitter writes markers in a fixed order (inline code innermost, then
//! strikethrough, bold, italic, underline; links wrap the whole group), so
//! extracting and re-emitting canonical Markdown is idempotent.
//!
//! Underline has no Markdown syntax and uses `<u>…</u>`. This is a lossy,
//! non-standard mapping: other renderers will show the raw tags or drop them.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::domain::{RunList, StyledRun};

use super::markdown_options;

/// Accumulates styled runs from a stream of inline events.
#[derive(Debug, Default)]
pub(crate) struct InlineCollector {
    runs: Vec<StyledRun>,
    bold: u32,
    italic: u32,
    strikethrough: u32,
    underline: u32,
    links: Vec<String>,
    line_break: bool,
}

impl InlineCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feeds one event. Returns false if the event is not an inline event.
    pub(crate) fn push_event(&mut self, event: &Event<'_>) -> bool {
        match event {
            Event::Start(Tag::Strong) => self.bold += 1,
            Event::End(TagEnd::Strong) => self.bold = self.bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.italic += 1,
            Event::End(TagEnd::Emphasis) => self.italic = self.italic.saturating_sub(1),
            Event::Start(Tag::Strikethrough) => self.strikethrough += 1,
            Event::End(TagEnd::Strikethrough) => {
                self.strikethrough = self.strikethrough.saturating_sub(1)
            }
            Event::Start(Tag::Link { dest_url, .. }) => self.links.push(dest_url.to_string()),
            Event::End(TagEnd::Link) => {
                self.links.pop();
            }

            Event::Text(text) => self.push_text(text, false),
            Event::Code(code) => self.push_text(code, true),
            Event::InlineMath(math) => {
                let mut run = StyledRun::equation(math.to_string());
                run.link = self.links.last().cloned();
                self.runs.push(run);
            }
            Event::SoftBreak => {
                self.line_break = true;
                self.push_text(" ", false)
            }
            Event::HardBreak => {
                self.line_break = true;
                self.push_text("\n", false)
            }
            Event::FootnoteReference(label) => self.push_text(&format!("[^{}]", label), false),

            Event::InlineHtml(html) => match html.trim().to_ascii_lowercase().as_str() {
                "<u>" | "<ins>" => self.underline += 1,
                "</u>" | "</ins>" => self.underline = self.underline.saturating_sub(1),
                _ => self.push_text(html, false),
            },

            _ => return false,
        }
        true
    }

    fn push_text(&mut self, text: &str, inline_code: bool) {
        if text.is_empty() {
            return;
        }
        self.runs.push(StyledRun {
            text: text.to_string(),
            bold: self.bold > 0,
            italic: self.italic > 0,
            underline: self.underline > 0,
            strikethrough: self.strikethrough > 0,
            inline_code,
            equation: None,
            link: self.links.last().cloned(),
        });
    }

    /// Appends an already-built run (used for inline image alt text fallbacks).
    pub(crate) fn push_run(&mut self, run: StyledRun) {
        self.runs.push(run);
    }

    /// Returns true if nothing visible has been collected yet.
    pub(crate) fn is_blank(&self) -> bool {
        self.runs
            .iter()
            .all(|r| !r.is_equation() && r.text.trim().is_empty())
    }

    /// True while no soft or hard break has been collected.
    pub(crate) fn is_single_line(&self) -> bool {
        !self.line_break
    }

    /// Takes the collected runs, leaving style state untouched.
    pub(crate) fn take(&mut self) -> RunList {
        self.line_break = false;
        RunList::new(std::mem::take(&mut self.runs))
    }

    /// Removes a leading prefix from the collected text (used for deep headings).
    pub(crate) fn strip_prefix_chars(&mut self, count: usize) {
        let mut remaining = count;
        for run in &mut self.runs {
            if remaining == 0 {
                break;
            }
            let len = run.text.chars().count();
            if len <= remaining {
                remaining -= len;
                run.text.clear();
            } else {
                run.text = run.text.chars().skip(remaining).collect();
                remaining = 0;
            }
        }
    }

    /// Plain text collected so far.
    pub(crate) fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Extracts styled runs from a fragment of inline Markdown.
///
/// Block structure is ignored: everything inline is collected in order.
/// The result is never empty.
///
/// # Example
///
/// ```
/// use larkmd::convert::extract_runs;
///
/// let runs = extract_runs("Hello **world**");
/// assert_eq!(runs.len(), 2);
/// assert!(runs.runs()[1].bold);
/// ```
pub fn extract_runs(markdown: &str) -> RunList {
    let mut collector = InlineCollector::new();
    for event in Parser::new_ext(markdown, markdown_options()) {
        collector.push_event(&event);
    }
    collector.take()
}

/// Characters that start or close inline syntax when left bare.
const INLINE_SPECIAL: &[char] = &['\\', '`', '*', '_', '[', ']', '<', '$', '~'];

/// Renders runs back to inline Markdown.
///
/// Text is escaped so that re-extracting the output yields the same text,
/// including block markers (`#`, `>`, `-`, `1.`) at the start of a line.
pub fn emit_runs(runs: &[StyledRun]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < runs.len() {
        let line_start = out.is_empty() || out.ends_with('\n');
        match &runs[i].link {
            Some(url) => {
                let start = i;
                while i < runs.len() && runs[i].link.as_deref() == Some(url.as_str()) {
                    i += 1;
                }
                let label: String = runs[start..i]
                    .iter()
                    .map(|run| emit_unlinked(run, false))
                    .collect();
                out.push_str(&format!("[{}]({})", label, url));
            }
            None => {
                out.push_str(&emit_unlinked(&runs[i], line_start));
                i += 1;
            }
        }
    }
    out
}

fn emit_unlinked(run: &StyledRun, line_start: bool) -> String {
    if let Some(eq) = &run.equation {
        return format!("${}$", eq);
    }

    let core = run.text.trim();
    if core.is_empty() {
        return run.text.clone();
    }
    if !has_flags(run) {
        return escape_text(&run.text, line_start);
    }
    let lead = &run.text[..run.text.len() - run.text.trim_start().len()];
    let trail = &run.text[run.text.trim_end().len()..];

    let mut s = if run.inline_code {
        code_span(core)
    } else {
        escape_text(core, false)
    };
    if run.strikethrough {
        s = format!("~~{}~~", s);
    }
    if run.bold {
        s = format!("**{}**", s);
    }
    if run.italic {
        s = format!("*{}*", s);
    }
    if run.underline {
        s = format!("<u>{}</u>", s);
    }
    format!("{}{}{}", lead, s, trail)
}

/// Backslash-escapes inline syntax, and block markers at line starts.
fn escape_text(text: &str, line_start: bool) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for (n, line) in text.split('\n').enumerate() {
        let mut rest = line;
        if n > 0 {
            out.push('\n');
        }
        if n > 0 || line_start {
            let body = line.trim_start_matches(' ');
            out.push_str(&line[..line.len() - body.len()]);
            rest = body;
            let digits = body.len() - body.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if body.starts_with(['#', '>', '-', '+', '=']) {
                out.push('\\');
                out.push_str(&body[..1]);
                rest = &body[1..];
            } else if digits > 0 && body[digits..].starts_with(['.', ')']) {
                out.push_str(&body[..digits]);
                out.push('\\');
                rest = &body[digits..];
            }
        }
        for c in rest.chars() {
            if INLINE_SPECIAL.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out
}

/// Wraps text in a backtick fence longer than any backtick run inside it.
fn code_span(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{} {} {}", fence, text, fence)
    } else {
        format!("{}{}{}", fence, text, fence)
    }
}

fn has_flags(run: &StyledRun) -> bool {
    run.bold || run.italic || run.underline || run.strikethrough || run.inline_code
}
