//! Styled text runs and the non-empty run list.

use serde::Serialize;

/// A contiguous span of inline text sharing one combination of formatting flags.
///
/// A run is either a text run (`equation` is `None`) or an inline equation
/// (`equation` is `Some` and `text` is empty). Style flags are orthogonal and
/// may combine freely on a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub inline_code: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl StyledRun {
    /// Creates an unstyled text run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates an inline equation run with empty text.
    pub fn equation(content: impl Into<String>) -> Self {
        Self {
            equation: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn is_equation(&self) -> bool {
        self.equation.is_some()
    }

    /// Returns true if both runs carry the same flags, link and kind.
    ///
    /// Adjacent runs with the same style can be merged into one.
    pub fn same_style(&self, other: &Self) -> bool {
        self.bold == other.bold
            && self.italic == other.italic
            && self.underline == other.underline
            && self.strikethrough == other.strikethrough
            && self.inline_code == other.inline_code
            && self.link == other.link
            && self.equation.is_none()
            && other.equation.is_none()
    }

    /// Returns true if the run carries no flags, link or equation.
    pub fn is_unstyled(&self) -> bool {
        self.same_style(&Self::default())
    }

    /// Length of the visible content in chars (equation source for equations).
    pub fn char_len(&self) -> usize {
        match &self.equation {
            Some(eq) => eq.chars().count(),
            None => self.text.chars().count(),
        }
    }

    /// Returns a copy of this run's style holding different text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            equation: None,
            ..self.clone()
        }
    }
}

/// An ordered list of runs that is never empty.
///
/// The vendor rejects a text payload with zero elements, so construction
/// substitutes a single empty run when there is nothing else to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunList(Vec<StyledRun>);

impl RunList {
    /// Builds a run list, merging adjacent runs with identical style and
    /// padding with an empty run if nothing remains.
    pub fn new(runs: Vec<StyledRun>) -> Self {
        let mut merged: Vec<StyledRun> = Vec::with_capacity(runs.len());
        for run in runs {
            if !run.is_equation() && run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.same_style(&run) => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        if merged.is_empty() {
            merged.push(StyledRun::plain(""));
        }
        Self(merged)
    }

    /// A run list holding one run with the given plain text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self(vec![StyledRun::plain(text)])
    }

    /// The placeholder list: one run with empty text.
    pub fn empty() -> Self {
        Self::plain("")
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true when the list is only the empty placeholder.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|r| !r.is_equation() && r.text.is_empty())
    }

    /// Concatenated text of all text runs (equations excluded).
    pub fn plain_text(&self) -> String {
        self.0.iter().map(|r| r.text.as_str()).collect()
    }

    /// Total visible length in chars.
    pub fn char_len(&self) -> usize {
        self.0.iter().map(StyledRun::char_len).sum()
    }

    /// Splits the runs into consecutive lists of at most `limit` chars each.
    ///
    /// Text runs are cut on char boundaries; equation runs are never cut.
    /// A limit of zero disables splitting.
    pub fn split_at_chars(self, limit: usize) -> Vec<RunList> {
        if limit == 0 || self.char_len() <= limit {
            return vec![self];
        }

        let mut chunks = Vec::new();
        let mut current: Vec<StyledRun> = Vec::new();
        let mut used = 0usize;

        for run in self.0 {
            if run.is_equation() {
                if used > 0 && used + run.char_len() > limit {
                    chunks.push(RunList::new(std::mem::take(&mut current)));
                    used = 0;
                }
                used += run.char_len();
                current.push(run);
                continue;
            }

            let mut rest: &str = &run.text;
            while !rest.is_empty() {
                if used >= limit {
                    chunks.push(RunList::new(std::mem::take(&mut current)));
                    used = 0;
                }
                let room = limit - used;
                let cut = rest
                    .char_indices()
                    .nth(room)
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                let (head, tail) = rest.split_at(cut);
                used += head.chars().count();
                current.push(run.with_text(head));
                rest = tail;
            }
        }

        if !current.is_empty() {
            chunks.push(RunList::new(current));
        }
        chunks
    }

    pub fn into_inner(self) -> Vec<StyledRun> {
        self.0
    }
}

impl Default for RunList {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a RunList {
    type Item = &'a StyledRun;
    type IntoIter = std::slice::Iter<'a, StyledRun>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bold(text: &str) -> StyledRun {
        StyledRun {
            bold: true,
            ..StyledRun::plain(text)
        }
    }

    #[test]
    fn empty_input_yields_placeholder_run() {
        let list = RunList::new(Vec::new());
        assert_eq!(list.len(), 1);
        assert_eq!(list.runs()[0], StyledRun::plain(""));
        assert!(list.is_blank());
    }

    #[test]
    fn only_empty_runs_collapse_to_one_placeholder() {
        let list = RunList::new(vec![StyledRun::plain(""), bold("")]);
        assert_eq!(list.len(), 1);
        assert!(list.is_blank());
    }

    #[test]
    fn adjacent_runs_with_same_style_merge() {
        let list = RunList::new(vec![
            StyledRun::plain("Hello"),
            StyledRun::plain(", "),
            bold("world"),
            bold("!"),
        ]);
        assert_eq!(list.runs(), &[StyledRun::plain("Hello, "), bold("world!")]);
    }

    #[test]
    fn equations_never_merge() {
        let list = RunList::new(vec![StyledRun::equation("a"), StyledRun::equation("b")]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn empty_equation_is_kept() {
        let list = RunList::new(vec![StyledRun::equation("")]);
        assert_eq!(list.runs(), &[StyledRun::equation("")]);
        assert!(!list.is_blank());
    }

    #[test]
    fn split_5000_chars_into_three_chunks() {
        let text = "a".repeat(5000);
        let chunks = RunList::plain(text.clone()).split_at_chars(2000);

        assert_eq!(chunks.len(), 3);
        let lens: Vec<usize> = chunks.iter().map(RunList::char_len).collect();
        assert_eq!(lens, vec![2000, 2000, 1000]);
        let joined: String = chunks.iter().map(RunList::plain_text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn split_respects_multibyte_chars() {
        let text = "é".repeat(5);
        let chunks = RunList::plain(text.clone()).split_at_chars(2);
        let lens: Vec<usize> = chunks.iter().map(RunList::char_len).collect();
        assert_eq!(lens, vec![2, 2, 1]);
        let joined: String = chunks.iter().map(RunList::plain_text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn split_preserves_styles_across_boundary() {
        let list = RunList::new(vec![StyledRun::plain("abc"), bold("defg")]);
        let chunks = list.split_at_chars(4);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].runs(), &[StyledRun::plain("abc"), bold("d")]);
        assert_eq!(chunks[1].runs(), &[bold("efg")]);
    }

    #[test]
    fn split_under_limit_is_identity() {
        let list = RunList::plain("short");
        assert_eq!(list.clone().split_at_chars(2000), vec![list]);
    }

    #[test]
    fn split_with_zero_limit_is_disabled() {
        let list = RunList::plain("abc");
        assert_eq!(list.clone().split_at_chars(0), vec![list]);
    }
}
