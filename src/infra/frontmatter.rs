//! Optional YAML front matter at the top of a Markdown file.

use serde::Deserialize;
use thiserror::Error;

/// Fields read from front matter. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("invalid YAML in front matter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Splits leading front matter from the Markdown body.
///
/// ```text
/// ---
/// title: Quarterly Report
/// ---
/// # Body starts here
/// ```
///
/// Content without an opening `---` line, without a closing `---` line, or
/// whose block is not a YAML mapping is returned whole: a leading `---` is
/// also a valid thematic break.
///
/// # Errors
///
/// Returns `FrontMatterError::InvalidYaml` if the delimited block is not
/// valid YAML.
pub fn split_front_matter(content: &str) -> Result<(Option<FrontMatter>, &str), FrontMatterError> {
    let after_opening = if content.starts_with("---\r\n") {
        5
    } else if content.starts_with("---\n") {
        4
    } else {
        return Ok((None, content));
    };

    let rest = &content[after_opening..];
    let Some(closing) = find_closing_delimiter(rest) else {
        return Ok((None, content));
    };

    let yaml = &rest[..closing];
    let after_closing = &rest[closing + 3..];
    let body = after_closing
        .strip_prefix("\r\n")
        .or_else(|| after_closing.strip_prefix('\n'))
        .unwrap_or(after_closing);

    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    if !value.is_mapping() {
        return Ok((None, content));
    }
    let front_matter: FrontMatter = serde_yaml::from_value(value)?;
    Ok((Some(front_matter), body))
}

/// Position of a line that is exactly `---` (followed by a newline or EOF).
fn find_closing_delimiter(content: &str) -> Option<usize> {
    let mut pos = 0;
    while pos < content.len() {
        let line_end = content[pos..]
            .find('\n')
            .map(|offset| pos + offset)
            .unwrap_or(content.len());
        if content[pos..line_end].trim_end_matches('\r') == "---" {
            return Some(pos);
        }
        pos = line_end + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn title_is_read_and_block_removed() {
        let (fm, body) = split_front_matter("---\ntitle: Report\ntags: [a]\n---\n# Body\n").unwrap();
        assert_eq!(fm.unwrap().title.as_deref(), Some("Report"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn crlf_delimiters() {
        let (fm, body) = split_front_matter("---\r\ntitle: X\r\n---\r\nbody").unwrap();
        assert_eq!(fm.unwrap().title.as_deref(), Some("X"));
        assert_eq!(body, "body");
    }

    #[test]
    fn no_front_matter_returns_whole_content() {
        let (fm, body) = split_front_matter("# Just markdown\n").unwrap();
        assert_eq!(fm, None);
        assert_eq!(body, "# Just markdown\n");
    }

    #[test]
    fn unclosed_block_is_a_thematic_break() {
        let content = "---\nsome text\n";
        let (fm, body) = split_front_matter(content).unwrap();
        assert_eq!(fm, None);
        assert_eq!(body, content);
    }

    #[test]
    fn non_mapping_block_is_left_alone() {
        let content = "---\nheading text\n---\nmore\n";
        let (fm, body) = split_front_matter(content).unwrap();
        assert_eq!(fm, None);
        assert_eq!(body, content);
    }

    #[test]
    fn empty_mapping_has_no_title() {
        let (fm, body) = split_front_matter("---\nauthor: me\n---\n").unwrap();
        assert_eq!(fm.unwrap().title, None);
        assert_eq!(body, "");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = split_front_matter("---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }
}
