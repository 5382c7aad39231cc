//! File I/O: reading Markdown sources, front matter, atomic writes

mod frontmatter;
mod fs;

pub use frontmatter::{FrontMatter, FrontMatterError, split_front_matter};
pub use fs::{
    FsError, MarkdownSource, parse_markdown_bytes, read_markdown, scan_markdown_files,
    write_atomic,
};
