//! Reading Markdown sources and writing results atomically.

use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::infra::frontmatter::{FrontMatter, FrontMatterError, split_front_matter};

/// Errors during file system operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("atomic write failed for {path}: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parent directory does not exist: {path}")]
    ParentNotFound { path: PathBuf },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("invalid encoding in {path}: {encoding}")]
    InvalidEncoding { path: PathBuf, encoding: String },
}

impl FsError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: path.into() },
            _ => FsError::Io {
                path: path.into(),
                source: error,
            },
        }
    }
}

/// A Markdown source ready for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownSource {
    pub path: PathBuf,
    pub front_matter: Option<FrontMatter>,
    /// Markdown with the front matter block removed.
    pub body: String,
}

impl MarkdownSource {
    /// Front matter title, falling back to the file stem.
    pub fn title(&self) -> Option<String> {
        self.front_matter
            .as_ref()
            .and_then(|fm| fm.title.clone())
            .or_else(|| {
                self.path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
    }
}

/// Reads a Markdown file.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the file doesn't exist.
/// Returns `FsError::PermissionDenied` if access is denied.
/// Returns `FsError::InvalidEncoding` if the file is not UTF-8.
/// Returns `FsError::FrontMatter` if a front matter block is not valid YAML.
pub fn read_markdown(path: &Path) -> Result<MarkdownSource, FsError> {
    let bytes = std::fs::read(path).map_err(|e| FsError::from_io(path, e))?;
    parse_markdown_bytes(bytes, path)
}

/// Decodes already-read bytes as a Markdown source.
pub fn parse_markdown_bytes(bytes: Vec<u8>, path: &Path) -> Result<MarkdownSource, FsError> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(FsError::InvalidEncoding {
            path: path.into(),
            encoding: "UTF-16 LE detected (byte order mark FF FE); convert to UTF-8".into(),
        });
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(FsError::InvalidEncoding {
            path: path.into(),
            encoding: "UTF-16 BE detected (byte order mark FE FF); convert to UTF-8".into(),
        });
    }

    let content = String::from_utf8(bytes).map_err(|e| FsError::InvalidEncoding {
        path: path.into(),
        encoding: format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
    })?;
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(&content);

    let (front_matter, body) = split_front_matter(content).map_err(|e| FsError::FrontMatter {
        path: path.into(),
        source: e,
    })?;

    Ok(MarkdownSource {
        path: path.to_path_buf(),
        front_matter,
        body: body.to_string(),
    })
}

/// Writes `content` to `path` through a temporary file and rename.
///
/// The parent directory must exist.
///
/// # Errors
///
/// Returns `FsError::ParentNotFound` if the parent directory doesn't exist.
/// Returns `FsError::AtomicWrite` if the rename fails.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), FsError> {
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(FsError::ParentNotFound { path: path.into() }),
    };

    if !parent.exists() {
        return Err(FsError::ParentNotFound {
            path: parent.into(),
        });
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| FsError::Io {
        path: path.into(),
        source: e,
    })?;

    temp.write_all(content.as_bytes())
        .map_err(|e| FsError::Io {
            path: path.into(),
            source: e,
        })?;

    temp.persist(path).map_err(|e| FsError::AtomicWrite {
        path: path.into(),
        source: e.error,
    })?;

    Ok(())
}

/// Scans a directory recursively for Markdown (`.md`, `.markdown`) files.
///
/// Skips hidden files and directories. Paths are returned sorted, joined
/// onto `dir`.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the directory doesn't exist.
/// Returns `FsError::NotADirectory` if the path is not a directory.
pub fn scan_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, FsError> {
    if !dir.exists() {
        return Err(FsError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(FsError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(has_markdown_extension)
        .map(DirEntry::into_path)
        .collect();
    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn has_markdown_extension(entry: &DirEntry) -> bool {
    entry
        .path()
        .extension()
        .is_some_and(|e| e == "md" || e == "markdown")
}
