//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::OutputFormat;

/// larkmd - convert Markdown to Lark/Feishu document blocks and back
#[derive(Parser, Debug)]
#[command(name = "larkmd", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/larkmd/config.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Access token (overrides LARKMD_ACCESS_TOKEN and the config file)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// API host (overrides LARKMD_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert Markdown offline and show the resulting blocks
    Convert(ConvertArgs),

    /// Convert a file and append its blocks to an existing document
    Upload(UploadArgs),

    /// Create a new document from a Markdown file
    Create(CreateArgs),

    /// Download a document as Markdown
    Download(DownloadArgs),

    /// Render a saved block listing (JSON) as Markdown
    Render(RenderArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `convert` command
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Markdown file, or a directory searched recursively for .md files
    pub path: PathBuf,

    /// Output format (json prints the full dispatch plan)
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `upload` command
#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// Markdown file to upload
    pub file: PathBuf,

    /// Target document id
    #[arg(short = 'd', long)]
    pub document: String,

    /// Parent block id (default: the document's page block)
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Insertion index under the parent (default: append)
    #[arg(short, long)]
    pub index: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `create` command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Markdown file to upload
    pub file: PathBuf,

    /// Document title (default: front matter title, then file name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Folder token to create the document in
    #[arg(long)]
    pub folder: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `download` command
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Document id
    pub document: String,

    /// Write Markdown to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Render the document title as a leading heading
    #[arg(long)]
    pub title: bool,
}

/// Arguments for the `render` command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// JSON file holding a block array or `{ "items": [...] }`
    pub blocks: PathBuf,

    /// Root block id (default: the first page block)
    #[arg(short, long)]
    pub root: Option<String>,

    /// Write Markdown to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Render the document title as a leading heading
    #[arg(long)]
    pub title: bool,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
