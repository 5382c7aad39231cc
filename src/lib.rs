//! larkmd - convert Markdown to Lark/Feishu document blocks and back

pub mod cli;
pub mod convert;
pub mod domain;
pub mod infra;
pub mod remote;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use cli::{
    Cli, Command, CompletionsArgs,
    config::Config,
    handlers::{handle_convert, handle_create, handle_download, handle_render, handle_upload},
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Completions(args) = &cli.command {
        return handle_completions(args);
    }

    let config = Config::load(cli.config.as_deref())?.with_overrides(
        |key| std::env::var(key).ok(),
        cli.token.as_deref(),
        cli.base_url.as_deref(),
    );

    match &cli.command {
        Command::Convert(args) => handle_convert(args, &config),
        Command::Upload(args) => handle_upload(args, &config),
        Command::Create(args) => handle_create(args, &config),
        Command::Download(args) => handle_download(args, &config),
        Command::Render(args) => handle_render(args, &config),
        Command::Completions(args) => handle_completions(args),
    }
}

/// `-v` info, `-vv` debug, `-vvv` trace; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

fn handle_completions(args: &CompletionsArgs) -> Result<()> {
    let mut command = Cli::command();
    clap_complete::generate(args.shell, &mut command, "larkmd", &mut std::io::stdout());
    Ok(())
}
