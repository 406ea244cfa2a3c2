//! treegen CLI - live tree gallery viewer
//!
//! Entry point for the `treegen` command-line tool, which provides:
//! - A line-oriented viewer that collects one run of rendered trees (`watch`)
//! - A terminal gallery view with a generate button (`tui`)
//! - The relay server that runs the generator and streams its output (`serve`)
//! - Configuration management (`config`) and shell completions

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use treegen_core::GalleryConfig;

mod commands;
mod config;
mod tracing_setup;
mod tui;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "treegen",
    author,
    version,
    about = "Live gallery for generated tree images",
    long_about = "Trigger the tree generator, follow its server-sent event stream, and collect \
                  the first rendered images as URLs - on the command line or in a terminal UI."
)]
struct Cli {
    /// Suppress progress spinners (for script consumption)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Use this config file instead of ~/.treegen/config.toml and ./treegen.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Trigger one run and print image URLs as they arrive
    Watch(commands::watch::WatchArgs),
    /// Terminal gallery view with a generate button
    Tui(tui::TuiArgs),
    /// Run the relay server (generator event stream + rendered images)
    Serve(commands::serve::ServeArgs),
    /// Manage treegen configuration (path, show, init)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Load .env from the current directory, then ~/.treegen/.env
///
/// dotenvy never overrides variables that are already set.
fn load_dotenv() {
    dotenvy::dotenv().ok();
    if let Some(dir) = treegen_core::config::config_dir() {
        dotenvy::from_path(dir.join(".env")).ok();
    }
}

fn load_config(path: Option<&Path>) -> Result<GalleryConfig> {
    match path {
        Some(path) => GalleryConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(GalleryConfig::load()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Tui(args) => Some(
            args.log_file
                .clone()
                .unwrap_or_else(tracing_setup::tui_log_path),
        ),
        _ => None,
    };
    let tracing_config = tracing_setup::TracingConfig {
        debug: cli.debug,
        log_file,
    };
    if let Err(e) = tracing_setup::init(&tracing_config) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    // Initialize UI quiet mode from flag, env var, and TTY detection
    ui::init_quiet_mode(cli.quiet);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch(args) => commands::run_watch(args, &config.client).await?,
        Commands::Tui(args) => tui::run_tui(args, &config.client).await?,
        Commands::Serve(args) => commands::run_serve(args, &config.server).await?,
        Commands::Config(args) => config::run_config(args, &config)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
