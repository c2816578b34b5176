mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clipctl")]
#[command(about = "Manage and play a playlist of clips cut from one video")]
#[command(version)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source duration in seconds (probed with ffprobe when omitted)
    #[arg(long, global = true)]
    duration: Option<f64>,

    #[command(subcommand)]
    command: ClipCommand,
}

#[derive(Subcommand, Debug)]
enum ClipCommand {
    /// Print the clip list
    List {
        /// Only show clips carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Append a clip
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: String,
    },

    /// Replace fields of an existing clip
    Edit {
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },

    /// Remove a clip (the full video cannot be removed)
    Delete { index: usize },

    /// Play clips in order with ffplay, pausing between clips
    Play {
        /// First clip to play
        #[arg(long, default_value_t = 0)]
        from: usize,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = playlist::PlaylistConfig::load(cli.config.as_deref())?;

    match cli.command {
        ClipCommand::List { tag } => commands::list(&config, tag.as_deref()),
        ClipCommand::Add {
            name,
            start,
            end,
            tags,
        } => commands::add(
            &config,
            cli.duration,
            commands::DraftInput {
                name: Some(name),
                start: Some(start),
                end: Some(end),
                tags: Some(tags),
            },
        ),
        ClipCommand::Edit {
            index,
            name,
            start,
            end,
            tags,
        } => commands::edit(
            &config,
            cli.duration,
            index,
            commands::DraftInput {
                name,
                start,
                end,
                tags,
            },
        ),
        ClipCommand::Delete { index } => commands::delete(&config, index),
        ClipCommand::Play { from } => commands::play(&config, cli.duration, from),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
