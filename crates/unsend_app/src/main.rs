use std::path::PathBuf;

use clap::{Parser, ValueEnum};

mod platform;

/// Dry-runs the bulk-unsend engine against a conversation fixture.
#[derive(Debug, Parser)]
#[command(name = "unsend", version)]
pub struct Args {
    /// HTML fixture of an open conversation.
    #[arg(long)]
    pub fixture: PathBuf,

    /// RON file overriding engine tunables.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pause after each removal, in milliseconds.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub delay: i64,

    /// Apply the delete/ignore keyword lists.
    #[arg(long)]
    pub keywords: bool,

    /// Only remove messages containing one of these (comma separated).
    #[arg(long, default_value = "")]
    pub delete: String,

    /// Never remove messages containing one of these (comma separated).
    #[arg(long, default_value = "")]
    pub ignore: String,

    /// Skip the UI settle pauses; a fixture has nothing to settle.
    #[arg(long)]
    pub instant: bool,

    /// Request a stop once this many messages were removed.
    #[arg(long)]
    pub stop_after: Option<usize>,

    /// Print host events as JSON lines instead of plain status lines.
    #[arg(long)]
    pub json: bool,

    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

fn main() -> anyhow::Result<()> {
    platform::run_app(Args::parse())
}
