pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recents")]
#[command(about = "List recent documents across providers and user profiles")]
pub struct Args {
    /// Path to the recents directory (defaults to ~/.recents)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    /// Also write daily rolling logs to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
