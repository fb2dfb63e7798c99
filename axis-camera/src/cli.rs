use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Drive an Axis PTZ camera over HTTP and watch its connection health"
)]
pub struct Args {
    /// Device config file (JSON)
    #[arg(long)]
    pub config: PathBuf,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write hourly rolling log files to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// HTTP request timeout in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub timeout_ms: u64,

    /// Answer every command locally instead of contacting the camera
    #[arg(long)]
    pub dry_run: bool,
}
