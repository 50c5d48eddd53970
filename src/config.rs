//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "workout-timer")]
#[command(about = "A state-managed HTTP server timing an active workout and its rests")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Workout plan JSON file; a built-in full-body plan is used when omitted
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// File the session stopwatch is persisted to
    #[arg(long, default_value = "workout-session.json")]
    pub state_file: PathBuf,

    /// Ignore any persisted session and start from zero
    #[arg(long)]
    pub fresh: bool,

    /// Seconds added or removed by one rest adjustment step
    #[arg(long, default_value = "15")]
    pub rest_step: u64,

    /// Seconds between automatic session snapshots
    #[arg(long, default_value = "15")]
    pub autosave_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
