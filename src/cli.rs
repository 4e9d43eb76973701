use clap::Parser;

use crate::config::{CollisionPolicy, FaultPolicy, Overrides};

/// Store the body of every HTTP POST in a timestamped file
#[derive(Parser, Debug)]
#[command(name = "post_logger")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file, without extension
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory request bodies are written to (must exist)
    #[arg(short, long)]
    pub logs_dir: Option<String>,

    /// Tokio worker threads (defaults to CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Serve one connection at a time, in accept order
    #[arg(long)]
    pub sequential: bool,

    /// Reaction to a request that cannot be stored
    #[arg(long, value_enum)]
    pub fault_policy: Option<FaultPolicy>,

    /// Handling of two requests within the same second
    #[arg(long, value_enum)]
    pub collision: Option<CollisionPolicy>,

    /// Log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            logs_dir: self.logs_dir.clone(),
            workers: self.workers,
            // Absent flag leaves file/env value in place
            sequential: self.sequential.then_some(true),
            fault_policy: self.fault_policy,
            collision: self.collision,
            log_level: self.log_level.clone(),
        }
    }
}
