use clap::Parser;
use std::process::ExitCode;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let cfg = match config::Config::load_from(&cli.config, &cli.overrides()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("[ERROR] Failed to open log files: {e}");
        return ExitCode::FAILURE;
    }

    // Create the Tokio runtime, sizing the pool from the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = match runtime_builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            logger::log_error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    match runtime.block_on(local.run_until(server::run(cfg))) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ error::RelayError::BindFault { .. }) => {
            logger::log_bind_failed(&e);
            ExitCode::FAILURE
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
