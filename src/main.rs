use std::{io, sync::Arc};

use colored::Colorize;
use log::{error, info, LevelFilter};
use stranger_core::Matchmaker;
use stranger_server::ServerConfig;
use thiserror::Error;
use tokio::runtime::{self, Runtime};

use crate::logging::LogColor;

mod config;
mod logging;

pub struct Stranger {
    matchmaker: Arc<Matchmaker>,
    server_config: ServerConfig,
    runtime: Runtime,
}

#[derive(Debug, Error)]
pub enum StrangerError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Server stopped: {0}")]
    Server(#[from] io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Stranger {
    fn new() -> Result<Self, StrangerError> {
        let (config, server_config) = config::from_env()?;

        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("stranger-async")
            .build()
            .map_err(|e| StrangerError::Fatal(e.to_string()))?;

        info!(
            "Filtered searches are limited to {} per device per day",
            config.daily_filter_limit
        );

        Ok(Self {
            matchmaker: Arc::new(Matchmaker::new(config)),
            server_config,
            runtime,
        })
    }

    fn run(self) -> Result<(), StrangerError> {
        let server = stranger_server::run_server(self.matchmaker, self.server_config);
        self.runtime.block_on(server)?;

        Ok(())
    }
}

impl StrangerError {
    fn hint(&self) -> String {
        match self {
            StrangerError::InvalidEnv { .. } => "Check the environment variables passed to the server. Ports and limits must be whole numbers and flags must be true or false. The log level is one of off, error, warn, info, debug or trace.".to_string(),
            StrangerError::Server(_) => "The server could not listen or stopped unexpectedly. Make sure the port is not already in use.".to_string(),
            StrangerError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn report(error: StrangerError) {
    error!(
        "{} Read the error below to troubleshoot the issue.",
        "Stranger failed!".bold().color(LogColor::Red)
    );
    error!("{}", error);
    error!(
        "{}",
        format!("Hint: {}", error.hint())
            .color(LogColor::Dimmed)
            .italic()
    );
}

fn main() {
    let log_level = config::log_level();
    logging::init_logger(*log_level.as_ref().unwrap_or(&LevelFilter::Info));

    let result = log_level.and_then(|_| Stranger::new()).and_then(|stranger| {
        info!("Initialized successfully.");
        stranger.run()
    });

    if let Err(error) = result {
        report(error);
        std::process::exit(1);
    }
}
