use std::{env, str::FromStr, time::Duration};

use log::LevelFilter;
use stranger_core::Config;
use stranger_server::{ServerConfig, DEFAULT_PORT};

use crate::StrangerError;

/// Reads the engine and server configuration from the environment,
/// falling back to the defaults for anything unset.
pub fn from_env() -> Result<(Config, ServerConfig), StrangerError> {
    from_lookup(|name| env::var(name).ok())
}

/// Reads `STRANGER_LOG_LEVEL`, which defaults to info.
pub fn log_level() -> Result<LevelFilter, StrangerError> {
    log_level_from(|name| env::var(name).ok())
}

fn log_level_from<F>(lookup: F) -> Result<LevelFilter, StrangerError>
where
    F: Fn(&'static str) -> Option<String>,
{
    read(&lookup, "STRANGER_LOG_LEVEL", LevelFilter::Info)
}

fn from_lookup<F>(lookup: F) -> Result<(Config, ServerConfig), StrangerError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let defaults = Config::default();

    // Hosting platforms usually hand out the port through PORT
    let port = match lookup("STRANGER_PORT") {
        Some(value) => parse("STRANGER_PORT", value)?,
        None => read(&lookup, "PORT", DEFAULT_PORT)?,
    };

    let sweep_secs = read(
        &lookup,
        "STRANGER_LEDGER_SWEEP_SECS",
        defaults.ledger_sweep_interval.as_secs(),
    )?;

    if sweep_secs == 0 {
        return Err(StrangerError::InvalidEnv {
            name: "STRANGER_LEDGER_SWEEP_SECS",
            value: sweep_secs.to_string(),
        });
    }

    let config = Config {
        daily_filter_limit: read(
            &lookup,
            "STRANGER_DAILY_FILTER_LIMIT",
            defaults.daily_filter_limit,
        )?,
        ledger_sweep_interval: Duration::from_secs(sweep_secs),
    };

    let server_config = ServerConfig {
        port,
        legacy_system_messages: read(&lookup, "STRANGER_LEGACY_SYSTEM_MESSAGES", true)?,
    };

    Ok((config, server_config))
}

fn read<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, StrangerError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => parse(name, value),
        None => Ok(default),
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, StrangerError> {
    value
        .trim()
        .parse()
        .map_err(|_| StrangerError::InvalidEnv { name, value })
}
