//! Command implementations.

pub mod products;
pub mod shipping;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use segishop_admin::api::{ApiError, SegishopClient};
use segishop_admin::config::{ApiConfig, ConfigError};
use segishop_core::import::ImportError;

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Import(#[from] ImportError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The command ran but did not fully succeed.
    #[error("{0}")]
    Incomplete(String),
}

/// Build the admin API client from the environment.
fn client() -> Result<SegishopClient, CliError> {
    let config = ApiConfig::from_env()?;
    tracing::debug!(api = %config.base_url, "Using Segishop API");
    Ok(SegishopClient::new(&config)?)
}

/// Write `body` to `output`, or to stdout when no path is given.
fn write_output(output: Option<&Path>, body: &str) -> Result<(), CliError> {
    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(body.as_bytes())?;
            tracing::info!(path = %path.display(), bytes = body.len(), "Wrote file");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
