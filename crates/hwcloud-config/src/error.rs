use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("Missing required setting '{field}' (set it in the config file or via {env})")]
    Missing {
        field: &'static str,
        env: &'static str,
    },

    #[error("Invalid setting '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
