//! Demo configuration, read from a RON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trellis_engine::RuntimeConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogDestination {
    #[default]
    Terminal,
    /// `./trellis.log` in the working directory.
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisAppConfig {
    pub log_destination: LogDestination,
    /// Log at debug level, which includes one line per tick and render pass.
    pub verbose: bool,
    pub room_code: String,
    /// Players already seated when the lobby opens.
    pub players: Vec<String>,
    pub runtime: RuntimeConfig,
}

impl Default for TrellisAppConfig {
    fn default() -> Self {
        Self {
            log_destination: LogDestination::Terminal,
            verbose: false,
            room_code: "WORD".to_string(),
            players: vec!["Ada".to_string(), "Grace".to_string()],
            runtime: RuntimeConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Reads the config at `path`. A missing file is not an error and yields `None`.
pub fn load(path: &Path) -> Result<Option<TrellisAppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
