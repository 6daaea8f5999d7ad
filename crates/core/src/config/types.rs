use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::PipelineConfig;
use crate::resolver::ResolverConfig;
use crate::transcoder::TranscoderConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

fn default_output_root() -> PathBuf {
    PathBuf::from("videos")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("downloads.json")
}

fn default_failure_list_path() -> PathBuf {
    PathBuf::from("failed-downloads.json")
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for finished media files.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Path of the JSON status ledger.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Path of the exhausted-items list.
    #[serde(default = "default_failure_list_path")]
    pub failure_list_path: PathBuf,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub transcoder: TranscoderConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            ledger_path: default_ledger_path(),
            failure_list_path: default_failure_list_path(),
            pipeline: PipelineConfig::default(),
            transcoder: TranscoderConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl Config {
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    pub fn with_failure_list_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.failure_list_path = path.into();
        self
    }
}
