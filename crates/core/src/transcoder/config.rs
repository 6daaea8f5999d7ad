use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_reconnect_delay_max_secs() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Wall-clock limit for a single transcode, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// ffmpeg `-loglevel` value.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum delay between stream reconnect attempts, in seconds.
    #[serde(default = "default_reconnect_delay_max_secs")]
    pub reconnect_delay_max_secs: u32,

    /// Additional ffmpeg arguments, appended before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout_secs(),
            log_level: default_log_level(),
            reconnect_delay_max_secs: default_reconnect_delay_max_secs(),
            extra_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
