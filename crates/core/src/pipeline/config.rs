use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_workers() -> usize {
    3
}

fn default_queue_high_water() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent transcode workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Queue capacity; the producer blocks once this many jobs are waiting.
    #[serde(default = "default_queue_high_water")]
    pub queue_high_water: usize,

    /// Transcode attempts per item before it is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between transcode attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_high_water: default_queue_high_water(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl PipelineConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_high_water(mut self, capacity: usize) -> Self {
        self.queue_high_water = capacity;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_retry_delay_secs(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }
}
