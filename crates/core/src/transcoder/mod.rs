//! Stream-to-file transcoding.
//!
//! One transcode turns a time-limited stream locator into a finished local
//! file by driving an external ffmpeg process in stream-copy mode. The
//! process runs under a hard timeout, and any partial output is deleted on
//! failure so the destination only ever holds complete files.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{TranscodeOutcome, TranscodeProgress, TranscodeRequest};
