//! FFmpeg Integration Module
//!
//! Reference transcoder for burned-in exports: detects a system FFmpeg,
//! probes source resolution, and renders the ASS document onto the video.
//!
//! Set `CAPTIONKIT_FFMPEG` to point at a specific binary.

mod detection;
mod runner;

pub use detection::*;
pub use runner::{FFmpegRunner, FfmpegTranscoder, RenderSettings};

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Install FFmpeg or set CAPTIONKIT_FFMPEG.")]
    NotFound,

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Output path error: {0}")]
    OutputError(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;
