//! CaptionKit Core Engine
//!
//! Styled subtitle pipeline: style model, colour codec, ASS document
//! generation, cue timeline, preview sync and burned-in export.

pub mod captions;
pub mod color;
pub mod ffmpeg;
pub mod fs;
pub mod preview;
pub mod process;
pub mod render;
pub mod session;
pub mod settings;
pub mod style;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
