//! Caption Document Module
//!
//! Word cues, line grouping and subtitle document generation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption Documents                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - WordCue, CueList and edit correction           │
//! │  formats.rs    - ASS document builder, SRT import/export        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::core::captions::{CueList, DocumentBuilder, WordCue};
//! use crate::core::style::StyleConfig;
//!
//! let mut cues = CueList::from(vec![WordCue::new(0.0, 0.4, "Hello")]);
//! cues.set_end(0, 0.2)?;
//!
//! let ass = DocumentBuilder::default().build(cues.as_slice(), &StyleConfig::default(), 3);
//! ```

mod formats;
mod models;

pub use models::{correct_cue, CueEdge, CueList, WordCue, DEFAULT_CUE_EPSILON, MAX_CUE_TIME};

pub use formats::{
    build_document, escape_event_text, export_srt, format_time, group_lines, parse_srt,
    split_words, DocumentBuilder, ParseError, SubtitleLine, DEFAULT_STYLE_NAME,
    DEFAULT_WORDS_PER_LINE, REFERENCE_HEIGHT, REFERENCE_WIDTH,
};
