//! Subtitle Document Formats
//!
//! Serializes word cues into an ASS (Advanced SubStation Alpha) document and
//! exchanges cues with SRT files.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::core::captions::{build_document, WordCue};
//! use crate::core::style::StyleConfig;
//!
//! let cues = vec![WordCue::new(0.0, 1.0, "Hi"), WordCue::new(1.0, 2.0, "there")];
//! let ass = build_document(&cues, &StyleConfig::default(), 2);
//! ```

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::WordCue;
use crate::core::color::{hex_to_packed, ColorRole};
use crate::core::style::StyleConfig;
use crate::core::TimeSec;

/// Reference canvas width the document coordinates are authored against
pub const REFERENCE_WIDTH: u32 = 1920;
/// Reference canvas height the document coordinates are authored against
pub const REFERENCE_HEIGHT: u32 = 1080;
/// Name of the single style record
pub const DEFAULT_STYLE_NAME: &str = "Default";
/// Words per displayed line when unspecified
pub const DEFAULT_WORDS_PER_LINE: usize = 3;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Outline + drop shadow
const BORDER_STYLE_OUTLINE: u8 = 1;
/// Default character set
const ENCODING_DEFAULT: u8 = 1;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during subtitle parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid timestamp format
    InvalidTimestamp(String),
    /// Invalid block format
    InvalidFormat(String),
    /// Missing required data
    MissingData(String),
    /// Unexpected end of input
    UnexpectedEnd,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            Self::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            Self::MissingData(s) => write!(f, "Missing data: {}", s),
            Self::UnexpectedEnd => write!(f, "Unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {}

// =============================================================================
// Line Grouping
// =============================================================================

/// Consecutive cues merged into one displayed subtitle event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubtitleLine {
    /// Start of the first cue in the chunk
    pub start: TimeSec,
    /// End of the last cue in the chunk
    pub end: TimeSec,
    /// Space-joined cue text
    pub text: String,
    /// Index of the first cue in the source list
    pub first_cue: usize,
    /// Number of cues in the chunk
    pub cue_count: usize,
}

impl SubtitleLine {
    /// Returns true if `cue_index` belongs to this line
    pub fn contains_cue(&self, cue_index: usize) -> bool {
        cue_index >= self.first_cue && cue_index < self.first_cue + self.cue_count
    }
}

/// Groups cues into lines of `words_per_line` consecutive cues (0 is read as 1).
pub fn group_lines(cues: &[WordCue], words_per_line: usize) -> Vec<SubtitleLine> {
    let chunk_size = words_per_line.max(1);

    cues.chunks(chunk_size)
        .enumerate()
        .filter_map(|(chunk_index, chunk)| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            Some(SubtitleLine {
                start: first.start,
                end: last.end,
                text: chunk
                    .iter()
                    .map(|c| c.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
                first_cue: chunk_index * chunk_size,
                cue_count: chunk.len(),
            })
        })
        .collect()
}

// =============================================================================
// Timestamp Formatting
// =============================================================================

/// Slack added before truncating to centiseconds, in centiseconds (10 ns).
///
/// Absorbs binary noise such as `3725.07 * 100 = 372506.99999999994`. Times
/// less than 10 ns below a centisecond boundary format as that boundary.
const CENTISECOND_TOLERANCE: f64 = 1e-6;

/// Formats seconds as an ASS timestamp `H:MM:SS.cc`.
///
/// Centiseconds are truncated, not rounded, so adjacent cues sharing a
/// centisecond never overlap. The only exception is the 10 ns
/// `CENTISECOND_TOLERANCE` below a boundary. Hours are unbounded. Negative
/// and non-finite input formats as zero.
pub fn format_time(seconds: TimeSec) -> String {
    let seconds = if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    };

    let total_cs = (seconds * 100.0 + CENTISECOND_TOLERANCE).floor() as u64;
    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, cs)
}

/// Converts event text to ASS: newlines become `\N`, carriage returns vanish
/// and braces are escaped so user text never opens an override block.
pub fn escape_event_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => {}
            '\n' => escaped.push_str("\\N"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Style record fields are comma separated; commas inside names are replaced.
fn escape_style_field(value: &str) -> String {
    value.replace(',', " ").replace(['\r', '\n'], "")
}

/// Formats a number without a trailing `.0`, keeping at most two decimals.
fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        return format!("{}", rounded as i64);
    }
    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').to_string()
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

// =============================================================================
// Document Builder
// =============================================================================

/// Serializes a style and word cues into ASS text.
///
/// Pure: identical inputs always produce byte-identical output.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentBuilder {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub style_name: String,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self {
            play_res_x: REFERENCE_WIDTH,
            play_res_y: REFERENCE_HEIGHT,
            style_name: DEFAULT_STYLE_NAME.to_string(),
        }
    }
}

impl DocumentBuilder {
    pub fn new(play_res_x: u32, play_res_y: u32, style_name: &str) -> Self {
        let style_name = escape_style_field(style_name.trim());
        Self {
            play_res_x: play_res_x.max(1),
            play_res_y: play_res_y.max(1),
            style_name: if style_name.is_empty() {
                DEFAULT_STYLE_NAME.to_string()
            } else {
                style_name
            },
        }
    }

    /// Builds the complete document.
    pub fn build(&self, cues: &[WordCue], style: &StyleConfig, words_per_line: usize) -> String {
        let lines = group_lines(cues, words_per_line);

        let mut doc = String::with_capacity(512 + lines.len() * 64);
        self.write_script_info(&mut doc);
        doc.push('\n');
        self.write_styles(&mut doc, style);
        doc.push('\n');
        self.write_events(&mut doc, &lines);
        doc
    }

    fn write_script_info(&self, doc: &mut String) {
        doc.push_str("[Script Info]\n");
        doc.push_str("ScriptType: v4.00+\n");
        let _ = writeln!(doc, "PlayResX: {}", self.play_res_x);
        let _ = writeln!(doc, "PlayResY: {}", self.play_res_y);
        doc.push_str("WrapStyle: 0\n");
        doc.push_str("ScaledBorderAndShadow: yes\n");
    }

    fn write_styles(&self, doc: &mut String, style: &StyleConfig) {
        doc.push_str("[V4+ Styles]\n");
        doc.push_str(STYLE_FORMAT);
        doc.push('\n');

        let fields: [String; 23] = [
            self.style_name.clone(),
            escape_style_field(&style.font),
            format_number(style.font_size),
            hex_to_packed(&style.primary_color, ColorRole::Primary),
            hex_to_packed(&style.secondary_color, ColorRole::Secondary),
            hex_to_packed(&style.outline_color, ColorRole::Outline),
            hex_to_packed(&style.back_color, ColorRole::Back),
            flag(style.bold).to_string(),
            flag(style.italic).to_string(),
            flag(style.underline).to_string(),
            flag(style.strikeout).to_string(),
            format_number(style.scale_x),
            format_number(style.scale_y),
            format_number(style.letter_spacing),
            format_number(style.rotation),
            BORDER_STYLE_OUTLINE.to_string(),
            format_number(style.border),
            format_number(style.shadow),
            style.alignment.code().to_string(),
            style.margin_l.to_string(),
            style.margin_r.to_string(),
            style.margin_v.to_string(),
            ENCODING_DEFAULT.to_string(),
        ];

        let _ = writeln!(doc, "Style: {}", fields.join(","));
    }

    fn write_events(&self, doc: &mut String, lines: &[SubtitleLine]) {
        doc.push_str("[Events]\n");
        doc.push_str(EVENT_FORMAT);
        doc.push('\n');

        for line in lines {
            let _ = writeln!(
                doc,
                "Dialogue: 0,{},{},{},,0,0,0,,{}",
                format_time(line.start),
                format_time(line.end),
                self.style_name,
                escape_event_text(&line.text)
            );
        }
    }
}

/// Builds a document against the default reference canvas.
pub fn build_document(cues: &[WordCue], style: &StyleConfig, words_per_line: usize) -> String {
    DocumentBuilder::default().build(cues, style, words_per_line)
}

// =============================================================================
// SRT Format
// =============================================================================

/// Parses SRT (SubRip) content. Each block becomes one cue.
///
/// ```text
/// 1
/// 00:00:01,000 --> 00:00:04,000
/// First caption text
/// ```
pub fn parse_srt(content: &str) -> Result<Vec<WordCue>, ParseError> {
    let mut cues = Vec::new();
    let mut lines = content.lines().map(|l| l.trim_end_matches('\r')).peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let Some(first) = lines.next() else {
            break;
        };

        // The sequence number is optional in the wild.
        let timestamp_line = if first.contains("-->") {
            first
        } else {
            lines.next().ok_or(ParseError::UnexpectedEnd)?
        };
        let (start, end) = parse_srt_timestamp_line(timestamp_line)?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            text_lines.push(line.to_string());
        }

        if text_lines.is_empty() {
            return Err(ParseError::MissingData("Caption text".to_string()));
        }

        cues.push(WordCue::new(start, end, &text_lines.join("\n")));
    }

    Ok(cues)
}

/// Parses an SRT timestamp line (e.g., "00:00:01,000 --> 00:00:04,000")
fn parse_srt_timestamp_line(line: &str) -> Result<(TimeSec, TimeSec), ParseError> {
    let (start, end) = line.split_once("-->").ok_or_else(|| {
        ParseError::InvalidFormat(format!("Expected 'start --> end' format: {}", line))
    })?;

    // Position cues may follow the end timestamp
    let end = end.split_whitespace().next().unwrap_or_default();

    Ok((parse_srt_timestamp(start.trim())?, parse_srt_timestamp(end)?))
}

/// Parses an SRT timestamp (e.g., "00:01:23,456") into seconds
fn parse_srt_timestamp(ts: &str) -> Result<TimeSec, ParseError> {
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    if parts.len() != 3 {
        return Err(ParseError::InvalidTimestamp(ts.to_string()));
    }

    let parse = |s: &str| -> Result<f64, ParseError> {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| ParseError::InvalidTimestamp(ts.to_string()))
    };

    Ok(parse(parts[0])? * 3600.0 + parse(parts[1])? * 60.0 + parse(parts[2])?)
}

/// Exports grouped lines as SRT
pub fn export_srt(lines: &[SubtitleLine]) -> String {
    let mut output = String::new();

    for (index, line) in lines.iter().enumerate() {
        let _ = writeln!(output, "{}", index + 1);
        let _ = writeln!(
            output,
            "{} --> {}",
            format_srt_timestamp(line.start),
            format_srt_timestamp(line.end)
        );
        output.push_str(&line.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

/// Formats seconds as SRT timestamp (00:00:00,000)
fn format_srt_timestamp(seconds: TimeSec) -> String {
    let seconds = if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    };
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

/// Splits multi-word cues into word cues, sharing each cue's time evenly.
///
/// Used after SRT import, where one block carries a whole phrase.
pub fn split_words(cues: &[WordCue]) -> Vec<WordCue> {
    let mut words = Vec::new();

    for cue in cues {
        let tokens: Vec<&str> = cue.text.split_whitespace().collect();
        if tokens.len() <= 1 {
            words.push(cue.clone());
            continue;
        }

        let step = cue.duration() / tokens.len() as f64;
        for (i, token) in tokens.iter().enumerate() {
            let start = cue.start + step * i as f64;
            let end = if i + 1 == tokens.len() {
                cue.end
            } else {
                start + step
            };
            words.push(WordCue::new(start, end, token));
        }
    }

    words
}

// =============================================================================
// Tests
// =============================================================================
