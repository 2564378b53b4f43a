//! FFmpeg Runner Module
//!
//! Executes FFmpeg commands for probing sources and burning subtitles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use super::{detect_ffmpeg, FFmpegError, FFmpegInfo, FFmpegResult};
use crate::core::process::configure_tokio_command;
use crate::core::render::{ExportRequest, Transcoder};
use crate::core::{CoreError, CoreResult, Size};

/// Encoder settings for burned-in renders
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    /// Video codec (e.g., "libx264")
    pub video_codec: String,
    /// Encoding preset (e.g., "medium", "fast")
    pub preset: String,
    /// Quality setting (CRF, 0-51)
    pub crf: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 20,
        }
    }
}

/// FFmpeg command runner
pub struct FFmpegRunner {
    info: Arc<FFmpegInfo>,
}

impl FFmpegRunner {
    /// Create a new FFmpeg runner with the given FFmpeg info
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
        }
    }

    /// Get the FFmpeg info
    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }

    /// Reads the native resolution of the first video stream
    pub async fn probe_video_size(&self, input: &Path) -> FFmpegResult<Size> {
        if !input.exists() {
            return Err(FFmpegError::InvalidInput(format!(
                "File not found: {}",
                input.display()
            )));
        }

        let ffprobe = self
            .info
            .ffprobe_path
            .as_deref()
            .ok_or_else(|| FFmpegError::ProbeError("ffprobe is not available".to_string()))?;

        let mut cmd = Command::new(ffprobe);
        configure_tokio_command(&mut cmd);
        let output = cmd
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(input)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FFmpegError::ProbeError(stderr.trim().to_string()));
        }

        parse_probe_size(&String::from_utf8_lossy(&output.stdout))
    }

    /// Renders `input` with the ASS file at `subtitles` burned in.
    pub async fn burn_subtitles(
        &self,
        input: &Path,
        subtitles: &Path,
        output_path: &Path,
        target: Option<(u32, u32)>,
        settings: &RenderSettings,
    ) -> FFmpegResult<()> {
        if !input.exists() {
            return Err(FFmpegError::InvalidInput(format!(
                "File not found: {}",
                input.display()
            )));
        }
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(FFmpegError::OutputError(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        let mut cmd = Command::new(&self.info.ffmpeg_path);
        configure_tokio_command(&mut cmd);
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-vf", &subtitle_filter(subtitles, target)])
            .args(["-c:v", &settings.video_codec])
            .args(["-preset", &settings.preset])
            .args(["-crf", &settings.crf.to_string()])
            .args(["-c:a", "copy"])
            .args(["-movflags", "+faststart"])
            .arg(output_path);

        tracing::debug!(
            input = %input.display(),
            output = %output_path.display(),
            ?target,
            "Burning subtitles"
        );

        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty());
            return Err(FFmpegError::ExecutionFailed(
                last_line.unwrap_or("ffmpeg exited with an error").trim().to_string(),
            ));
        }

        Ok(())
    }
}

/// Builds the `-vf` chain: optional letterboxed scale, then the `ass` filter.
fn subtitle_filter(subtitles: &Path, target: Option<(u32, u32)>) -> String {
    let ass = format!("ass={}", quote_filter_arg(&escape_filter_path(subtitles)));
    match target {
        Some((w, h)) => format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,{ass}"
        ),
        None => ass,
    }
}

/// Escapes a path for the filter option parser.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Quotes an option value for the filtergraph parser.
///
/// Nothing is special inside single quotes, so each `'` closes the quote,
/// is emitted as an escaped quote and reopens it. The backslash the option
/// parser needs in front of that quote is escaped too.
fn quote_filter_arg(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'\'') => {
                chars.next();
                quoted.push_str("'\\\\\\''");
            }
            '\'' => quoted.push_str("'\\''"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_probe_size(json_str: &str) -> FFmpegResult<Size> {
    let probe: ProbeOutput = serde_json::from_str(json_str)
        .map_err(|e| FFmpegError::ParseError(format!("Failed to parse ffprobe output: {}", e)))?;

    probe
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(Size::new(w as f64, h as f64)),
            _ => None,
        })
        .ok_or_else(|| FFmpegError::ProbeError("No video stream found".to_string()))
}

// =============================================================================
// Transcoder
// =============================================================================

/// [`Transcoder`] backed by a local FFmpeg binary
pub struct FfmpegTranscoder {
    runner: FFmpegRunner,
    settings: RenderSettings,
    work_dir: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            runner: FFmpegRunner::new(info),
            settings: RenderSettings::default(),
            work_dir: std::env::temp_dir().join("captionkit"),
        }
    }

    /// Detects FFmpeg on this machine
    pub fn detect() -> CoreResult<Self> {
        detect_ffmpeg()
            .map(Self::new)
            .map_err(|e| CoreError::TranscoderUnavailable(e.to_string()))
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Directory for intermediate subtitle and video files
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn runner(&self) -> &FFmpegRunner {
        &self.runner
    }

    async fn run(&self, request: &ExportRequest, job_dir: &Path) -> FFmpegResult<Bytes> {
        let input = request
            .source
            .path
            .as_deref()
            .ok_or_else(|| FFmpegError::InvalidInput("No source video file".to_string()))?;

        tokio::fs::create_dir_all(job_dir).await?;
        let subtitles = job_dir.join("subtitles.ass");
        let output_path = job_dir.join("output.mp4");
        tokio::fs::write(&subtitles, request.document.as_bytes()).await?;

        self.runner
            .burn_subtitles(input, &subtitles, &output_path, request.target, &self.settings)
            .await?;

        let data = tokio::fs::read(&output_path).await.map_err(|e| {
            FFmpegError::OutputError(format!("Failed to read rendered video: {}", e))
        })?;
        Ok(Bytes::from(data))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(&self, request: &ExportRequest) -> CoreResult<Bytes> {
        let job_dir = self.work_dir.join(request.id.to_string());
        let result = self.run(request, &job_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&job_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(dir = %job_dir.display(), "Failed to clean export work dir: {}", e);
            }
        }

        result.map_err(|e| CoreError::ExportFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_settings_default() {
        let settings = RenderSettings::default();
        assert_eq!(settings.video_codec, "libx264");
        assert_eq!(settings.preset, "medium");
        assert_eq!(settings.crf, 20);
    }

    #[test]
    fn test_subtitle_filter() {
        let path = Path::new("/tmp/job/subtitles.ass");
        assert_eq!(subtitle_filter(path, None), "ass='/tmp/job/subtitles.ass'");
        assert_eq!(
            subtitle_filter(path, Some((1920, 1080))),
            "scale=1920:1080:force_original_aspect_ratio=decrease,\
             pad=1920:1080:(ow-iw)/2:(oh-ih)/2,ass='/tmp/job/subtitles.ass'"
        );
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new(r"C:\Users\me\it's.ass")),
            r"C\:/Users/me/it\'s.ass"
        );
    }

    /// Mirrors FFmpeg's `av_get_token`: quoted runs are literal, outside them
    /// a backslash escapes the next character.
    fn unquote_level(input: &str) -> String {
        let mut out = String::new();
        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => out.extend(chars.by_ref().take_while(|&q| q != '\'')),
                '\\' => out.extend(chars.next()),
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn test_subtitle_filter_quotes_apostrophes() {
        let filter = subtitle_filter(Path::new(r"C:\Users\me\it's.ass"), None);
        assert_eq!(filter, r"ass='C\:/Users/me/it'\\\''s.ass'");

        let graph_value = unquote_level(filter.trim_start_matches("ass="));
        assert_eq!(graph_value, r"C\:/Users/me/it\'s.ass");
        assert_eq!(unquote_level(&graph_value), "C:/Users/me/it's.ass");
    }

    #[test]
    fn test_subtitle_filter_plain_path_round_trips() {
        let filter = subtitle_filter(Path::new("/tmp/job/subs.ass"), Some((1080, 1920)));
        assert!(filter.ends_with(",ass='/tmp/job/subs.ass'"));
        let value = filter.rsplit_once("ass=").map(|(_, v)| v).unwrap();
        assert_eq!(unquote_level(&unquote_level(value)), "/tmp/job/subs.ass");
    }

    #[test]
    fn test_parse_probe_size() {
        let json = r#"{"programs": [], "streams": [{"width": 1080, "height": 1920}]}"#;
        assert_eq!(parse_probe_size(json).unwrap(), Size::new(1080.0, 1920.0));

        let err = parse_probe_size(r#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, FFmpegError::ProbeError(_)));

        assert!(matches!(
            parse_probe_size("not json").unwrap_err(),
            FFmpegError::ParseError(_)
        ));
    }

    fn fake_info() -> FFmpegInfo {
        FFmpegInfo {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe_path: None,
            version: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_burn_rejects_missing_input() {
        let runner = FFmpegRunner::new(fake_info());
        let err = runner
            .burn_subtitles(
                Path::new("/nonexistent/in.mp4"),
                Path::new("/nonexistent/sub.ass"),
                Path::new("/nonexistent/out.mp4"),
                None,
                &RenderSettings::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FFmpegError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_transcode_without_source_fails_and_cleans_up() {
        use crate::core::captions::WordCue;
        use crate::core::render::{ExportCoordinator, ExportOptions, SourceVideo};
        use crate::core::style::StyleConfig;

        let work = tempfile::tempdir().unwrap();
        let transcoder =
            Arc::new(FfmpegTranscoder::new(fake_info()).with_work_dir(work.path()));
        let mut coordinator = ExportCoordinator::new(transcoder, ExportOptions::default());
        coordinator.set_source(SourceVideo::default());

        let err = coordinator
            .request_export(
                &[WordCue::new(0.0, 1.0, "Hi")],
                &StyleConfig::default(),
                Default::default(),
            )
            .await
            .unwrap_err();

        match err {
            CoreError::ExportFailed(message) => assert!(message.contains("No source video file")),
            other => panic!("Unexpected error: {}", other),
        }
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }
}
