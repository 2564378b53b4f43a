//! Export Coordinator
//!
//! Assembles burned-in export requests for an external transcoder and owns
//! the resulting artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ulid::Ulid;

use crate::core::captions::{DocumentBuilder, WordCue, DEFAULT_WORDS_PER_LINE};
use crate::core::color::{hex_to_packed, ColorRole};
use crate::core::fs::{atomic_write_bytes, sanitize_file_stem};
use crate::core::style::StyleConfig;
use crate::core::{CoreError, CoreResult, ExportId, Size};

// =============================================================================
// Resolution Tier
// =============================================================================

/// Output resolution of a burned-in export
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResolutionTier {
    /// Keep the source resolution
    #[serde(rename = "original")]
    Original,
    /// 1920x1080 (1080x1920 for portrait sources)
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    /// 3840x2160 (2160x3840 for portrait sources)
    #[serde(rename = "4k")]
    Uhd4k,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Hd1080 => "1080p",
            Self::Uhd4k => "4k",
        }
    }

    /// Target `(width, height)`; `None` keeps the source size.
    ///
    /// Fixed tiers follow the source orientation.
    pub fn target_dimensions(&self, source: Option<Size>) -> Option<(u32, u32)> {
        let (long, short) = match self {
            Self::Original => return None,
            Self::Hd1080 => (1920, 1080),
            Self::Uhd4k => (3840, 2160),
        };

        if source.is_some_and(|s| s.is_portrait()) {
            Some((short, long))
        } else {
            Some((long, short))
        }
    }
}

impl std::fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResolutionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" | "source" => Ok(Self::Original),
            "1080p" | "1080" | "hd" | "fhd" => Ok(Self::Hd1080),
            "4k" | "2160p" | "2160" | "uhd" => Ok(Self::Uhd4k),
            other => Err(format!(
                "Unknown resolution tier '{}' (expected original, 1080p or 4k)",
                other
            )),
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// Style colors in the document's packed `&HAABBGGRR` form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedColors {
    pub primary: String,
    pub secondary: String,
    pub outline: String,
    pub shadow: String,
    pub back: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_bg: Option<String>,
}

impl PackedColors {
    pub fn from_style(style: &StyleConfig) -> Self {
        Self {
            primary: hex_to_packed(&style.primary_color, ColorRole::Primary),
            secondary: hex_to_packed(&style.secondary_color, ColorRole::Secondary),
            outline: hex_to_packed(&style.outline_color, ColorRole::Outline),
            shadow: hex_to_packed(&style.shadow_color, ColorRole::Shadow),
            back: hex_to_packed(&style.back_color, ColorRole::Back),
            active_bg: style
                .active_bg_color
                .as_deref()
                .map(|c| hex_to_packed(c, ColorRole::Back)),
        }
    }
}

/// The video being captioned
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceVideo {
    /// Local file, when the transcoder reads from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Native resolution, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Human title used for the download name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SourceVideo {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Title, falling back to the file stem
    pub fn display_stem(&self) -> Option<String> {
        self.title
            .as_deref()
            .and_then(sanitize_file_stem)
            .or_else(|| {
                self.path
                    .as_deref()
                    .and_then(Path::file_stem)
                    .and_then(|s| sanitize_file_stem(&s.to_string_lossy()))
            })
    }
}

/// Everything the transcoder receives
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub id: ExportId,
    pub source: SourceVideo,
    pub cues: Vec<WordCue>,
    pub style: StyleConfig,
    pub colors: PackedColors,
    /// Same document the preview renders
    pub document: String,
    pub tier: ResolutionTier,
    /// `None` keeps the source resolution
    pub target: Option<(u32, u32)>,
}

// =============================================================================
// Transcoder Collaborator
// =============================================================================

/// External engine that burns the document into the video.
///
/// Failures are opaque: the coordinator only distinguishes success from
/// failure and never retries.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the transcoder name
    fn name(&self) -> &str;

    /// Produces the complete output video
    async fn transcode(&self, request: &ExportRequest) -> CoreResult<Bytes>;
}

// =============================================================================
// Artifact
// =============================================================================

pub const DEFAULT_FILENAME_PREFIX: &str = "captioned";
const EXPORT_MIME_TYPE: &str = "video/mp4";

/// A complete exported video
#[derive(Clone, Debug, PartialEq)]
pub struct ExportArtifact {
    pub id: ExportId,
    pub data: Bytes,
    /// Suggested download name
    pub filename: String,
    pub mime_type: String,
    pub tier: ResolutionTier,
    pub created_at: DateTime<Utc>,
}

impl ExportArtifact {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Writes the artifact into `dir` under its suggested name.
    pub fn save_to(&self, dir: &Path) -> CoreResult<PathBuf> {
        let path = dir.join(&self.filename);
        atomic_write_bytes(&path, &self.data)?;
        Ok(path)
    }
}

/// `{prefix}_{stem}_{tier}_{YYYYMMDD_HHMMSS}.mp4`; empty parts are skipped.
pub fn export_filename(
    prefix: &str,
    source: &SourceVideo,
    tier: ResolutionTier,
    at: DateTime<Utc>,
) -> String {
    let timestamp = at.format("%Y%m%d_%H%M%S").to_string();
    let parts: Vec<String> = [
        sanitize_file_stem(prefix),
        Some(source.display_stem().unwrap_or_else(|| "video".to_string())),
        Some(tier.as_str().to_string()),
        Some(timestamp),
    ]
    .into_iter()
    .flatten()
    .collect();

    format!("{}.mp4", parts.join("_"))
}

// =============================================================================
// Coordinator
// =============================================================================

/// Export tuning
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    pub filename_prefix: String,
    pub words_per_line: usize,
    pub builder: DocumentBuilder,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            words_per_line: DEFAULT_WORDS_PER_LINE,
            builder: DocumentBuilder::default(),
        }
    }
}

/// Sends export requests and keeps the last artifact until released.
///
/// One export at a time per session is assumed; the caller rejects or queues
/// concurrent requests.
pub struct ExportCoordinator {
    transcoder: Arc<dyn Transcoder>,
    options: ExportOptions,
    source: SourceVideo,
    last_artifact: Option<ExportArtifact>,
}

impl ExportCoordinator {
    pub fn new(transcoder: Arc<dyn Transcoder>, options: ExportOptions) -> Self {
        Self {
            transcoder,
            options,
            source: SourceVideo::default(),
            last_artifact: None,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn source(&self) -> &SourceVideo {
        &self.source
    }

    pub fn set_source(&mut self, source: SourceVideo) {
        self.source = source;
    }

    /// Builds the request the transcoder would receive
    pub fn prepare_request(
        &self,
        cues: &[WordCue],
        style: &StyleConfig,
        tier: ResolutionTier,
    ) -> ExportRequest {
        ExportRequest {
            id: Ulid::new().to_string(),
            source: self.source.clone(),
            cues: cues.to_vec(),
            style: style.clone(),
            colors: PackedColors::from_style(style),
            document: self
                .options
                .builder
                .build(cues, style, self.options.words_per_line),
            tier,
            target: tier.target_dimensions(self.source.size),
        }
    }

    /// Runs one export.
    ///
    /// Resolves only with a complete artifact; every failure becomes a single
    /// [`CoreError::ExportFailed`] carrying the user-facing message.
    pub async fn request_export(
        &mut self,
        cues: &[WordCue],
        style: &StyleConfig,
        tier: ResolutionTier,
    ) -> CoreResult<ExportArtifact> {
        let request = self.prepare_request(cues, style, tier);
        info!(
            export_id = %request.id,
            transcoder = self.transcoder.name(),
            %tier,
            cues = request.cues.len(),
            "Starting export"
        );

        let data = match self.transcoder.transcode(&request).await {
            Ok(data) => data,
            Err(e) => {
                warn!(export_id = %request.id, error = %e, "Export failed");
                return Err(match e {
                    CoreError::ExportFailed(message) => CoreError::ExportFailed(message),
                    other => CoreError::ExportFailed(other.to_string()),
                });
            }
        };

        if data.is_empty() {
            warn!(export_id = %request.id, "Transcoder returned an empty file");
            return Err(CoreError::ExportFailed(
                "Export produced an empty file".to_string(),
            ));
        }

        let created_at = Utc::now();
        let artifact = ExportArtifact {
            id: request.id,
            filename: export_filename(&self.options.filename_prefix, &self.source, tier, created_at),
            mime_type: EXPORT_MIME_TYPE.to_string(),
            data,
            tier,
            created_at,
        };

        info!(
            export_id = %artifact.id,
            filename = %artifact.filename,
            size_bytes = artifact.size_bytes(),
            "Export completed"
        );

        self.last_artifact = Some(artifact.clone());
        Ok(artifact)
    }

    pub fn last_artifact(&self) -> Option<&ExportArtifact> {
        self.last_artifact.as_ref()
    }

    /// Drops the held artifact, returning it if there was one
    pub fn release_artifact(&mut self) -> Option<ExportArtifact> {
        self.last_artifact.take()
    }
}

// =============================================================================
// Tests
// =============================================================================
