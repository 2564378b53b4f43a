//! Engine Settings
//!
//! Persistent tuning for the subtitle pipeline with:
//! - Atomic file writes (temp file + rename)
//! - Serde defaults for every field, so partial files load
//! - Normalization that clamps instead of rejecting
//!
//! Storage location: {config_dir}/captionkit/settings.json

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::captions::{
    DocumentBuilder, DEFAULT_CUE_EPSILON, DEFAULT_STYLE_NAME, DEFAULT_WORDS_PER_LINE,
    REFERENCE_HEIGHT, REFERENCE_WIDTH,
};
use crate::core::fs::atomic_write_json_pretty;
use crate::core::preview::{
    default_font_files, FontResolverOptions, DEFAULT_FALLBACK_COUNT, DEFAULT_MIN_FONT_BYTES,
};
use crate::core::render::{ExportOptions, ResolutionTier, DEFAULT_FILENAME_PREFIX};
use crate::core::style::DEFAULT_ACTIVE_SCALE;
use crate::core::CoreResult;

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Application directory under the platform config dir
pub const APP_DIR: &str = "captionkit";

/// Default rebuild debounce
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// `{config_dir}/captionkit/settings.json`, if the platform has a config dir
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub document: DocumentSettings,

    #[serde(default)]
    pub editing: EditingSettings,

    #[serde(default)]
    pub fonts: FontSettings,

    #[serde(default)]
    pub highlight: HighlightSettings,

    #[serde(default)]
    pub export: ExportSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            document: DocumentSettings::default(),
            editing: EditingSettings::default(),
            fonts: FontSettings::default(),
            highlight: HighlightSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Clamps every value into its valid range.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.document.words_per_line = self.document.words_per_line.clamp(1, 32);
        self.document.play_res_x = self.document.play_res_x.clamp(16, 16384);
        self.document.play_res_y = self.document.play_res_y.clamp(16, 16384);
        let style_name: String = self
            .document
            .style_name
            .chars()
            .filter(|c| *c != ',' && !c.is_control())
            .collect();
        self.document.style_name = if style_name.trim().is_empty() {
            default_style_name()
        } else {
            style_name.trim().to_string()
        };

        self.editing.cue_epsilon_sec = clamp_f64(
            self.editing.cue_epsilon_sec,
            0.001,
            1.0,
            DEFAULT_CUE_EPSILON,
        );
        self.editing.debounce_ms = self.editing.debounce_ms.min(5_000);

        self.fonts.min_font_bytes = self.fonts.min_font_bytes.clamp(1, 1 << 20);
        self.fonts.fallback_count = self.fonts.fallback_count.min(32);
        self.fonts.default_fonts.retain(|f| !f.trim().is_empty());
        if self.fonts.default_fonts.is_empty() {
            self.fonts.default_fonts = default_font_files();
        }

        self.highlight.default_active_scale = clamp_f64(
            self.highlight.default_active_scale,
            10.0,
            400.0,
            DEFAULT_ACTIVE_SCALE,
        );

        self.export.filename_prefix = self.export.filename_prefix.trim().to_string();
    }

    /// Loads settings, falling back to defaults on a missing or corrupt file.
    pub fn load(path: &Path) -> EngineSettings {
        if !path.exists() {
            info!("Settings file not found, using defaults");
            return EngineSettings::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file: {}", e))
            .and_then(|content| {
                serde_json::from_str::<EngineSettings>(&content)
                    .map_err(|e| format!("Failed to parse settings file: {}", e))
            });

        match parsed {
            Ok(mut settings) => {
                if settings.version < SETTINGS_VERSION {
                    info!(
                        "Migrating settings from version {} to {}",
                        settings.version, SETTINGS_VERSION
                    );
                }
                settings.normalize();
                settings
            }
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                EngineSettings::default()
            }
        }
    }

    /// Normalizes and writes atomically; returns what was written.
    pub fn save(&self, path: &Path) -> CoreResult<EngineSettings> {
        let mut normalized = self.clone();
        normalized.normalize();
        atomic_write_json_pretty(path, &normalized)?;
        info!("Settings saved to {:?}", path);
        Ok(normalized)
    }

    pub fn document_builder(&self) -> DocumentBuilder {
        DocumentBuilder::new(
            self.document.play_res_x,
            self.document.play_res_y,
            &self.document.style_name,
        )
    }

    pub fn font_resolver_options(&self) -> FontResolverOptions {
        FontResolverOptions {
            min_font_bytes: self.fonts.min_font_bytes,
            fallback_count: self.fonts.fallback_count,
            default_fonts: self.fonts.default_fonts.clone(),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            filename_prefix: self.export.filename_prefix.clone(),
            words_per_line: self.document.words_per_line,
            builder: self.document_builder(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.editing.debounce_ms)
    }
}

fn clamp_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

/// Document generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    /// Cues merged into one displayed line
    #[serde(default = "default_words_per_line")]
    pub words_per_line: usize,

    /// Reference canvas width
    #[serde(default = "default_play_res_x")]
    pub play_res_x: u32,

    /// Reference canvas height
    #[serde(default = "default_play_res_y")]
    pub play_res_y: u32,

    #[serde(default = "default_style_name")]
    pub style_name: String,
}

fn default_words_per_line() -> usize {
    DEFAULT_WORDS_PER_LINE
}

fn default_play_res_x() -> u32 {
    REFERENCE_WIDTH
}

fn default_play_res_y() -> u32 {
    REFERENCE_HEIGHT
}

fn default_style_name() -> String {
    DEFAULT_STYLE_NAME.to_string()
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            words_per_line: default_words_per_line(),
            play_res_x: default_play_res_x(),
            play_res_y: default_play_res_y(),
            style_name: default_style_name(),
        }
    }
}

/// Interactive editing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditingSettings {
    /// Nudge applied when an edit leaves `end <= start`
    #[serde(default = "default_cue_epsilon")]
    pub cue_epsilon_sec: f64,

    /// Delay before a document rebuild
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_cue_epsilon() -> f64 {
    DEFAULT_CUE_EPSILON
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            cue_epsilon_sec: default_cue_epsilon(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Font resolution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FontSettings {
    /// Responses shorter than this are not fonts
    #[serde(default = "default_min_font_bytes")]
    pub min_font_bytes: usize,

    /// Catalog entries used as the fallback set
    #[serde(default = "default_fallback_count")]
    pub fallback_count: usize,

    /// Files tried when everything else fails
    #[serde(default = "default_font_files")]
    pub default_fonts: Vec<String>,
}

fn default_min_font_bytes() -> usize {
    DEFAULT_MIN_FONT_BYTES
}

fn default_fallback_count() -> usize {
    DEFAULT_FALLBACK_COUNT
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            min_font_bytes: default_min_font_bytes(),
            fallback_count: default_fallback_count(),
            default_fonts: default_font_files(),
        }
    }
}

/// Active word highlight settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HighlightSettings {
    /// Magnification in percent when a style sets no `active_scale`
    #[serde(default = "default_active_scale")]
    pub default_active_scale: f64,
}

fn default_active_scale() -> f64 {
    DEFAULT_ACTIVE_SCALE
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            default_active_scale: default_active_scale(),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub default_tier: ResolutionTier,

    /// First part of suggested download names
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

fn default_filename_prefix() -> String {
    DEFAULT_FILENAME_PREFIX.to_string()
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            default_tier: ResolutionTier::default(),
            filename_prefix: default_filename_prefix(),
        }
    }
}
