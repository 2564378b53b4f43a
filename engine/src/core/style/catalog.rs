//! Preset Catalog
//!
//! The catalog owns stored presets. Callers always receive clones, so an
//! in-progress edit can never reach the stored copy until `save` is called.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::models::{apply_defaults, StyleConfig, StylePatch};
use crate::core::{CoreError, CoreResult, PresetId};

// =============================================================================
// Preset
// =============================================================================

/// A stored style plus catalog metadata.
///
/// Identity (`id`, `label`) lives on the style itself so a preset file is just
/// a style with a timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(flatten)]
    pub style: StyleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Preset {
    pub fn new(style: StyleConfig) -> Self {
        Self {
            style,
            updated_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.style.id
    }

    /// Display name: the label when present, otherwise the id
    pub fn display_name(&self) -> &str {
        self.style.label.as_deref().unwrap_or(&self.style.id)
    }
}

// =============================================================================
// Catalog Trait
// =============================================================================

/// Preset storage collaborator
#[async_trait]
pub trait PresetCatalog: Send + Sync {
    /// Returns every stored preset
    async fn list(&self) -> CoreResult<Vec<Preset>>;

    /// Inserts or replaces a preset by id
    async fn save(&self, preset: Preset) -> CoreResult<()>;

    /// Returns a copy of a single preset
    async fn get(&self, id: &str) -> CoreResult<Preset> {
        self.list()
            .await?
            .into_iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| CoreError::PresetNotFound(id.to_string()))
    }
}

fn upsert(presets: &mut Vec<Preset>, mut preset: Preset) {
    preset.updated_at = Some(Utc::now());
    match presets.iter_mut().find(|p| p.id() == preset.id()) {
        Some(existing) => *existing = preset,
        None => presets.push(preset),
    }
}

fn validate_for_save(preset: &Preset) -> CoreResult<()> {
    if preset.id().trim().is_empty() {
        return Err(CoreError::ValidationError(
            "Preset id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Built-in Presets
// =============================================================================

/// Presets shipped with the engine
pub fn builtin_presets() -> Vec<Preset> {
    let patch = |id: &str, label: &str| StylePatch {
        id: Some(id.to_string()),
        label: Some(label.to_string()),
        ..Default::default()
    };

    let classic = patch("classic", "Classic");

    let karaoke = StylePatch {
        font: Some("Montserrat".to_string()),
        font_size: Some(64.0),
        bold: Some(true),
        secondary_color: Some("#FFD700".to_string()),
        border: Some(4.0),
        shadow: Some(2.0),
        active_scale: Some(115.0),
        ..patch("karaoke", "Karaoke")
    };

    let boxed = StylePatch {
        font: Some("Inter".to_string()),
        font_size: Some(52.0),
        secondary_color: Some("#00E5FF".to_string()),
        back_color: Some("#101010".to_string()),
        border: Some(0.0),
        active_bg_color: Some("#FF3366".to_string()),
        alignment: Some(2),
        margin_v: Some(80),
        ..patch("boxed", "Boxed Highlight")
    };

    let neon = StylePatch {
        font: Some("Bebas Neue".to_string()),
        font_size: Some(72.0),
        primary_color: Some("#00FFEE".to_string()),
        secondary_color: Some("#FF00FF".to_string()),
        outline_color: Some("#002B36".to_string()),
        border: Some(3.0),
        shadow_blur: Some(8.0),
        alignment: Some(5),
        ..patch("neon", "Neon")
    };

    [classic, karaoke, boxed, neon]
        .iter()
        .map(|p| Preset::new(apply_defaults(p)))
        .collect()
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// Catalog held in memory, used by tests and the CLI
#[derive(Debug, Default)]
pub struct InMemoryPresetCatalog {
    presets: RwLock<Vec<Preset>>,
}

impl InMemoryPresetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_presets(presets: Vec<Preset>) -> Self {
        Self {
            presets: RwLock::new(presets),
        }
    }

    pub fn with_builtins() -> Self {
        Self::with_presets(builtin_presets())
    }
}

#[async_trait]
impl PresetCatalog for InMemoryPresetCatalog {
    async fn list(&self) -> CoreResult<Vec<Preset>> {
        Ok(self.presets.read().await.clone())
    }

    async fn save(&self, preset: Preset) -> CoreResult<()> {
        validate_for_save(&preset)?;
        let mut presets = self.presets.write().await;
        upsert(&mut presets, preset);
        Ok(())
    }
}

// =============================================================================
// JSON File Catalog
// =============================================================================

const CATALOG_FILE_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    presets: Vec<Preset>,
}

/// Catalog persisted as a single JSON file.
///
/// A missing file is an empty catalog. Writes are atomic and serialized
/// through an internal lock.
#[derive(Debug)]
pub struct JsonPresetCatalog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPresetCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> CoreResult<CatalogFile> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CatalogFile {
                    version: CATALOG_FILE_VERSION,
                    presets: Vec::new(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::CatalogError(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl PresetCatalog for JsonPresetCatalog {
    async fn list(&self) -> CoreResult<Vec<Preset>> {
        Ok(self.read_file().await?.presets)
    }

    async fn save(&self, preset: Preset) -> CoreResult<()> {
        validate_for_save(&preset)?;
        let _guard = self.write_lock.lock().await;

        let mut file = self.read_file().await?;
        let id: PresetId = preset.id().to_string();
        upsert(&mut file.presets, preset);
        file.version = CATALOG_FILE_VERSION;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            crate::core::fs::atomic_write_json_pretty(&path, &file)
        })
        .await
        .map_err(|e| CoreError::Internal(format!("Catalog write task failed: {}", e)))??;

        tracing::debug!(preset_id = %id, path = %self.path.display(), "Saved preset");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
