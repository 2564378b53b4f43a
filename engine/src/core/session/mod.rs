//! Editing Session
//!
//! Owns the cue list and the active style, rebuilds the ASS document on
//! every edit (debounced), and exposes the caller-facing operations:
//! presets, playback lookup and burned-in export.

mod scheduler;

pub use scheduler::*;

use std::sync::Arc;

use tokio::sync::watch;

use crate::core::captions::{CueEdge, CueList, DocumentBuilder, WordCue};
use crate::core::preview::{FontResolver, PreviewSurface, RasterizerFactory};
use crate::core::render::{
    ExportArtifact, ExportCoordinator, ResolutionTier, SourceVideo, Transcoder,
};
use crate::core::settings::EngineSettings;
use crate::core::style::{Preset, PresetCatalog, StyleConfig, StylePatch};
use crate::core::timeline::{active_index, line_view, LineView};
use crate::core::{CoreResult, TimeSec};

pub struct EditorSession {
    settings: EngineSettings,
    builder: DocumentBuilder,
    cues: CueList,
    style: StyleConfig,
    catalog: Arc<dyn PresetCatalog>,
    exporter: ExportCoordinator,
    scheduler: RebuildScheduler,
}

impl EditorSession {
    /// Creates an empty session; the initial document is published at once.
    pub fn new(
        settings: EngineSettings,
        catalog: Arc<dyn PresetCatalog>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let mut settings = settings;
        settings.normalize();

        let builder = settings.document_builder();
        let cues = CueList::new(Vec::new(), settings.editing.cue_epsilon_sec);
        let style = StyleConfig::default();
        let initial = builder.build(cues.as_slice(), &style, settings.document.words_per_line);

        Self {
            exporter: ExportCoordinator::new(transcoder, settings.export_options()),
            scheduler: RebuildScheduler::new(settings.debounce(), initial),
            builder,
            cues,
            style,
            catalog,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn cues(&self) -> &CueList {
        &self.cues
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    // =========================================================================
    // Document stream
    // =========================================================================

    /// Read-only stream of the generated document
    pub fn subscribe_document(&self) -> watch::Receiver<DocumentRevision> {
        self.scheduler.subscribe()
    }

    /// Last published document text
    pub fn document(&self) -> String {
        self.scheduler.current().text
    }

    /// Rebuilds synchronously, superseding any pending debounced rebuild
    pub fn rebuild_now(&self) -> u64 {
        self.scheduler.rebuild_now(self.build_document())
    }

    /// Feeds the published document and current font to a preview surface.
    ///
    /// Call after each document revision; returns whether the rasterizer was
    /// rebuilt.
    pub async fn sync_preview<F: RasterizerFactory>(
        &self,
        surface: &mut PreviewSurface<F>,
        resolver: &FontResolver,
    ) -> CoreResult<bool> {
        let document = self.document();
        surface.sync(resolver, &self.style, &document).await
    }

    fn build_document(&self) -> String {
        self.builder.build(
            self.cues.as_slice(),
            &self.style,
            self.settings.document.words_per_line,
        )
    }

    fn schedule_rebuild(&self) -> u64 {
        let builder = self.builder.clone();
        let cues = self.cues.as_slice().to_vec();
        let style = self.style.clone();
        let words_per_line = self.settings.document.words_per_line;

        self.scheduler
            .schedule(move || builder.build(&cues, &style, words_per_line))
    }

    // =========================================================================
    // Cues
    // =========================================================================

    /// Replaces the cue list; degenerate cues are corrected on the way in
    pub fn set_cues(&mut self, cues: Vec<WordCue>) {
        self.cues = CueList::new(cues, self.settings.editing.cue_epsilon_sec);
        tracing::debug!(count = self.cues.len(), "Cue list replaced");
        self.schedule_rebuild();
    }

    pub fn insert_cue(&mut self, index: usize, cue: WordCue) {
        self.cues.insert(index, cue);
        self.schedule_rebuild();
    }

    pub fn set_cue_text(&mut self, index: usize, text: &str) -> CoreResult<()> {
        self.cues.set_text(index, text)?;
        self.schedule_rebuild();
        Ok(())
    }

    pub fn set_cue_start(&mut self, index: usize, start: TimeSec) -> CoreResult<Option<CueEdge>> {
        let corrected = self.cues.set_start(index, start)?;
        self.schedule_rebuild();
        Ok(corrected)
    }

    pub fn set_cue_end(&mut self, index: usize, end: TimeSec) -> CoreResult<Option<CueEdge>> {
        let corrected = self.cues.set_end(index, end)?;
        self.schedule_rebuild();
        Ok(corrected)
    }

    pub fn duplicate_cue(&mut self, index: usize) -> CoreResult<usize> {
        let copy = self.cues.duplicate(index)?;
        self.schedule_rebuild();
        Ok(copy)
    }

    pub fn remove_cue(&mut self, index: usize) -> CoreResult<WordCue> {
        let removed = self.cues.remove(index)?;
        self.schedule_rebuild();
        Ok(removed)
    }

    pub fn sort_cues(&mut self) {
        self.cues.sort_by_start();
        self.schedule_rebuild();
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub fn current_active_index(&self, t: TimeSec) -> Option<usize> {
        active_index(self.cues.as_slice(), t)
    }

    /// Line on screen at `t` with per-word highlight visuals
    pub fn current_line(&self, t: TimeSec) -> Option<LineView> {
        line_view(
            self.cues.as_slice(),
            t,
            self.settings.document.words_per_line,
            &self.style,
            self.settings.highlight.default_active_scale,
        )
    }

    // =========================================================================
    // Style & Presets
    // =========================================================================

    pub fn set_style(&mut self, style: StyleConfig) {
        self.style = style.normalized();
        self.schedule_rebuild();
    }

    /// Merges a partial style over the current one
    pub fn update_style(&mut self, patch: &StylePatch) {
        self.style = self.style.apply_patch(patch);
        self.schedule_rebuild();
    }

    pub async fn list_presets(&self) -> CoreResult<Vec<Preset>> {
        self.catalog.list().await
    }

    /// Replaces the style with an owned copy of a catalog preset
    pub async fn apply_preset(&mut self, id: &str) -> CoreResult<&StyleConfig> {
        let preset = self.catalog.get(id).await?;
        tracing::debug!(preset = %id, "Applying preset");
        self.set_style(preset.style);
        Ok(&self.style)
    }

    /// Stores the current style under `id`
    pub async fn save_preset(&self, id: &str, label: Option<String>) -> CoreResult<Preset> {
        let mut style = self.style.clone();
        style.id = id.trim().to_string();
        style.label = label;

        let preset = Preset::new(style);
        self.catalog.save(preset.clone()).await?;
        Ok(preset)
    }

    // =========================================================================
    // Export
    // =========================================================================

    pub fn set_source(&mut self, source: SourceVideo) {
        self.exporter.set_source(source);
    }

    pub fn source(&self) -> &SourceVideo {
        self.exporter.source()
    }

    /// Exports the current cues and style; `None` uses the configured tier.
    ///
    /// The document stream is brought up to date first so inspection shows
    /// exactly what was burned in.
    pub async fn export_current(
        &mut self,
        tier: Option<ResolutionTier>,
    ) -> CoreResult<ExportArtifact> {
        self.rebuild_now();
        let tier = tier.unwrap_or(self.settings.export.default_tier);
        self.exporter
            .request_export(self.cues.as_slice(), &self.style, tier)
            .await
    }

    pub fn last_artifact(&self) -> Option<&ExportArtifact> {
        self.exporter.last_artifact()
    }

    pub fn release_artifact(&mut self) -> Option<ExportArtifact> {
        self.exporter.release_artifact()
    }
}
