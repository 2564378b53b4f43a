//! Preview Surface
//!
//! Owns the single rasterizer instance of one preview surface together with
//! the font resources handed to it.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::fonts::{FontResolver, ResolvedFonts};
use super::letterbox::{LetterboxFit, PreviewSync};
use crate::core::style::StyleConfig;
use crate::core::{CoreError, CoreResult, Size};

// =============================================================================
// Font Resources
// =============================================================================

const RESOURCE_SCHEME: &str = "blob:captionkit/";

/// Probed font bytes behind a same-origin handle the rasterizer can load
#[derive(Clone, Debug, PartialEq)]
pub struct FontResource {
    /// `blob:captionkit/<ulid>`
    pub url: String,
    pub file: String,
    pub bytes: Bytes,
}

/// Issues and revokes [`FontResource`] handles.
///
/// One handle per file: registering the same file twice returns the existing
/// handle instead of wrapping the bytes again.
#[derive(Debug, Default)]
pub struct FontResourceRegistry {
    by_file: HashMap<String, FontResource>,
}

impl FontResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, file: &str, bytes: Bytes) -> FontResource {
        self.by_file
            .entry(file.to_string())
            .or_insert_with(|| FontResource {
                url: format!("{}{}", RESOURCE_SCHEME, Ulid::new()),
                file: file.to_string(),
                bytes,
            })
            .clone()
    }

    /// Registers every resolved font, preserving resolution order.
    pub fn register_all(&mut self, fonts: &ResolvedFonts) -> Vec<FontResource> {
        fonts
            .fonts
            .iter()
            .map(|font| self.register(&font.file, font.bytes.clone()))
            .collect()
    }

    pub fn get(&self, url: &str) -> Option<&FontResource> {
        self.by_file.values().find(|r| r.url == url)
    }

    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }

    /// Revokes every handle; returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let released = self.by_file.len();
        self.by_file.clear();
        released
    }
}

// =============================================================================
// Rasterizer Collaborator
// =============================================================================

/// Opaque handles of the two on-screen surfaces
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceHandles {
    pub video_surface: String,
    pub render_surface: String,
}

/// Everything a rasterizer is constructed with
#[derive(Clone, Debug)]
pub struct RasterizerInit {
    pub surfaces: SurfaceHandles,
    pub document: String,
    pub fonts: Vec<FontResource>,
}

/// Glyph rasterization engine painting the document onto the render surface.
///
/// Reads the playback time from the video surface on its own.
pub trait Rasterizer: Send {
    /// Resizes the backing store of the render surface
    fn resize(&mut self, width: u32, height: u32) -> CoreResult<()>;

    /// Releases every engine resource
    fn destroy(&mut self);
}

/// Builds rasterizer instances
pub trait RasterizerFactory: Send + Sync {
    fn create(&self, init: RasterizerInit) -> CoreResult<Box<dyn Rasterizer>>;
}

// =============================================================================
// Preview Surface
// =============================================================================

/// Singleton owner of one preview's rasterizer.
///
/// Reinitialization always tears the previous instance down (destroying it
/// and revoking its font handles) before a replacement is constructed.
pub struct PreviewSurface<F: RasterizerFactory> {
    factory: F,
    surfaces: SurfaceHandles,
    sync: PreviewSync,
    registry: FontResourceRegistry,
    rasterizer: Option<Box<dyn Rasterizer>>,
    generation: u64,
    /// Document and fonts the current rasterizer was built with
    document: Option<String>,
    fonts: Option<ResolvedFonts>,
}

impl<F: RasterizerFactory> PreviewSurface<F> {
    pub fn new(factory: F, surfaces: SurfaceHandles, device_pixel_ratio: f64) -> Self {
        Self {
            factory,
            surfaces,
            sync: PreviewSync::new(device_pixel_ratio),
            registry: FontResourceRegistry::new(),
            rasterizer: None,
            generation: 0,
            document: None,
            fonts: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// Number of rasterizers constructed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fit(&self) -> Option<LetterboxFit> {
        self.sync.fit()
    }

    pub fn font_resources(&self) -> &FontResourceRegistry {
        &self.registry
    }

    /// Fonts last resolved for this surface
    pub fn resolved_fonts(&self) -> Option<&ResolvedFonts> {
        self.fonts.as_ref()
    }

    /// Brings the rasterizer in line with the latest document and style.
    ///
    /// Fonts are resolved again only when `style.font` changed. Returns
    /// whether the rasterizer was rebuilt; an unchanged document with the
    /// same fonts on an active surface is a no-op.
    pub async fn sync(
        &mut self,
        resolver: &FontResolver,
        style: &StyleConfig,
        document: &str,
    ) -> CoreResult<bool> {
        let font = style.font.trim();
        let (fonts, font_changed) = match self.fonts.take() {
            Some(fonts) if fonts.requested == font => (fonts, false),
            previous => {
                tracing::debug!(
                    from = previous.as_ref().map(|f| f.requested.as_str()),
                    to = font,
                    "Font changed, resolving"
                );
                (resolver.resolve(font).await, true)
            }
        };

        if !font_changed && self.is_active() && self.document.as_deref() == Some(document) {
            self.fonts = Some(fonts);
            return Ok(false);
        }

        let result = self.reinitialize(document, &fonts);
        self.fonts = Some(fonts);
        result.map(|()| true)
    }

    /// Replaces the rasterizer with one rendering `document` using `fonts`.
    pub fn reinitialize(&mut self, document: &str, fonts: &ResolvedFonts) -> CoreResult<()> {
        self.teardown();

        let resources = self.registry.register_all(fonts);
        let init = RasterizerInit {
            surfaces: self.surfaces.clone(),
            document: document.to_string(),
            fonts: resources,
        };

        let rasterizer = match self.factory.create(init) {
            Ok(rasterizer) => rasterizer,
            Err(e) => {
                self.registry.release_all();
                tracing::warn!(error = %e, "Rasterizer construction failed, preview disabled");
                return Err(match e {
                    CoreError::RasterizerFailed(_) => e,
                    other => CoreError::RasterizerFailed(other.to_string()),
                });
            }
        };

        self.rasterizer = Some(rasterizer);
        self.document = Some(document.to_string());
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            fonts = self.registry.len(),
            "Rasterizer initialized"
        );

        let fit = self.sync.on_engine_reinit();
        self.apply_fit(fit)
    }

    pub fn on_container_resize(&mut self, container: Size) -> CoreResult<Option<LetterboxFit>> {
        let fit = self.sync.on_container_resize(container);
        self.apply_fit(fit)?;
        Ok(fit)
    }

    pub fn on_video_metadata(&mut self, video: Size) -> CoreResult<Option<LetterboxFit>> {
        let fit = self.sync.on_video_metadata(video);
        self.apply_fit(fit)?;
        Ok(fit)
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) -> CoreResult<Option<LetterboxFit>> {
        let fit = self.sync.set_device_pixel_ratio(dpr);
        self.apply_fit(fit)?;
        Ok(fit)
    }

    /// Destroys the rasterizer and revokes its font handles.
    pub fn teardown(&mut self) {
        if let Some(mut rasterizer) = self.rasterizer.take() {
            rasterizer.destroy();
        }
        self.document = None;
        let released = self.registry.release_all();
        if released > 0 {
            tracing::debug!(released, "Released font resources");
        }
    }

    fn apply_fit(&mut self, fit: Option<LetterboxFit>) -> CoreResult<()> {
        match (self.rasterizer.as_mut(), fit) {
            (Some(rasterizer), Some(fit)) => {
                rasterizer.resize(fit.backing_width, fit.backing_height)
            }
            _ => Ok(()),
        }
    }
}

impl<F: RasterizerFactory> Drop for PreviewSurface<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
