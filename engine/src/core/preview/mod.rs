//! Preview Sync Module
//!
//! Keeps the on-screen subtitle preview aligned with the playing video:
//! letterbox geometry, font resolution for the rasterizer and the lifecycle of
//! the single rasterizer instance per surface.

mod fonts;
mod letterbox;
mod surface;

pub use fonts::{
    default_font_files, normalize_font_name, DirectoryFontSource, FontEntry, FontResolver,
    FontResolverOptions, FontSource, ResolutionStage, ResolvedFont, ResolvedFonts,
    DEFAULT_FALLBACK_COUNT, DEFAULT_MIN_FONT_BYTES,
};
#[cfg(feature = "remote-fonts")]
pub use fonts::HttpFontSource;
pub use letterbox::{letterbox_fit, LayoutTrigger, LetterboxFit, PreviewSync};
pub use surface::{
    FontResource, FontResourceRegistry, PreviewSurface, Rasterizer, RasterizerFactory,
    RasterizerInit, SurfaceHandles,
};
