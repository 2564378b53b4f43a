//! Letterboxed Fit
//!
//! Maps the source video's native resolution onto the on-screen container.

use serde::{Deserialize, Serialize};

use crate::core::Size;

/// Placement of the video and the rasterization surface inside the container
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterboxFit {
    /// `min(container_w / video_w, container_h / video_h)`
    pub scale: f64,
    /// CSS-facing size of both the video element and the render surface
    pub display: Size,
    /// Horizontal margin on each side
    pub offset_x: f64,
    /// Vertical margin on each side
    pub offset_y: f64,
    /// Backing store width of the render surface (`display × dpr`)
    pub backing_width: u32,
    /// Backing store height of the render surface (`display × dpr`)
    pub backing_height: u32,
    pub device_pixel_ratio: f64,
}

/// Computes the letterboxed fit of `video` inside `container`.
///
/// Returns `None` until both rectangles are drawable. A non-positive or
/// non-finite device pixel ratio is read as 1.
pub fn letterbox_fit(video: Size, container: Size, device_pixel_ratio: f64) -> Option<LetterboxFit> {
    if !video.is_drawable() || !container.is_drawable() {
        return None;
    }

    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };

    let scale = (container.width / video.width).min(container.height / video.height);
    let display = Size::new(video.width * scale, video.height * scale);

    Some(LetterboxFit {
        scale,
        display,
        offset_x: (container.width - display.width) / 2.0,
        offset_y: (container.height - display.height) / 2.0,
        backing_width: backing_pixels(display.width, dpr),
        backing_height: backing_pixels(display.height, dpr),
        device_pixel_ratio: dpr,
    })
}

fn backing_pixels(css_pixels: f64, dpr: f64) -> u32 {
    (css_pixels * dpr).round().clamp(1.0, u32::MAX as f64) as u32
}

// =============================================================================
// Preview Sync
// =============================================================================

/// Event that forces a layout recomputation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTrigger {
    ContainerResize,
    VideoMetadata,
    EngineReinit,
    DevicePixelRatio,
}

/// Tracks the inputs of the letterbox computation and recomputes on change.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewSync {
    video: Option<Size>,
    container: Option<Size>,
    device_pixel_ratio: f64,
    current: Option<LetterboxFit>,
}

impl Default for PreviewSync {
    fn default() -> Self {
        Self {
            video: None,
            container: None,
            device_pixel_ratio: 1.0,
            current: None,
        }
    }
}

impl PreviewSync {
    pub fn new(device_pixel_ratio: f64) -> Self {
        Self {
            device_pixel_ratio,
            ..Self::default()
        }
    }

    /// Last computed fit
    pub fn fit(&self) -> Option<LetterboxFit> {
        self.current
    }

    pub fn video_size(&self) -> Option<Size> {
        self.video
    }

    pub fn container_size(&self) -> Option<Size> {
        self.container
    }

    pub fn on_container_resize(&mut self, container: Size) -> Option<LetterboxFit> {
        self.container = Some(container);
        self.recompute(LayoutTrigger::ContainerResize)
    }

    pub fn on_video_metadata(&mut self, video: Size) -> Option<LetterboxFit> {
        self.video = Some(video);
        self.recompute(LayoutTrigger::VideoMetadata)
    }

    pub fn on_engine_reinit(&mut self) -> Option<LetterboxFit> {
        self.recompute(LayoutTrigger::EngineReinit)
    }

    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f64) -> Option<LetterboxFit> {
        self.device_pixel_ratio = device_pixel_ratio;
        self.recompute(LayoutTrigger::DevicePixelRatio)
    }

    fn recompute(&mut self, trigger: LayoutTrigger) -> Option<LetterboxFit> {
        self.current = match (self.video, self.container) {
            (Some(video), Some(container)) => {
                letterbox_fit(video, container, self.device_pixel_ratio)
            }
            _ => None,
        };

        tracing::trace!(?trigger, fit = ?self.current, "Recomputed preview layout");
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_letterbox_wide_video_in_4_3_container() {
        let fit = letterbox_fit(Size::new(1920.0, 1080.0), Size::new(800.0, 600.0), 1.0).unwrap();

        assert!(approx(fit.scale, 800.0 / 1920.0));
        assert!(approx(fit.display.width, 800.0));
        assert!(approx(fit.display.height, 450.0));
        assert!(approx(fit.offset_x, 0.0));
        assert!(approx(fit.offset_y, 75.0));
        assert_eq!((fit.backing_width, fit.backing_height), (800, 450));
    }

    #[test]
    fn test_letterbox_pillarbox_for_portrait_video() {
        let fit = letterbox_fit(Size::new(1080.0, 1920.0), Size::new(800.0, 600.0), 1.0).unwrap();
        assert!(approx(fit.display.height, 600.0));
        assert!(approx(fit.display.width, 337.5));
        assert!(approx(fit.offset_x, 231.25));
        assert!(approx(fit.offset_y, 0.0));
    }

    #[test]
    fn test_backing_size_uses_device_pixel_ratio() {
        let fit = letterbox_fit(Size::new(1920.0, 1080.0), Size::new(800.0, 600.0), 2.0).unwrap();
        assert!(approx(fit.display.width, 800.0));
        assert_eq!((fit.backing_width, fit.backing_height), (1600, 900));

        let fit = letterbox_fit(Size::new(1920.0, 1080.0), Size::new(800.0, 600.0), 0.0).unwrap();
        assert_eq!(fit.device_pixel_ratio, 1.0);
    }

    #[test]
    fn test_degenerate_input() {
        assert!(letterbox_fit(Size::new(0.0, 1080.0), Size::new(800.0, 600.0), 1.0).is_none());
        assert!(letterbox_fit(Size::new(1920.0, 1080.0), Size::new(800.0, 0.0), 1.0).is_none());
        assert!(letterbox_fit(Size::new(f64::NAN, 1.0), Size::new(1.0, 1.0), 1.0).is_none());
    }

    #[test]
    fn test_preview_sync_waits_for_both_inputs() {
        let mut sync = PreviewSync::new(1.0);
        assert!(sync.on_container_resize(Size::new(800.0, 600.0)).is_none());

        let fit = sync.on_video_metadata(Size::new(1920.0, 1080.0)).unwrap();
        assert!(approx(fit.offset_y, 75.0));

        let fit = sync.on_container_resize(Size::new(1920.0, 1080.0)).unwrap();
        assert!(approx(fit.scale, 1.0));
        assert_eq!(sync.fit(), Some(fit));
        assert_eq!(sync.on_engine_reinit(), Some(fit));

        let fit = sync.set_device_pixel_ratio(1.5).unwrap();
        assert_eq!(fit.backing_width, 2880);
    }
}
