//! CaptionKit Core Type Definitions
//!
//! Defines fundamental types shared by the subtitle pipeline.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Preset catalog key
pub type PresetId = String;

/// Export request identifier (ULID)
pub type ExportId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

// =============================================================================
// Geometry
// =============================================================================

/// Width/height pair in pixels.
///
/// Floating point because on-screen container sizes are fractional CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns true if both sides are finite and strictly positive
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Returns true if the rectangle is taller than it is wide
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

impl std::str::FromStr for Size {
    type Err = String;

    /// Parses `WIDTHxHEIGHT` (e.g. `1920x1080`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Expected WIDTHxHEIGHT: {}", s))?;
        let width: f64 = w
            .trim()
            .parse()
            .map_err(|_| format!("Invalid width: {}", w))?;
        let height: f64 = h
            .trim()
            .parse()
            .map_err(|_| format!("Invalid height: {}", h))?;
        Ok(Self::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_parse() {
        let size: Size = "1920x1080".parse().unwrap();
        assert_eq!(size, Size::new(1920.0, 1080.0));

        let size: Size = " 800 X 600 ".parse().unwrap();
        assert_eq!(size, Size::new(800.0, 600.0));

        assert!("1920".parse::<Size>().is_err());
        assert!("axb".parse::<Size>().is_err());
    }

    #[test]
    fn test_size_drawable() {
        assert!(Size::new(1.0, 1.0).is_drawable());
        assert!(!Size::new(0.0, 1.0).is_drawable());
        assert!(!Size::new(f64::NAN, 1.0).is_drawable());
        assert!(Size::new(1080.0, 1920.0).is_portrait());
    }
}
