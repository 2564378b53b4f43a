//! Subtitle Style Data Models
//!
//! Defines the flat style record edited by the user and its partial form.
//!
//! # Overview
//!
//! - [`StyleConfig`] is always complete and normalized: colors are `#RRGGBB`,
//!   numbers are finite and in range, alignment is a valid numpad code.
//! - [`StylePatch`] is the partial shape received from the editor or a preset
//!   file. [`apply_defaults`] and [`StyleConfig::apply_patch`] are the only
//!   places where partial styles are merged.

use serde::{Deserialize, Serialize};

use crate::core::color::{normalize_color, ColorRole, PackedColor, Rgb};
use crate::core::PresetId;

/// Canonical magnification of the active word when a style does not set one
pub const DEFAULT_ACTIVE_SCALE: f64 = 110.0;

/// Font family used when a style names none
pub const DEFAULT_FONT: &str = "Arial";

/// Identity of a freshly authored custom style
pub const CUSTOM_STYLE_ID: &str = "custom";

// =============================================================================
// Alignment
// =============================================================================

/// Horizontal anchor of a subtitle line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

/// Vertical anchor of a subtitle line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAnchor {
    Bottom,
    Middle,
    Top,
}

/// On-screen anchor using the numeric keypad convention.
///
/// ```text
/// 7 8 9    top row
/// 4 5 6    middle row
/// 1 2 3    bottom row
/// ```
///
/// Serialized as its integer code. Out-of-range codes deserialize to
/// [`Alignment::BottomCenter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum Alignment {
    BottomLeft = 1,
    #[default]
    BottomCenter = 2,
    BottomRight = 3,
    MiddleLeft = 4,
    MiddleCenter = 5,
    MiddleRight = 6,
    TopLeft = 7,
    TopCenter = 8,
    TopRight = 9,
}

impl Alignment {
    pub const ALL: [Alignment; 9] = [
        Alignment::BottomLeft,
        Alignment::BottomCenter,
        Alignment::BottomRight,
        Alignment::MiddleLeft,
        Alignment::MiddleCenter,
        Alignment::MiddleRight,
        Alignment::TopLeft,
        Alignment::TopCenter,
        Alignment::TopRight,
    ];

    /// Maps a numpad code to an alignment; anything outside 1..=9 is bottom-center
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Alignment::BottomLeft,
            2 => Alignment::BottomCenter,
            3 => Alignment::BottomRight,
            4 => Alignment::MiddleLeft,
            5 => Alignment::MiddleCenter,
            6 => Alignment::MiddleRight,
            7 => Alignment::TopLeft,
            8 => Alignment::TopCenter,
            9 => Alignment::TopRight,
            _ => Alignment::BottomCenter,
        }
    }

    /// Numpad code (1..=9)
    pub fn code(self) -> u8 {
        self as u8
    }

    /// `(horizontal, vertical)` anchor for visual placement
    pub fn anchor(self) -> (HorizontalAnchor, VerticalAnchor) {
        use HorizontalAnchor::*;
        use VerticalAnchor::*;

        match self {
            Alignment::BottomLeft => (Left, Bottom),
            Alignment::BottomCenter => (Center, Bottom),
            Alignment::BottomRight => (Right, Bottom),
            Alignment::MiddleLeft => (Left, Middle),
            Alignment::MiddleCenter => (Center, Middle),
            Alignment::MiddleRight => (Right, Middle),
            Alignment::TopLeft => (Left, Top),
            Alignment::TopCenter => (Center, Top),
            Alignment::TopRight => (Right, Top),
        }
    }
}

impl From<i64> for Alignment {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<Alignment> for u8 {
    fn from(alignment: Alignment) -> Self {
        alignment.code()
    }
}

/// Clamps any integer to a valid alignment code (invalid → 2)
pub fn normalize_alignment(code: i64) -> u8 {
    Alignment::from_code(code).code()
}

// =============================================================================
// Style Config
// =============================================================================

/// Complete, normalized subtitle style.
///
/// Deserialization goes through [`StylePatch`], so a style loaded from disk or
/// the network is default-filled and normalized like any other edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StylePatch")]
pub struct StyleConfig {
    // Identity
    pub id: PresetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    // Typography
    /// Logical font family name
    pub font: String,
    /// Font size in pixels of the reference canvas
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub letter_spacing: f64,

    // Colors (#RRGGBB)
    pub primary_color: String,
    /// Fill of the emphasized word
    pub secondary_color: String,
    pub outline_color: String,
    pub shadow_color: String,
    pub back_color: String,

    // Paint
    /// Outline width
    pub border: f64,
    /// Shadow offset distance
    pub shadow: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    /// 0-100
    pub opacity: f64,

    // Transform (scale in percent, 100 = identity)
    pub rotation: f64,
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub shear: f64,
    pub scale_x: f64,
    pub scale_y: f64,

    // Layout
    pub alignment: Alignment,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,

    // Highlight behavior
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_bg_color: Option<String>,
    /// Opaque to this crate; consumed by the rasterizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_type: Option<String>,
    /// Opaque to this crate; consumed by the rasterizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_config: Option<serde_json::Value>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            id: CUSTOM_STYLE_ID.to_string(),
            label: None,
            font: DEFAULT_FONT.to_string(),
            font_size: 48.0,
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            letter_spacing: 0.0,
            primary_color: ColorRole::Primary.default_hex(),
            secondary_color: ColorRole::Secondary.default_hex(),
            outline_color: ColorRole::Outline.default_hex(),
            shadow_color: ColorRole::Shadow.default_hex(),
            back_color: ColorRole::Back.default_hex(),
            border: 2.0,
            shadow: 0.0,
            shadow_blur: None,
            blur: None,
            opacity: 100.0,
            rotation: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            shear: 0.0,
            scale_x: 100.0,
            scale_y: 100.0,
            alignment: Alignment::BottomCenter,
            margin_l: 10,
            margin_r: 10,
            margin_v: 50,
            active_scale: None,
            active_bg_color: None,
            effect_type: None,
            effect_config: None,
        }
    }
}

impl StyleConfig {
    /// Creates a style with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a partial style over this one: present fields win, absent fields
    /// keep the current value. The result is normalized.
    pub fn apply_patch(&self, patch: &StylePatch) -> StyleConfig {
        let base = self.clone();
        let merged = StyleConfig {
            id: patch.id.clone().unwrap_or(base.id),
            label: patch.label.clone().or(base.label),
            font: patch.font.clone().unwrap_or(base.font),
            font_size: patch.font_size.unwrap_or(base.font_size),
            bold: patch.bold.unwrap_or(base.bold),
            italic: patch.italic.unwrap_or(base.italic),
            underline: patch.underline.unwrap_or(base.underline),
            strikeout: patch.strikeout.unwrap_or(base.strikeout),
            letter_spacing: patch.letter_spacing.unwrap_or(base.letter_spacing),
            primary_color: patch.primary_color.clone().unwrap_or(base.primary_color),
            secondary_color: patch
                .secondary_color
                .clone()
                .unwrap_or(base.secondary_color),
            outline_color: patch.outline_color.clone().unwrap_or(base.outline_color),
            shadow_color: patch.shadow_color.clone().unwrap_or(base.shadow_color),
            back_color: patch.back_color.clone().unwrap_or(base.back_color),
            border: patch.border.unwrap_or(base.border),
            shadow: patch.shadow.unwrap_or(base.shadow),
            shadow_blur: patch.shadow_blur.or(base.shadow_blur),
            blur: patch.blur.or(base.blur),
            opacity: patch.opacity.unwrap_or(base.opacity),
            rotation: patch.rotation.unwrap_or(base.rotation),
            rotation_x: patch.rotation_x.unwrap_or(base.rotation_x),
            rotation_y: patch.rotation_y.unwrap_or(base.rotation_y),
            shear: patch.shear.unwrap_or(base.shear),
            scale_x: patch.scale_x.unwrap_or(base.scale_x),
            scale_y: patch.scale_y.unwrap_or(base.scale_y),
            alignment: patch
                .alignment
                .map(Alignment::from_code)
                .unwrap_or(base.alignment),
            margin_l: patch.margin_l.unwrap_or(base.margin_l),
            margin_r: patch.margin_r.unwrap_or(base.margin_r),
            margin_v: patch.margin_v.unwrap_or(base.margin_v),
            active_scale: patch.active_scale.or(base.active_scale),
            active_bg_color: patch.active_bg_color.clone().or(base.active_bg_color),
            effect_type: patch.effect_type.clone().or(base.effect_type),
            effect_config: patch.effect_config.clone().or(base.effect_config),
        };
        merged.normalized()
    }

    /// Returns a copy with every field coerced into its valid range.
    ///
    /// Tolerant by design of the editing boundary: bad values are corrected,
    /// never rejected.
    pub fn normalized(mut self) -> Self {
        let defaults = StyleConfig::default();

        if self.id.trim().is_empty() {
            self.id = defaults.id;
        }
        self.label = self.label.filter(|l| !l.trim().is_empty());

        let font = self.font.trim();
        self.font = if font.is_empty() {
            defaults.font
        } else {
            font.to_string()
        };
        self.font_size = finite_or(self.font_size, defaults.font_size).max(1.0);
        self.letter_spacing = finite_or(self.letter_spacing, 0.0);

        self.primary_color = normalize_color(&self.primary_color, ColorRole::Primary);
        self.secondary_color = normalize_color(&self.secondary_color, ColorRole::Secondary);
        self.outline_color = normalize_color(&self.outline_color, ColorRole::Outline);
        self.shadow_color = normalize_color(&self.shadow_color, ColorRole::Shadow);
        self.back_color = normalize_color(&self.back_color, ColorRole::Back);

        self.border = finite_or(self.border, defaults.border).max(0.0);
        self.shadow = finite_or(self.shadow, defaults.shadow).max(0.0);
        self.shadow_blur = self.shadow_blur.filter(|v| v.is_finite()).map(|v| v.max(0.0));
        self.blur = self.blur.filter(|v| v.is_finite()).map(|v| v.max(0.0));
        self.opacity = finite_or(self.opacity, defaults.opacity).clamp(0.0, 100.0);

        self.rotation = finite_or(self.rotation, 0.0);
        self.rotation_x = finite_or(self.rotation_x, 0.0);
        self.rotation_y = finite_or(self.rotation_y, 0.0);
        self.shear = finite_or(self.shear, 0.0);
        self.scale_x = finite_or(self.scale_x, defaults.scale_x).max(0.0);
        self.scale_y = finite_or(self.scale_y, defaults.scale_y).max(0.0);

        self.margin_l = self.margin_l.max(0);
        self.margin_r = self.margin_r.max(0);
        self.margin_v = self.margin_v.max(0);

        self.active_scale = self
            .active_scale
            .filter(|v| v.is_finite() && *v > 0.0);
        // The highlight background has no role default: empty or malformed clears it.
        self.active_bg_color = self
            .active_bg_color
            .filter(|c| Rgb::from_hex(c).is_some() || c.trim().parse::<PackedColor>().is_ok())
            .map(|c| normalize_color(&c, ColorRole::Back));
        self.effect_type = self.effect_type.filter(|t| !t.trim().is_empty());

        self
    }

    /// Blur radius of the drop shadow: `shadow_blur`, then `blur`, then 0
    pub fn effective_shadow_blur(&self) -> f64 {
        self.shadow_blur.or(self.blur).unwrap_or(0.0)
    }

    /// Blur radius of the glyph edges: `blur`, then `shadow_blur`, then 0
    pub fn effective_blur(&self) -> f64 {
        self.blur.or(self.shadow_blur).unwrap_or(0.0)
    }

    /// Active word magnification in percent.
    ///
    /// `default_percent` is the configured default (`highlight.defaultActiveScale`);
    /// a non-positive or non-finite result falls back to 100 (no magnification).
    pub fn effective_active_scale(&self, default_percent: f64) -> f64 {
        let percent = self.active_scale.unwrap_or(default_percent);
        if percent.is_finite() && percent > 0.0 {
            percent
        } else {
            100.0
        }
    }

    /// Sets the font family.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self.normalized()
    }

    /// Sets the font size in pixels.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self.normalized()
    }

    /// Sets the alignment from a numpad code.
    pub fn with_alignment(mut self, code: i64) -> Self {
        self.alignment = Alignment::from_code(code);
        self
    }

    /// Sets the primary (text) color.
    pub fn with_primary_color(mut self, color: impl Into<String>) -> Self {
        self.primary_color = color.into();
        self.normalized()
    }

    /// Sets the secondary (active word) color.
    pub fn with_secondary_color(mut self, color: impl Into<String>) -> Self {
        self.secondary_color = color.into();
        self.normalized()
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

// =============================================================================
// Style Patch
// =============================================================================

/// Partial style: every field optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PresetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikeout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shear: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_l: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_r: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_v: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_config: Option<serde_json::Value>,
}

impl From<StylePatch> for StyleConfig {
    fn from(patch: StylePatch) -> Self {
        apply_defaults(&patch)
    }
}

/// Fills every absent field of a partial style with its default.
pub fn apply_defaults(patch: &StylePatch) -> StyleConfig {
    StyleConfig::default().apply_patch(patch)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Alignment Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_alignment_always_valid() {
        for code in -20..=20 {
            let normalized = normalize_alignment(code);
            assert!((1..=9).contains(&normalized), "code {code} → {normalized}");
        }
        assert_eq!(normalize_alignment(i64::MAX), 2);
        assert_eq!(normalize_alignment(i64::MIN), 2);
    }

    #[test]
    fn test_normalize_alignment_identity_on_valid() {
        for code in 1..=9 {
            assert_eq!(normalize_alignment(code), code as u8);
        }
        assert_eq!(normalize_alignment(0), 2);
        assert_eq!(normalize_alignment(10), 2);
    }

    #[test]
    fn test_alignment_anchor_table() {
        assert_eq!(
            Alignment::BottomLeft.anchor(),
            (HorizontalAnchor::Left, VerticalAnchor::Bottom)
        );
        assert_eq!(
            Alignment::MiddleCenter.anchor(),
            (HorizontalAnchor::Center, VerticalAnchor::Middle)
        );
        assert_eq!(
            Alignment::TopRight.anchor(),
            (HorizontalAnchor::Right, VerticalAnchor::Top)
        );

        // Rows of three share the vertical anchor
        for row in Alignment::ALL.chunks(3) {
            let vertical = row[0].anchor().1;
            assert!(row.iter().all(|a| a.anchor().1 == vertical));
        }
    }

    #[test]
    fn test_alignment_serde_as_integer() {
        assert_eq!(serde_json::to_string(&Alignment::TopCenter).unwrap(), "8");
        assert_eq!(
            serde_json::from_str::<Alignment>("4").unwrap(),
            Alignment::MiddleLeft
        );
        assert_eq!(
            serde_json::from_str::<Alignment>("42").unwrap(),
            Alignment::BottomCenter
        );
    }

    // -------------------------------------------------------------------------
    // Default Filling Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_apply_defaults_empty_patch() {
        let style = apply_defaults(&StylePatch::default());
        assert_eq!(style, StyleConfig::default());
        assert_eq!(style.primary_color, "#FFFFFF");
        assert_eq!(style.secondary_color, "#FFFFFF");
        assert_eq!(style.outline_color, "#000000");
        assert_eq!(style.shadow_color, "#000000");
        assert_eq!(style.back_color, "#000000");
    }

    #[test]
    fn test_apply_defaults_normalizes_colors() {
        let patch = StylePatch {
            primary_color: Some("&H0000FFFF".to_string()),
            secondary_color: Some("#00ff00".to_string()),
            outline_color: Some("garbage".to_string()),
            ..Default::default()
        };
        let style = apply_defaults(&patch);
        assert_eq!(style.primary_color, "#FFFF00");
        assert_eq!(style.secondary_color, "#00FF00");
        assert_eq!(style.outline_color, "#000000");
    }

    #[test]
    fn test_apply_patch_keeps_previous_values() {
        let base = StyleConfig::default()
            .with_font("Montserrat")
            .with_font_size(64.0);
        let patch = StylePatch {
            bold: Some(true),
            alignment: Some(8),
            ..Default::default()
        };

        let merged = base.apply_patch(&patch);
        assert_eq!(merged.font, "Montserrat");
        assert_eq!(merged.font_size, 64.0);
        assert!(merged.bold);
        assert_eq!(merged.alignment, Alignment::TopCenter);
        // The base is untouched
        assert!(!base.bold);
    }

    #[test]
    fn test_apply_patch_invalid_alignment_maps_to_bottom_center() {
        let patch = StylePatch {
            alignment: Some(12),
            ..Default::default()
        };
        assert_eq!(apply_defaults(&patch).alignment, Alignment::BottomCenter);
    }

    #[test]
    fn test_normalized_clamps_numbers() {
        let style = StyleConfig {
            font: "   ".to_string(),
            font_size: f64::NAN,
            opacity: 140.0,
            border: -3.0,
            scale_x: f64::INFINITY,
            margin_v: -5,
            active_scale: Some(-1.0),
            active_bg_color: Some(String::new()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(style.font, DEFAULT_FONT);
        assert_eq!(style.font_size, 48.0);
        assert_eq!(style.opacity, 100.0);
        assert_eq!(style.border, 0.0);
        assert_eq!(style.scale_x, 100.0);
        assert_eq!(style.margin_v, 0);
        assert_eq!(style.active_scale, None);
        assert_eq!(style.active_bg_color, None);
    }

    // -------------------------------------------------------------------------
    // Blur / Active Scale Precedence Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_blur_precedence() {
        let mut style = StyleConfig::default();
        assert_eq!(style.effective_shadow_blur(), 0.0);
        assert_eq!(style.effective_blur(), 0.0);

        style.blur = Some(3.0);
        assert_eq!(style.effective_shadow_blur(), 3.0);
        assert_eq!(style.effective_blur(), 3.0);

        style.shadow_blur = Some(6.0);
        assert_eq!(style.effective_shadow_blur(), 6.0);
        assert_eq!(style.effective_blur(), 3.0);

        // Shadow distance never falls back to a blur value
        assert_eq!(style.shadow, 0.0);
    }

    #[test]
    fn test_active_scale_default() {
        let style = StyleConfig::default();
        assert_eq!(style.effective_active_scale(DEFAULT_ACTIVE_SCALE), DEFAULT_ACTIVE_SCALE);
        assert_eq!(style.effective_active_scale(130.0), 130.0);
        assert_eq!(style.effective_active_scale(f64::NAN), 100.0);

        let style = apply_defaults(&StylePatch {
            active_scale: Some(125.0),
            ..Default::default()
        });
        assert_eq!(style.effective_active_scale(130.0), 125.0);
    }

    // -------------------------------------------------------------------------
    // Serialization Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_partial_json_deserializes_with_defaults() {
        let json = r##"{ "id": "neon", "font": "Bebas Neue", "primary_color": "#00FFEE", "alignment": 0 }"##;
        let style: StyleConfig = serde_json::from_str(json).unwrap();

        assert_eq!(style.id, "neon");
        assert_eq!(style.font, "Bebas Neue");
        assert_eq!(style.primary_color, "#00FFEE");
        assert_eq!(style.outline_color, "#000000");
        assert_eq!(style.alignment, Alignment::BottomCenter);
        assert_eq!(style.scale_x, 100.0);
    }

    #[test]
    fn test_style_serialization_round_trip() {
        let style = StyleConfig::default()
            .with_secondary_color("#FFD700")
            .with_alignment(5);
        let json = serde_json::to_string(&style).unwrap();
        assert!(json.contains("\"alignment\":5"));

        let parsed: StyleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, style);
    }
}
