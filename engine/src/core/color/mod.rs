//! Color Codec
//!
//! Converts between the three color representations crossing the subtitle
//! pipeline boundary:
//!
//! - `#RRGGBB` hex, used by the style editor (no alpha)
//! - `&HAABBGGRR` packed, the subtitle document's native color field
//!   (byte order alpha, blue, green, red; alpha inverted, `00` = opaque)
//! - `rgba(r,g,b,a)` strings, used only for on-screen approximations
//!
//! Conversions never fail. Empty or malformed input resolves to the
//! default of the [`ColorRole`] being converted.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::core::color::{hex_to_packed, packed_to_hex, ColorRole};
//!
//! assert_eq!(hex_to_packed("#FF8800", ColorRole::Primary), "&H000088FF");
//! assert_eq!(packed_to_hex("&H000088FF", ColorRole::Primary), "#FF8800");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Color Roles
// =============================================================================

/// What a color is used for. Determines the fallback for malformed input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRole {
    /// Main glyph fill
    Primary,
    /// Fill of the emphasized (active) word
    Secondary,
    /// Glyph outline
    Outline,
    /// Drop shadow
    Shadow,
    /// Background box
    Back,
}

impl ColorRole {
    /// Fully opaque default for this role: white for text, black otherwise
    pub fn default_rgb(self) -> Rgb {
        match self {
            ColorRole::Primary | ColorRole::Secondary => Rgb::WHITE,
            ColorRole::Outline | ColorRole::Shadow | ColorRole::Back => Rgb::BLACK,
        }
    }

    /// Default as `#RRGGBB`
    pub fn default_hex(self) -> String {
        self.default_rgb().to_hex()
    }

    /// Default as `&HAABBGGRR`
    pub fn default_packed(self) -> PackedColor {
        PackedColor::opaque(self.default_rgb())
    }
}

// =============================================================================
// RGB
// =============================================================================

/// Opaque RGB color as authored in the style editor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` (the `#` is optional). Returns `None` for anything else.
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        Some(Self {
            r: parse_byte(&digits[0..2])?,
            g: parse_byte(&digits[2..4])?,
            b: parse_byte(&digits[4..6])?,
        })
    }

    /// Formats as uppercase `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// =============================================================================
// Packed (&HAABBGGRR)
// =============================================================================

/// Color in the subtitle document's native encoding.
///
/// `alpha` is stored inverted: `0x00` is fully opaque, `0xFF` fully transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedColor {
    pub alpha: u8,
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

impl PackedColor {
    /// Opaque packed color from an RGB value
    pub fn opaque(rgb: Rgb) -> Self {
        Self {
            alpha: 0,
            blue: rgb.b,
            green: rgb.g,
            red: rgb.r,
        }
    }

    /// RGB channels, discarding alpha
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.red, self.green, self.blue)
    }

    /// Display opacity in `[0, 1]` (`1 - alpha/255`)
    pub fn opacity(&self) -> f64 {
        1.0 - f64::from(self.alpha) / 255.0
    }

    /// `rgba(r,g,b,a)` for on-screen approximation
    pub fn to_rgba_string(&self) -> String {
        format_rgba(self.rgb(), self.opacity())
    }
}

impl fmt::Display for PackedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "&H{:02X}{:02X}{:02X}{:02X}",
            self.alpha, self.blue, self.green, self.red
        )
    }
}

impl From<Rgb> for PackedColor {
    fn from(rgb: Rgb) -> Self {
        Self::opaque(rgb)
    }
}

impl FromStr for PackedColor {
    type Err = String;

    /// Accepts `&HAABBGGRR`, `&HBBGGRR` (alpha assumed `00`) and the bare digit
    /// forms. `&h` prefixes and stray `&` characters are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let without_prefix = trimmed
            .strip_prefix("&H")
            .or_else(|| trimmed.strip_prefix("&h"))
            .unwrap_or(trimmed);
        let digits: String = without_prefix.chars().filter(|c| *c != '&').collect();

        let padded = match digits.len() {
            6 => format!("00{}", digits),
            8 => digits,
            other => return Err(format!("Packed color must have 6 or 8 digits, got {}", other)),
        };

        if !padded.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Packed color has non-hex digits: {}", s));
        }

        let byte = |range: std::ops::Range<usize>| {
            parse_byte(&padded[range]).ok_or_else(|| format!("Invalid packed color: {}", s))
        };

        Ok(Self {
            alpha: byte(0..2)?,
            blue: byte(2..4)?,
            green: byte(4..6)?,
            red: byte(6..8)?,
        })
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// `#RRGGBB` → `&H00BBGGRR`. Alpha is always opaque.
pub fn hex_to_packed(hex: &str, role: ColorRole) -> String {
    let rgb = Rgb::from_hex(hex).unwrap_or_else(|| {
        if !hex.trim().is_empty() {
            debug!(value = hex, ?role, "Malformed hex color, using role default");
        }
        role.default_rgb()
    });
    PackedColor::opaque(rgb).to_string()
}

/// `&HAABBGGRR` → `#RRGGBB`. Alpha is discarded.
pub fn packed_to_hex(packed: &str, role: ColorRole) -> String {
    parse_packed_or_default(packed, role).rgb().to_hex()
}

/// `&HAABBGGRR` → `rgba(r,g,b,a)` with `a = 1 - alpha/255`
pub fn packed_to_rgba(packed: &str, role: ColorRole) -> String {
    parse_packed_or_default(packed, role).to_rgba_string()
}

/// `#RRGGBB` plus a 0–100 opacity → `rgba(r,g,b,a)`
pub fn hex_to_rgba(hex: &str, opacity_percent: f64, role: ColorRole) -> String {
    let rgb = Rgb::from_hex(hex).unwrap_or_else(|| role.default_rgb());
    let opacity = if opacity_percent.is_finite() {
        (opacity_percent / 100.0).clamp(0.0, 1.0)
    } else {
        1.0
    };
    format_rgba(rgb, opacity)
}

/// Normalizes any accepted color input to uppercase `#RRGGBB`.
///
/// `#`-prefixed and bare 6-digit values are read as hex; `&H`-prefixed and
/// bare 8-digit values are read as packed. Anything else yields the role
/// default.
pub fn normalize_color(value: &str, role: ColorRole) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return role.default_hex();
    }

    if let Some(rgb) = Rgb::from_hex(trimmed) {
        return rgb.to_hex();
    }

    match trimmed.parse::<PackedColor>() {
        Ok(packed) => packed.rgb().to_hex(),
        Err(reason) => {
            debug!(value, ?role, %reason, "Unrecognized color, using role default");
            role.default_hex()
        }
    }
}

fn parse_packed_or_default(packed: &str, role: ColorRole) -> PackedColor {
    if packed.trim().is_empty() {
        return role.default_packed();
    }
    packed.parse().unwrap_or_else(|reason: String| {
        debug!(value = packed, ?role, %reason, "Malformed packed color, using role default");
        role.default_packed()
    })
}

fn parse_byte(digits: &str) -> Option<u8> {
    u8::from_str_radix(digits, 16).ok()
}

fn format_rgba(rgb: Rgb, opacity: f64) -> String {
    format!(
        "rgba({},{},{},{})",
        rgb.r,
        rgb.g,
        rgb.b,
        format_opacity(opacity)
    )
}

/// Three decimals at most, without trailing zeros (`1`, `0.5`, `0.498`)
fn format_opacity(opacity: f64) -> String {
    let rounded = (opacity * 1000.0).round() / 1000.0;
    let text = format!("{:.3}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Hex → Packed
    // -------------------------------------------------------------------------

    #[test]
    fn test_hex_to_packed_reverses_byte_order() {
        assert_eq!(hex_to_packed("#FF8800", ColorRole::Primary), "&H000088FF");
        assert_eq!(hex_to_packed("#123456", ColorRole::Primary), "&H00563412");
        assert_eq!(hex_to_packed("abcdef", ColorRole::Primary), "&H00EFCDAB");
    }

    #[test]
    fn test_hex_to_packed_defaults_by_role() {
        assert_eq!(hex_to_packed("", ColorRole::Primary), "&H00FFFFFF");
        assert_eq!(hex_to_packed("", ColorRole::Secondary), "&H00FFFFFF");
        assert_eq!(hex_to_packed("#12", ColorRole::Outline), "&H00000000");
        assert_eq!(hex_to_packed("red", ColorRole::Shadow), "&H00000000");
        assert_eq!(hex_to_packed("#GGGGGG", ColorRole::Back), "&H00000000");
    }

    // -------------------------------------------------------------------------
    // Packed → Hex
    // -------------------------------------------------------------------------

    #[test]
    fn test_packed_to_hex_accepts_both_lengths() {
        assert_eq!(packed_to_hex("&H000088FF", ColorRole::Primary), "#FF8800");
        assert_eq!(packed_to_hex("&H0088FF", ColorRole::Primary), "#FF8800");
        assert_eq!(packed_to_hex("0088FF", ColorRole::Primary), "#FF8800");
        assert_eq!(packed_to_hex("&h000088ff", ColorRole::Primary), "#FF8800");
        assert_eq!(packed_to_hex("&H000088FF&", ColorRole::Primary), "#FF8800");
    }

    #[test]
    fn test_packed_to_hex_discards_alpha() {
        assert_eq!(packed_to_hex("&H80FFFFFF", ColorRole::Primary), "#FFFFFF");
        assert_eq!(packed_to_hex("&HFF0000FF", ColorRole::Primary), "#FF0000");
    }

    #[test]
    fn test_packed_to_hex_malformed_length_uses_default() {
        assert_eq!(packed_to_hex("&H0FFFFFF", ColorRole::Outline), "#000000");
        assert_eq!(packed_to_hex("&HFFFFFFFFFF", ColorRole::Primary), "#FFFFFF");
        assert_eq!(packed_to_hex("", ColorRole::Back), "#000000");
        assert_eq!(packed_to_hex("&HZZZZZZ", ColorRole::Secondary), "#FFFFFF");
    }

    // -------------------------------------------------------------------------
    // Round Trips
    // -------------------------------------------------------------------------

    #[test]
    fn test_hex_round_trip_is_lossless_for_opaque_colors() {
        for value in ["#000000", "#FFFFFF", "#FF8800", "#0A1B2C", "#7F7F7F", "#00FF01"] {
            let packed = hex_to_packed(value, ColorRole::Primary);
            assert_eq!(packed_to_hex(&packed, ColorRole::Primary), value);
        }
    }

    #[test]
    fn test_packed_round_trip_resets_alpha() {
        let original = "&H80112233";
        let hex = packed_to_hex(original, ColorRole::Primary);
        assert_eq!(hex, "#332211");
        let back = hex_to_packed(&hex, ColorRole::Primary);
        // RGB survives, alpha is forced opaque
        assert_eq!(back, "&H00112233");
        assert_ne!(back, original);

        let opaque = "&H00112233";
        let hex = packed_to_hex(opaque, ColorRole::Primary);
        assert_eq!(hex_to_packed(&hex, ColorRole::Primary), opaque);
    }

    // -------------------------------------------------------------------------
    // RGBA
    // -------------------------------------------------------------------------

    #[test]
    fn test_packed_to_rgba_inverts_alpha() {
        assert_eq!(
            packed_to_rgba("&H00FFFFFF", ColorRole::Primary),
            "rgba(255,255,255,1)"
        );
        assert_eq!(
            packed_to_rgba("&HFF000000", ColorRole::Primary),
            "rgba(0,0,0,0)"
        );
        assert_eq!(
            packed_to_rgba("&H80563412", ColorRole::Primary),
            "rgba(18,52,86,0.498)"
        );
    }

    #[test]
    fn test_hex_to_rgba_uses_opacity_percent() {
        assert_eq!(
            hex_to_rgba("#FF0000", 50.0, ColorRole::Primary),
            "rgba(255,0,0,0.5)"
        );
        assert_eq!(
            hex_to_rgba("nope", 250.0, ColorRole::Back),
            "rgba(0,0,0,1)"
        );
    }

    // -------------------------------------------------------------------------
    // Normalization
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#ff8800", ColorRole::Primary), "#FF8800");
        assert_eq!(normalize_color("ff8800", ColorRole::Primary), "#FF8800");
        assert_eq!(normalize_color("&H000088FF", ColorRole::Primary), "#FF8800");
        assert_eq!(normalize_color("000088FF", ColorRole::Primary), "#FF8800");
        assert_eq!(normalize_color("  ", ColorRole::Outline), "#000000");
        assert_eq!(normalize_color("tomato", ColorRole::Secondary), "#FFFFFF");
    }

    #[test]
    fn test_packed_display() {
        let packed: PackedColor = "&H7F010203".parse().unwrap();
        assert_eq!(packed.alpha, 0x7F);
        assert_eq!(packed.blue, 0x01);
        assert_eq!(packed.green, 0x02);
        assert_eq!(packed.red, 0x03);
        assert_eq!(packed.to_string(), "&H7F010203");
    }
}
