//! Cue Timeline
//!
//! Resolves the active cue for a playback time and derives the karaoke-style
//! highlight of each word. Everything here is a pure function of its inputs:
//! no highlight state survives between frames.

use serde::{Deserialize, Serialize};

use crate::core::captions::{group_lines, SubtitleLine, WordCue};
use crate::core::color::{hex_to_rgba, ColorRole};
use crate::core::style::StyleConfig;
use crate::core::TimeSec;

// =============================================================================
// Active Cue
// =============================================================================

/// Index of the cue spanning `t` (`start <= t < end`).
///
/// Cues may be unsorted or overlapping. The scan runs left to right and the
/// first match wins, so sorted overlapping cues resolve to the earliest start.
pub fn active_index(cues: &[WordCue], t: TimeSec) -> Option<usize> {
    if !t.is_finite() {
        return None;
    }
    cues.iter().position(|cue| cue.contains(t))
}

// =============================================================================
// Word Visuals
// =============================================================================

/// Rendered state of one word
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordVisual {
    pub is_active: bool,
    /// Fill color as `#RRGGBB`
    pub fill_color: String,
    /// Fill color with the style opacity applied, as `rgba(...)`
    pub fill_rgba: String,
    /// Uniform magnification (1.0 = none)
    pub scale: f64,
    /// Box painted behind the glyphs, active word only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Glyph edge blur radius
    pub blur: f64,
    /// Drop shadow blur radius
    pub shadow_blur: f64,
}

/// Derives the visual state of `word_index` given the active cue.
///
/// The active word swaps in `secondary_color`, is magnified by
/// `active_scale / 100` (falling back to `default_active_scale`) and gets
/// `active_bg_color` behind it. Other words keep the base style. Both carry
/// the style's effective blur radii.
pub fn word_visual(
    style: &StyleConfig,
    active: Option<usize>,
    word_index: usize,
    default_active_scale: f64,
) -> WordVisual {
    let is_active = active == Some(word_index);
    let blur = style.effective_blur();
    let shadow_blur = style.effective_shadow_blur();

    if !is_active {
        return WordVisual {
            is_active,
            fill_color: style.primary_color.clone(),
            fill_rgba: hex_to_rgba(&style.primary_color, style.opacity, ColorRole::Primary),
            scale: 1.0,
            background_color: None,
            blur,
            shadow_blur,
        };
    }

    WordVisual {
        is_active,
        fill_color: style.secondary_color.clone(),
        fill_rgba: hex_to_rgba(&style.secondary_color, style.opacity, ColorRole::Secondary),
        scale: style.effective_active_scale(default_active_scale) / 100.0,
        background_color: style.active_bg_color.clone(),
        blur,
        shadow_blur,
    }
}

// =============================================================================
// Line View
// =============================================================================

/// One word of the line on screen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordView {
    pub cue_index: usize,
    pub text: String,
    pub visual: WordVisual,
}

/// The line on screen at a given time, with per-word visuals
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub line: SubtitleLine,
    pub active_index: Option<usize>,
    pub words: Vec<WordView>,
}

/// Returns the line displayed at `t`, or `None` in a gap.
///
/// The line holding the active cue wins; otherwise the first line whose span
/// covers `t` (a pause between two words of the same line).
pub fn line_view(
    cues: &[WordCue],
    t: TimeSec,
    words_per_line: usize,
    style: &StyleConfig,
    default_active_scale: f64,
) -> Option<LineView> {
    let active = active_index(cues, t);
    let lines = group_lines(cues, words_per_line);

    let line = match active {
        Some(index) => lines.into_iter().find(|l| l.contains_cue(index)),
        None => lines.into_iter().find(|l| l.start <= t && t < l.end),
    }?;

    let words = (line.first_cue..line.first_cue + line.cue_count)
        .filter_map(|index| {
            cues.get(index).map(|cue| WordView {
                cue_index: index,
                text: cue.text.clone(),
                visual: word_visual(style, active, index, default_active_scale),
            })
        })
        .collect();

    Some(LineView {
        line,
        active_index: active,
        words,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::style::{apply_defaults, StylePatch, DEFAULT_ACTIVE_SCALE};

    fn ab() -> Vec<WordCue> {
        vec![WordCue::new(0.0, 0.8, "A"), WordCue::new(0.8, 1.6, "B")]
    }

    // -------------------------------------------------------------------------
    // Active Index Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_active_index_basic() {
        let cues = ab();
        assert_eq!(active_index(&cues, 0.5), Some(0));
        assert_eq!(active_index(&cues, 0.8), Some(1));
        assert_eq!(active_index(&cues, 5.0), None);
        assert_eq!(active_index(&cues, -0.1), None);
        assert_eq!(active_index(&cues, 1.6), None);
        assert_eq!(active_index(&[], 0.0), None);
    }

    #[test]
    fn test_active_index_gap() {
        let cues = vec![WordCue::new(0.0, 1.0, "a"), WordCue::new(2.0, 3.0, "b")];
        assert_eq!(active_index(&cues, 1.5), None);
        assert_eq!(active_index(&cues, f64::NAN), None);
    }

    #[test]
    fn test_active_index_overlap_first_match_wins() {
        let cues = vec![
            WordCue::new(1.0, 3.0, "late-start"),
            WordCue::new(0.5, 2.0, "early-start"),
            WordCue::new(0.5, 2.5, "early-start-twin"),
        ];
        assert_eq!(active_index(&cues, 1.5), Some(0));
        assert_eq!(active_index(&cues, 0.7), Some(1));
        assert_eq!(active_index(&cues, 2.7), Some(0));

        let sorted = vec![
            WordCue::new(0.5, 2.0, "first"),
            WordCue::new(0.5, 2.5, "twin"),
            WordCue::new(1.0, 3.0, "later"),
        ];
        assert_eq!(active_index(&sorted, 1.5), Some(0));
        assert_eq!(active_index(&sorted, 2.2), Some(1));
    }

    #[test]
    fn test_active_index_unsorted() {
        let cues = vec![WordCue::new(2.0, 3.0, "c"), WordCue::new(0.0, 1.0, "a")];
        assert_eq!(active_index(&cues, 0.2), Some(1));
        assert_eq!(active_index(&cues, 2.2), Some(0));
    }

    // -------------------------------------------------------------------------
    // Highlight Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_word_visual_inactive_uses_base_style() {
        let style = StyleConfig::default().with_secondary_color("#FFD700");
        let visual = word_visual(&style, Some(1), 0, DEFAULT_ACTIVE_SCALE);

        assert!(!visual.is_active);
        assert_eq!(visual.fill_color, "#FFFFFF");
        assert_eq!(visual.fill_rgba, "rgba(255,255,255,1)");
        assert_eq!(visual.scale, 1.0);
        assert_eq!(visual.background_color, None);
    }

    #[test]
    fn test_word_visual_active_substitutes_secondary() {
        let style = apply_defaults(&StylePatch {
            secondary_color: Some("#FFD700".to_string()),
            active_bg_color: Some("#FF3366".to_string()),
            ..Default::default()
        });
        let visual = word_visual(&style, Some(2), 2, DEFAULT_ACTIVE_SCALE);

        assert!(visual.is_active);
        assert_eq!(visual.fill_color, "#FFD700");
        assert!((visual.scale - 1.1).abs() < 1e-9);
        assert_eq!(visual.background_color.as_deref(), Some("#FF3366"));
    }

    #[test]
    fn test_word_visual_style_scale_overrides_default() {
        let style = apply_defaults(&StylePatch {
            active_scale: Some(150.0),
            ..Default::default()
        });
        let visual = word_visual(&style, Some(0), 0, DEFAULT_ACTIVE_SCALE);
        assert!((visual.scale - 1.5).abs() < 1e-9);

        let visual = word_visual(&StyleConfig::default(), Some(0), 0, 100.0);
        assert_eq!(visual.scale, 1.0);

        // The configured default applies when the style sets none
        let visual = word_visual(&StyleConfig::default(), Some(0), 0, 130.0);
        assert!((visual.scale - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_word_visual_carries_effective_blur() {
        let style = apply_defaults(&StylePatch {
            blur: Some(3.0),
            ..Default::default()
        });
        let active = word_visual(&style, Some(0), 0, DEFAULT_ACTIVE_SCALE);
        let inactive = word_visual(&style, Some(0), 1, DEFAULT_ACTIVE_SCALE);

        assert_eq!((active.blur, active.shadow_blur), (3.0, 3.0));
        assert_eq!((inactive.blur, inactive.shadow_blur), (3.0, 3.0));

        let style = apply_defaults(&StylePatch {
            blur: Some(2.0),
            shadow_blur: Some(5.0),
            ..Default::default()
        });
        let visual = word_visual(&style, None, 0, DEFAULT_ACTIVE_SCALE);
        assert_eq!((visual.blur, visual.shadow_blur), (2.0, 5.0));
        assert_eq!(style.shadow, 0.0);
    }

    #[test]
    fn test_word_visual_is_pure() {
        let style = StyleConfig::default();
        let first = word_visual(&style, Some(1), 1, DEFAULT_ACTIVE_SCALE);
        let _ = word_visual(&style, Some(3), 1, DEFAULT_ACTIVE_SCALE);
        assert_eq!(first, word_visual(&style, Some(1), 1, DEFAULT_ACTIVE_SCALE));
    }

    // -------------------------------------------------------------------------
    // Line View Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_line_view_highlights_active_word() {
        let cues = vec![
            WordCue::new(0.0, 0.5, "one"),
            WordCue::new(0.5, 1.0, "two"),
            WordCue::new(1.0, 1.5, "three"),
            WordCue::new(1.5, 2.0, "four"),
        ];
        let style = StyleConfig::default();

        let view = line_view(&cues, 0.7, 2, &style, DEFAULT_ACTIVE_SCALE).unwrap();
        assert_eq!(view.line.text, "one two");
        assert_eq!(view.active_index, Some(1));
        assert_eq!(view.words.len(), 2);
        assert!(!view.words[0].visual.is_active);
        assert!(view.words[1].visual.is_active);

        let view = line_view(&cues, 1.9, 2, &style, DEFAULT_ACTIVE_SCALE).unwrap();
        assert_eq!(view.line.text, "three four");
        assert_eq!(view.words[1].cue_index, 3);
    }

    #[test]
    fn test_line_view_pause_inside_line() {
        let cues = vec![WordCue::new(0.0, 0.5, "a"), WordCue::new(1.0, 1.5, "b")];
        let view = line_view(&cues, 0.7, 3, &StyleConfig::default(), 110.0).unwrap();
        assert_eq!(view.active_index, None);
        assert!(view.words.iter().all(|w| !w.visual.is_active));
    }

    #[test]
    fn test_line_view_none_outside_lines() {
        let cues = ab();
        assert!(line_view(&cues, 9.0, 3, &StyleConfig::default(), 110.0).is_none());
    }
}
