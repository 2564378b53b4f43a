//! Word Cue Data Models
//!
//! Defines timed word cues and the edit operations that keep them valid.
//!
//! # Overview
//!
//! A [`WordCue`] always satisfies `end > start` once it has passed through a
//! [`CueList`]. Edits that would break the invariant keep the edited value and
//! nudge the opposite edge by the list's epsilon.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, TimeSec};

/// Default nudge applied when an edit leaves `end <= start`
pub const DEFAULT_CUE_EPSILON: TimeSec = 0.05;

/// Largest accepted cue time in seconds; later times clamp to it
pub const MAX_CUE_TIME: TimeSec = 1.0e12;

// =============================================================================
// Word Cue
// =============================================================================

/// A single word with a start/end time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordCue {
    /// Start time in seconds
    pub start: TimeSec,
    /// End time in seconds
    pub end: TimeSec,
    /// Word text
    pub text: String,
}

impl WordCue {
    pub fn new(start: TimeSec, end: TimeSec, text: &str) -> Self {
        Self {
            start,
            end,
            text: text.to_string(),
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end - self.start
    }

    /// Half-open containment: `start <= t < end`
    pub fn contains(&self, time_sec: TimeSec) -> bool {
        self.start <= time_sec && time_sec < self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end > self.start
    }
}

// =============================================================================
// Cue Correction
// =============================================================================

/// Cue endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueEdge {
    Start,
    End,
}

impl CueEdge {
    pub fn opposite(self) -> Self {
        match self {
            CueEdge::Start => CueEdge::End,
            CueEdge::End => CueEdge::Start,
        }
    }
}

fn sanitize_time(value: TimeSec) -> TimeSec {
    if value.is_finite() {
        value.clamp(0.0, MAX_CUE_TIME)
    } else {
        0.0
    }
}

/// Smallest time strictly after `base`. Falls back to the next representable
/// value when `epsilon` is lost to rounding at large magnitudes.
fn time_after(base: TimeSec, epsilon: TimeSec) -> TimeSec {
    let nudged = base + epsilon;
    if nudged > base {
        nudged
    } else {
        f64::from_bits(base.to_bits() + 1)
    }
}

/// Largest non-negative time strictly before `base`, or zero for `base == 0`.
fn time_before(base: TimeSec, epsilon: TimeSec) -> TimeSec {
    let nudged = (base - epsilon).max(0.0);
    if nudged < base || base == 0.0 {
        nudged
    } else {
        f64::from_bits(base.to_bits() - 1)
    }
}

/// Restores `end > start` after `edited` changed.
///
/// Returns the edge that was nudged, or `None` if the cue was already valid.
pub fn correct_cue(cue: &mut WordCue, edited: CueEdge, epsilon: TimeSec) -> Option<CueEdge> {
    cue.start = sanitize_time(cue.start);
    cue.end = sanitize_time(cue.end);

    if cue.end > cue.start {
        return None;
    }

    match edited {
        CueEdge::Start => {
            cue.end = time_after(cue.start, epsilon);
            Some(CueEdge::End)
        }
        CueEdge::End => {
            cue.start = time_before(cue.end, epsilon);
            if cue.end <= cue.start {
                // An end at zero cannot keep its value with a non-negative start.
                cue.end = time_after(cue.start, epsilon);
            }
            Some(CueEdge::Start)
        }
    }
}

// =============================================================================
// Cue List
// =============================================================================

/// Ordered, editable word cues owned by one editing session.
///
/// Cues need not be sorted or contiguous; [`CueList::sort_by_start`] is an
/// explicit operation.
#[derive(Clone, Debug, PartialEq)]
pub struct CueList {
    cues: Vec<WordCue>,
    epsilon: TimeSec,
}

impl Default for CueList {
    fn default() -> Self {
        Self {
            cues: Vec::new(),
            epsilon: DEFAULT_CUE_EPSILON,
        }
    }
}

impl CueList {
    /// Takes ownership of incoming cues, correcting any degenerate ones.
    pub fn new(cues: Vec<WordCue>, epsilon: TimeSec) -> Self {
        let epsilon = if epsilon.is_finite() && epsilon > 0.0 {
            epsilon
        } else {
            DEFAULT_CUE_EPSILON
        };

        let mut list = Self {
            cues: Vec::with_capacity(cues.len()),
            epsilon,
        };
        for cue in cues {
            list.push(cue);
        }
        list
    }

    pub fn epsilon(&self) -> TimeSec {
        self.epsilon
    }

    pub fn as_slice(&self) -> &[WordCue] {
        &self.cues
    }

    pub fn into_vec(self) -> Vec<WordCue> {
        self.cues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordCue> {
        self.cues.iter()
    }

    pub fn get(&self, index: usize) -> Option<&WordCue> {
        self.cues.get(index)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Appends a cue, correcting it from its start edge
    pub fn push(&mut self, mut cue: WordCue) {
        if let Some(edge) = correct_cue(&mut cue, CueEdge::Start, self.epsilon) {
            tracing::debug!(text = %cue.text, ?edge, "Corrected degenerate cue on insert");
        }
        self.cues.push(cue);
    }

    /// Inserts a cue at `index` (clamped to the list length)
    pub fn insert(&mut self, index: usize, mut cue: WordCue) {
        correct_cue(&mut cue, CueEdge::Start, self.epsilon);
        let index = index.min(self.cues.len());
        self.cues.insert(index, cue);
    }

    pub fn set_text(&mut self, index: usize, text: &str) -> CoreResult<()> {
        self.cue_mut(index)?.text = text.to_string();
        Ok(())
    }

    /// Sets the start time; returns the edge nudged to keep `end > start`
    pub fn set_start(&mut self, index: usize, start: TimeSec) -> CoreResult<Option<CueEdge>> {
        let epsilon = self.epsilon;
        let cue = self.cue_mut(index)?;
        cue.start = sanitize_time(start);
        Ok(correct_cue(cue, CueEdge::Start, epsilon))
    }

    /// Sets the end time; returns the edge nudged to keep `end > start`
    pub fn set_end(&mut self, index: usize, end: TimeSec) -> CoreResult<Option<CueEdge>> {
        let epsilon = self.epsilon;
        let cue = self.cue_mut(index)?;
        cue.end = sanitize_time(end);
        Ok(correct_cue(cue, CueEdge::End, epsilon))
    }

    /// Inserts a copy of the cue right after it; returns the copy's index
    pub fn duplicate(&mut self, index: usize) -> CoreResult<usize> {
        let copy = self.cue_ref(index)?.clone();
        self.cues.insert(index + 1, copy);
        Ok(index + 1)
    }

    pub fn remove(&mut self, index: usize) -> CoreResult<WordCue> {
        self.cue_ref(index)?;
        Ok(self.cues.remove(index))
    }

    /// Stable sort by start time
    pub fn sort_by_start(&mut self) {
        self.cues.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn cue_ref(&self, index: usize) -> CoreResult<&WordCue> {
        let len = self.cues.len();
        self.cues.get(index).ok_or_else(|| out_of_range(index, len))
    }

    fn cue_mut(&mut self, index: usize) -> CoreResult<&mut WordCue> {
        let len = self.cues.len();
        self.cues.get_mut(index).ok_or_else(|| out_of_range(index, len))
    }
}

fn out_of_range(index: usize, len: usize) -> CoreError {
    CoreError::ValidationError(format!(
        "Cue index {} out of range (list has {} cues)",
        index, len
    ))
}

impl From<Vec<WordCue>> for CueList {
    fn from(cues: Vec<WordCue>) -> Self {
        Self::new(cues, DEFAULT_CUE_EPSILON)
    }
}

// =============================================================================
// Tests
// =============================================================================
