//! Proportional allocation of wall-clock time to dialogue lines.
//!
//! Lines are flattened across scenes in order and weighted by character
//! count, so longer lines hold the screen longer. The last interval is forced
//! to end at the exact declared duration; that boundary is the single
//! authoritative patch point for floating-point drift.

use crate::foundation::error::{LecternError, LecternResult};
use crate::script::{Script, Speaker};

/// Text used when a script contains no dialogue at all.
pub const PLACEHOLDER_TEXT: &str = "No dialog provided.";

/// One dialogue line with its resolved time window `[start, end)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    /// Index of the owning scene in the script.
    pub scene: usize,
    /// Speaking role.
    pub speaker: Speaker,
    /// Spoken/displayed text.
    pub text: String,
    /// Window start in seconds, non-decreasing across the sequence.
    pub start: f64,
    /// Window end in seconds; equals the next utterance's start, and the
    /// declared total duration exactly for the last utterance.
    pub end: f64,
}

/// Allocate `total_duration` seconds across all dialogue lines of `script`.
///
/// Each line gets a share proportional to `max(1, char_count)`. An empty
/// script degrades to a single placeholder utterance spanning the full
/// duration; this is not an error. A non-positive or non-finite duration is.
pub fn allocate(script: &Script, total_duration: f64) -> LecternResult<Vec<Utterance>> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(LecternError::validation(format!(
            "total_duration must be finite and > 0, got {total_duration}"
        )));
    }

    let mut flat: Vec<(usize, Speaker, &str)> = Vec::new();
    for (si, scene) in script.scenes.iter().enumerate() {
        for line in &scene.dialogue {
            flat.push((si, line.speaker, line.text.as_str()));
        }
    }

    if flat.is_empty() {
        return Ok(vec![Utterance {
            scene: 0,
            speaker: Speaker::Teacher,
            text: PLACEHOLDER_TEXT.to_string(),
            start: 0.0,
            end: total_duration,
        }]);
    }

    let weights: Vec<f64> = flat
        .iter()
        .map(|(_, _, text)| text.chars().count().max(1) as f64)
        .collect();
    let total_weight: f64 = weights.iter().sum();

    let mut out = Vec::with_capacity(flat.len());
    let mut t = 0.0f64;
    for ((si, speaker, text), w) in flat.into_iter().zip(weights) {
        let dur = total_duration * (w / total_weight);
        out.push(Utterance {
            scene: si,
            speaker,
            text: text.to_string(),
            start: t,
            end: t + dur,
        });
        t += dur;
    }

    // Absorb accumulated rounding drift at the final boundary.
    if let Some(last) = out.last_mut() {
        last.end = total_duration;
    }

    Ok(out)
}

/// Index of the utterance active at time `t`: the last whose `start <= t`,
/// clamped to the final utterance for any later `t`.
///
/// `utterances` must be non-empty and ordered by `start` (as produced by
/// [`allocate`]).
pub fn active_index(utterances: &[Utterance], t: f64) -> usize {
    debug_assert!(!utterances.is_empty());
    let after = utterances.partition_point(|u| u.start <= t);
    after.saturating_sub(1)
}
