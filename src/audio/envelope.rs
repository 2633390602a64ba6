//! Per-frame loudness envelope driving mouth animation.
//!
//! The waveform is reduced to one normalized RMS value per output frame. When
//! the narration cannot be decoded the extractor degrades to a deterministic
//! rhythmic envelope so downstream animation still has variation; that path
//! is reported explicitly instead of being swallowed.

use std::path::Path;

use crate::audio::decode::{ANALYSIS_SAMPLE_RATE, decode_audio_f32_mono};

/// How the envelope was obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvelopeSource {
    /// RMS analysis of the actual narration waveform.
    Measured,
    /// Deterministic sine fallback after a decode/analysis failure.
    Synthetic {
        /// Human-readable cause of the fallback.
        reason: String,
    },
}

/// One normalized loudness value in `[0, 1]` per output frame.
#[derive(Clone, Debug)]
pub struct Envelope {
    values: Vec<f32>,
}

impl Envelope {
    /// Extract an envelope with exactly `total_frames` entries from the
    /// narration file, falling back to [`Envelope::synthetic`] on decode
    /// failure. The fallback is logged, never surfaced as an error.
    pub fn from_audio(path: &Path, total_frames: u64) -> (Self, EnvelopeSource) {
        match decode_audio_f32_mono(path, ANALYSIS_SAMPLE_RATE) {
            Ok(samples) => (
                Self::from_mono_samples(&samples, total_frames),
                EnvelopeSource::Measured,
            ),
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(
                    audio = %path.display(),
                    %reason,
                    "envelope extraction failed; using synthetic rhythmic envelope"
                );
                (
                    Self::synthetic(total_frames),
                    EnvelopeSource::Synthetic { reason },
                )
            }
        }
    }

    /// Reduce mono samples to per-frame RMS, normalized so the peak is 1.0.
    ///
    /// Silent input (all zeros, or no samples at all) yields an all-zero
    /// envelope; normalization is skipped to avoid dividing by zero.
    pub fn from_mono_samples(samples: &[f32], total_frames: u64) -> Self {
        let total_frames = total_frames.max(1) as usize;
        let chunk = (samples.len() / total_frames).max(1);

        let mut values = vec![0.0f32; total_frames];
        for (i, v) in values.iter_mut().enumerate() {
            let s = i * chunk;
            let e = ((i + 1) * chunk).min(samples.len());
            if s >= e {
                continue;
            }
            let sum_sq: f64 = samples[s..e].iter().map(|&x| f64::from(x) * f64::from(x)).sum();
            *v = (sum_sq / (e - s) as f64).sqrt() as f32;
        }

        let max = values.iter().cloned().fold(0.0f32, f32::max);
        if max > 0.0 {
            for v in &mut values {
                *v /= max;
            }
        }
        Self { values }
    }

    /// Deterministic rhythmic fallback: three slow pulses across the timeline.
    pub fn synthetic(total_frames: u64) -> Self {
        let total_frames = total_frames.max(1) as usize;
        let values = (0..total_frames)
            .map(|i| {
                let phase = (i as f64) / (total_frames as f64);
                (0.5 + 0.5 * (2.0 * std::f64::consts::PI * phase * 3.0).sin()) as f32
            })
            .collect();
        Self { values }
    }

    /// Number of entries (always the session's `total_frames`).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` when the envelope holds no entries. Never the case for
    /// envelopes built by this module, which hold at least one.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for `frame`, clamped to the final entry for out-of-range frames.
    pub fn value_at(&self, frame: u64) -> f32 {
        let idx = (frame as usize).min(self.values.len().saturating_sub(1));
        self.values[idx]
    }

    /// Borrow all values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_has_exactly_one_entry_per_frame() {
        let samples = vec![0.5f32; 22_050];
        for frames in [1u64, 7, 24, 192, 1000] {
            let env = Envelope::from_mono_samples(&samples, frames);
            assert_eq!(env.len(), frames as usize);
        }
    }

    #[test]
    fn non_silent_audio_normalizes_peak_to_one() {
        let mut samples = vec![0.0f32; 4096];
        for (i, s) in samples.iter_mut().enumerate() {
            *s = 0.3 * ((i as f32) * 0.05).sin();
        }
        let env = Envelope::from_mono_samples(&samples, 16);
        assert!(env.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
        let max = env.values().iter().cloned().fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn silent_audio_yields_all_zeros_without_nan() {
        let env = Envelope::from_mono_samples(&vec![0.0f32; 8192], 24);
        assert_eq!(env.len(), 24);
        assert!(env.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn more_frames_than_samples_leaves_tail_at_zero() {
        let env = Envelope::from_mono_samples(&[1.0, 1.0, 1.0], 10);
        assert_eq!(env.len(), 10);
        assert_eq!(env.value_at(0), 1.0);
        assert_eq!(env.value_at(9), 0.0);
    }

    #[test]
    fn synthetic_envelope_is_deterministic_and_bounded() {
        let a = Envelope::synthetic(192);
        let b = Envelope::synthetic(192);
        assert_eq!(a.values(), b.values());
        assert!(a.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
        // Three pulses means the envelope is not flat.
        let min = a.values().iter().cloned().fold(1.0f32, f32::min);
        let max = a.values().iter().cloned().fold(0.0f32, f32::max);
        assert!(max - min > 0.5);
    }

    #[test]
    fn undecodable_audio_falls_back_to_synthetic() {
        let (env, source) = Envelope::from_audio(Path::new("/nonexistent/audio.wav"), 48);
        assert_eq!(env.len(), 48);
        assert!(matches!(source, EnvelopeSource::Synthetic { .. }));
        assert_eq!(env.values(), Envelope::synthetic(48).values());
    }

    #[test]
    fn value_at_clamps_to_last_frame() {
        let env = Envelope::from_mono_samples(&[0.1, 0.9], 2);
        assert_eq!(env.value_at(5), env.value_at(1));
    }
}
