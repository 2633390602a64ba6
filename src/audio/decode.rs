//! Narration audio probing and PCM decoding through the system `ffprobe` /
//! `ffmpeg` binaries.

use std::path::Path;

use crate::foundation::error::{LecternError, LecternResult};

/// Sample rate used for loudness analysis. Mouth animation only needs a
/// coarse per-frame RMS, so a modest rate keeps decode output small.
pub(crate) const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Probe the narration file's duration in seconds through `ffprobe`.
///
/// Failure here is fatal: without a duration the whole output timeline is
/// undefined.
pub(crate) fn probe_duration_secs(path: &Path) -> LecternResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: ProbeFormat,
    }

    if !path.exists() {
        return Err(LecternError::audio(format!(
            "narration audio '{}' does not exist",
            path.display()
        )));
    }

    let out = std::process::Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| LecternError::audio(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(LecternError::audio(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| LecternError::audio(format!("ffprobe json parse failed: {e}")))?;
    let duration: f64 = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| {
            LecternError::audio(format!(
                "ffprobe reported no duration for '{}'",
                path.display()
            ))
        })?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(LecternError::audio(format!(
            "narration audio '{}' has non-positive duration {duration}",
            path.display()
        )));
    }
    Ok(duration)
}

/// Decode the narration file to mono `f32` PCM at `sample_rate`.
///
/// Callers treat failure as recoverable (the envelope extractor falls back to
/// a synthetic envelope), so this returns the error rather than logging.
pub(crate) fn decode_audio_f32_mono(path: &Path, sample_rate: u32) -> LecternResult<Vec<f32>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| LecternError::audio(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(LecternError::audio(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(LecternError::audio(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(pcm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probing_a_missing_file_is_fatal() {
        let err = probe_duration_secs(Path::new("/nonexistent/narration.wav")).unwrap_err();
        assert!(matches!(err, LecternError::Audio(_)));
        assert!(err.to_string().contains("narration.wav"));
    }
}
