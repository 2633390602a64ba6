use crate::foundation::error::{LecternError, LecternResult};

/// Absolute 0-based frame index in timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> LecternResult<Self> {
        if den == 0 {
            return Err(LecternError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(LecternError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Timestamp of frame `idx` in seconds.
    pub fn frame_to_secs(self, idx: FrameIndex) -> f64 {
        (idx.0 as f64) * f64::from(self.den) / f64::from(self.num)
    }

    /// Number of frames needed to cover `secs` of timeline (ceil semantics).
    pub fn cover_secs(self, secs: f64) -> u64 {
        (secs * self.as_f64()).ceil().max(1.0) as u64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 24, den: 1 }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas size.
    pub fn new(width: u32, height: u32) -> LecternResult<Self> {
        if width == 0 || height == 0 {
            return Err(LecternError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_secs_is_ceil_of_duration_times_fps() {
        let fps = Fps::new(24, 1).unwrap();
        assert_eq!(fps.cover_secs(1.0), 24);
        assert_eq!(fps.cover_secs(1.01), 25);
        assert_eq!(fps.cover_secs(8.0), 192);
        // Sub-frame durations still produce at least one frame.
        assert_eq!(fps.cover_secs(0.001), 1);
    }

    #[test]
    fn cover_secs_handles_rational_fps() {
        // 30000/1001 ~ 29.97
        let fps = Fps::new(30000, 1001).unwrap();
        let frames = fps.cover_secs(10.0);
        assert!(frames >= 300 && frames <= 301, "got {frames}");
    }

    #[test]
    fn frame_to_secs_round_trips_whole_seconds() {
        let fps = Fps::new(24, 1).unwrap();
        assert!((fps.frame_to_secs(FrameIndex(24)) - 1.0).abs() < 1e-12);
        assert!((fps.frame_to_secs(FrameIndex(0)) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_fps_and_canvas_are_rejected() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(24, 0).is_err());
        assert!(Canvas::new(0, 720).is_err());
        assert!(Canvas::new(1280, 0).is_err());
    }
}
