/// Convenience result type used across Lectern.
pub type LecternResult<T> = Result<T, LecternError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Anything that would make the output timeline or frame content undefined is
/// fatal and surfaces here; purely cosmetic degradation (envelope fallback,
/// missing font) is recovered locally and logged instead.
#[derive(thiserror::Error, Debug)]
pub enum LecternError {
    /// Invalid user-provided script or render parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or undecodable narration audio input.
    #[error("audio error: {0}")]
    Audio(String),

    /// Encoder or output I/O failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// The render was cancelled by the caller.
    #[error("render cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LecternError {
    /// Build a [`LecternError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LecternError::Audio`] value.
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Build a [`LecternError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_map_to_variants() {
        assert!(matches!(
            LecternError::validation("x"),
            LecternError::Validation(_)
        ));
        assert!(matches!(LecternError::audio("x"), LecternError::Audio(_)));
        assert!(matches!(LecternError::encode("x"), LecternError::Encode(_)));
    }

    #[test]
    fn display_includes_cause() {
        let e = LecternError::audio("could not probe 'narration.wav'");
        assert!(e.to_string().contains("narration.wav"));
    }
}
