//! Lectern renders a narrated, two-speaker animated lecture video from a
//! dialogue script and a pre-recorded narration audio track.
//!
//! The public API is session-oriented:
//!
//! - Deserialize a [`Script`] (scenes of teacher/student dialogue)
//! - Create a [`RenderSession`] from the script and a narration audio file
//! - Render single frames as pure functions of time, or stream the whole
//!   timeline into a [`FrameSink`] (typically [`FfmpegSink`] for MP4 output)
//!
//! Timeline allocation and loudness-envelope extraction run once at session
//! construction; every frame query afterwards is independent and
//! deterministic, so frames may be computed in parallel as long as they reach
//! the sink in increasing index order.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod audio;
pub(crate) mod layout;
pub(crate) mod typeset;

/// Video encoding sinks.
pub mod encode;
/// Per-frame scene composition.
pub mod render;
/// Input scene/dialogue model.
pub mod script;
/// Session-oriented rendering API.
pub mod session;
/// Dialogue-to-time-interval allocation.
pub mod timeline;

pub use crate::audio::envelope::{Envelope, EnvelopeSource};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{LecternError, LecternResult};

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::render::frame::FrameRgba;
pub use crate::script::{Line, Scene, Script, Speaker};
pub use crate::session::{CancelToken, RenderOpts, RenderSession};
pub use crate::timeline::Utterance;
